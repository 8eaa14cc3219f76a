//! SMBus master trait
//!
//! [`SmbusMaster`] is implemented by host controller drivers. A driver only
//! has to provide [`SmbusMaster::functionality`] and
//! [`SmbusMaster::execute`]; the typed helpers (`read_byte_data`,
//! `write_word_data`, ...) are built on top of `execute` and mirror the
//! `i2c_smbus_*` helpers familiar from Linux.

use crate::error::{Error, Result};
use crate::smbus::{BlockBuf, Direction, Functionality, Operation, Payload, SlaveAddress};

/// SMBus host controller
///
/// `execute` takes `&mut self`: one controller runs at most one transaction
/// at a time. Callers sharing a controller between threads wrap it in a
/// mutex and hold the lock across the whole call.
pub trait SmbusMaster {
    /// Transaction shapes this controller implements
    fn functionality(&self) -> Functionality;

    /// Run one transaction
    ///
    /// Returns the read payload for successful reads and `None` for writes
    /// and quick commands. A failed transaction yields exactly one error and
    /// no partial data.
    fn execute(&mut self, op: &Operation) -> Result<Option<Payload>>;

    /// Quick command
    fn quick(&mut self, address: SlaveAddress, direction: Direction) -> Result<()> {
        self.execute(&Operation::quick(address, direction))
            .map(|_| ())
    }

    /// Receive byte
    fn read_byte(&mut self, address: SlaveAddress) -> Result<u8> {
        let payload = self.execute(&Operation::read_byte(address))?;
        expect_byte(payload)
    }

    /// Send byte
    fn write_byte(&mut self, address: SlaveAddress, value: u8) -> Result<()> {
        self.execute(&Operation::write_byte(address, value))
            .map(|_| ())
    }

    /// Read byte data
    fn read_byte_data(&mut self, address: SlaveAddress, command: u8) -> Result<u8> {
        let payload = self.execute(&Operation::read_byte_data(address, command))?;
        expect_byte(payload)
    }

    /// Write byte data
    fn write_byte_data(&mut self, address: SlaveAddress, command: u8, value: u8) -> Result<()> {
        self.execute(&Operation::write_byte_data(address, command, value))
            .map(|_| ())
    }

    /// Read word data (little-endian)
    fn read_word_data(&mut self, address: SlaveAddress, command: u8) -> Result<u16> {
        let payload = self.execute(&Operation::read_word_data(address, command))?;
        match payload {
            Some(Payload::Word(word)) => Ok(word),
            _ => Err(Error::ProtocolError),
        }
    }

    /// Write word data (little-endian)
    fn write_word_data(&mut self, address: SlaveAddress, command: u8, value: u16) -> Result<()> {
        self.execute(&Operation::write_word_data(address, command, value))
            .map(|_| ())
    }

    /// Read word data from a device that sends the high byte first
    fn read_word_swapped(&mut self, address: SlaveAddress, command: u8) -> Result<u16> {
        self.read_word_data(address, command).map(u16::swap_bytes)
    }

    /// Write word data to a device that expects the high byte first
    fn write_word_swapped(&mut self, address: SlaveAddress, command: u8, value: u16) -> Result<()> {
        self.write_word_data(address, command, value.swap_bytes())
    }

    /// Read a length-prefixed block
    fn read_block_data(&mut self, address: SlaveAddress, command: u8) -> Result<BlockBuf> {
        let payload = self.execute(&Operation::read_block_data(address, command))?;
        match payload {
            Some(Payload::Block(block)) => Ok(block),
            _ => Err(Error::ProtocolError),
        }
    }

    /// Write a length-prefixed block of 1 to 32 bytes
    fn write_block_data(&mut self, address: SlaveAddress, command: u8, data: &[u8]) -> Result<()> {
        let op = Operation::write_block_data(address, command, data)?;
        self.execute(&op).map(|_| ())
    }
}

fn expect_byte(payload: Option<Payload>) -> Result<u8> {
    match payload {
        Some(Payload::Byte(byte)) => Ok(byte),
        _ => Err(Error::ProtocolError),
    }
}

impl<T: SmbusMaster + ?Sized> SmbusMaster for &mut T {
    fn functionality(&self) -> Functionality {
        (**self).functionality()
    }

    fn execute(&mut self, op: &Operation) -> Result<Option<Payload>> {
        (**self).execute(op)
    }
}

#[cfg(feature = "alloc")]
impl<T: SmbusMaster + ?Sized> SmbusMaster for alloc::boxed::Box<T> {
    fn functionality(&self) -> Functionality {
        (**self).functionality()
    }

    fn execute(&mut self, op: &Operation) -> Result<Option<Payload>> {
        (**self).execute(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smbus::OperationKind;

    /// Master that answers every read with fixed data and remembers the
    /// last request
    struct Fixed {
        last: Option<Operation>,
    }

    impl SmbusMaster for Fixed {
        fn functionality(&self) -> Functionality {
            Functionality::SMBUS_BYTE_DATA | Functionality::SMBUS_WORD_DATA
        }

        fn execute(&mut self, op: &Operation) -> Result<Option<Payload>> {
            self.last = Some(op.clone());
            if op.direction == Direction::Write {
                return Ok(None);
            }
            Ok(match op.kind {
                OperationKind::WordData => Some(Payload::Word(0x1234)),
                OperationKind::BlockData => Some(Payload::block(&[9, 8, 7])?),
                _ => Some(Payload::Byte(0x5a)),
            })
        }
    }

    fn addr() -> SlaveAddress {
        SlaveAddress::new(0x4e).unwrap()
    }

    #[test]
    fn test_typed_reads() {
        let mut bus = Fixed { last: None };
        assert_eq!(bus.read_byte_data(addr(), 3).unwrap(), 0x5a);
        assert_eq!(bus.read_word_data(addr(), 3).unwrap(), 0x1234);
        assert_eq!(bus.read_block_data(addr(), 3).unwrap().as_slice(), &[9, 8, 7]);
    }

    #[test]
    fn test_swapped_word() {
        let mut bus = Fixed { last: None };
        assert_eq!(bus.read_word_swapped(addr(), 0).unwrap(), 0x3412);

        bus.write_word_swapped(addr(), 0x20, 0xabcd).unwrap();
        let op = bus.last.take().unwrap();
        assert_eq!(op.payload, Payload::Word(0xcdab));
        assert_eq!(op.command, 0x20);
    }

    #[test]
    fn test_block_write_validation_happens_before_execute() {
        let mut bus = Fixed { last: None };
        assert_eq!(
            bus.write_block_data(addr(), 0, &[]),
            Err(Error::InvalidArgument)
        );
        assert!(bus.last.is_none());
    }

    #[test]
    fn test_through_mut_ref() {
        fn send<M: SmbusMaster>(mut bus: M) -> Result<()> {
            bus.write_byte(addr(), 0x11)
        }

        let mut bus = Fixed { last: None };
        send(&mut bus).unwrap();
        assert_eq!(bus.last.unwrap().payload, Payload::Byte(0x11));
    }
}
