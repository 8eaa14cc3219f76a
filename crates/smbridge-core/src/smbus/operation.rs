//! SMBus operation and payload types

use core::fmt;

use crate::error::{Error, Result};

/// Maximum number of data bytes in an SMBus block transfer
pub const BLOCK_MAX: usize = 32;

/// Block payload storage, bounded at [`BLOCK_MAX`] bytes
pub type BlockBuf = heapless::Vec<u8, BLOCK_MAX>;

/// SMBus transaction shape
///
/// Named after the standard SMBus protocols. Host controllers advertise the
/// subset they implement through [`Functionality`](super::Functionality).
/// Discriminants are stable and may be used to index per-kind tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Quick command: only the R/W bit carries information
    Quick = 0,
    /// Send/receive byte without a command code
    Byte = 1,
    /// Read/write one byte at a command code
    ByteData = 2,
    /// Read/write a 16-bit word at a command code
    WordData = 3,
    /// Write a word and read a word back in one transaction
    ProcessCall = 4,
    /// Length-prefixed block of up to 32 bytes
    BlockData = 5,
    /// Write a block and read a block back in one transaction
    BlockProcessCall = 6,
    /// Raw I2C block without the SMBus length prefix
    I2cBlockData = 7,
}

impl OperationKind {
    /// Number of transaction shapes
    pub const COUNT: usize = 8;

    /// Index of this kind into a `[T; OperationKind::COUNT]` table
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The five transaction shapes implemented by simple host controllers
    pub const BASIC: [OperationKind; 5] = [
        Self::Quick,
        Self::Byte,
        Self::ByteData,
        Self::WordData,
        Self::BlockData,
    ];

    /// Returns true if a command code byte precedes the data phase
    pub const fn has_command(self) -> bool {
        !matches!(self, Self::Quick | Self::Byte)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quick => write!(f, "quick"),
            Self::Byte => write!(f, "byte"),
            Self::ByteData => write!(f, "byte data"),
            Self::WordData => write!(f, "word data"),
            Self::ProcessCall => write!(f, "process call"),
            Self::BlockData => write!(f, "block data"),
            Self::BlockProcessCall => write!(f, "block process call"),
            Self::I2cBlockData => write!(f, "I2C block data"),
        }
    }
}

/// Transfer direction as seen from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Host reads from the device
    Read,
    /// Host writes to the device
    Write,
}

impl Direction {
    /// Value of the R/W bit in the address byte
    pub const fn bit(self) -> u8 {
        match self {
            Self::Read => 1,
            Self::Write => 0,
        }
    }
}

/// 7-bit SMBus slave address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlaveAddress(u8);

impl SlaveAddress {
    /// Highest valid 7-bit address
    pub const MAX: u8 = 0x7f;

    /// Create a slave address, rejecting values that don't fit in 7 bits
    pub const fn new(addr: u8) -> Result<Self> {
        if addr > Self::MAX {
            return Err(Error::InvalidArgument);
        }
        Ok(Self(addr))
    }

    /// The raw 7-bit address
    pub const fn get(self) -> u8 {
        self.0
    }

    /// The on-wire address byte: address shifted left with the R/W bit
    pub const fn wire_byte(self, direction: Direction) -> u8 {
        (self.0 << 1) | direction.bit()
    }
}

impl TryFrom<u8> for SlaveAddress {
    type Error = Error;

    fn try_from(addr: u8) -> Result<Self> {
        Self::new(addr)
    }
}

impl fmt::Display for SlaveAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Data carried by a transaction
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Payload {
    /// No data phase
    #[default]
    None,
    /// A single byte
    Byte(u8),
    /// A 16-bit word (little-endian on the wire)
    Word(u16),
    /// A length-prefixed block
    Block(BlockBuf),
}

impl Payload {
    /// Build a block payload, checking the length is within 1..=32
    pub fn block(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::InvalidArgument);
        }
        let buf = BlockBuf::from_slice(data).map_err(|_| Error::InvalidArgument)?;
        Ok(Self::Block(buf))
    }

    /// The byte value, if this is a byte payload
    pub fn as_byte(&self) -> Option<u8> {
        match self {
            Self::Byte(b) => Some(*b),
            _ => None,
        }
    }

    /// The word value, if this is a word payload
    pub fn as_word(&self) -> Option<u16> {
        match self {
            Self::Word(w) => Some(*w),
            _ => None,
        }
    }

    /// The block contents, if this is a block payload
    pub fn as_block(&self) -> Option<&[u8]> {
        match self {
            Self::Block(b) => Some(b.as_slice()),
            _ => None,
        }
    }
}

/// A single SMBus transaction request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Transaction shape
    pub kind: OperationKind,
    /// Read or write
    pub direction: Direction,
    /// Target device
    pub address: SlaveAddress,
    /// Command code (ignored for Quick and Byte)
    pub command: u8,
    /// Outbound data for writes; `Payload::None` for reads
    pub payload: Payload,
}

impl Operation {
    /// Create an operation from its parts
    pub fn new(
        kind: OperationKind,
        direction: Direction,
        address: SlaveAddress,
        command: u8,
        payload: Payload,
    ) -> Self {
        Self {
            kind,
            direction,
            address,
            command,
            payload,
        }
    }

    /// Quick command
    pub fn quick(address: SlaveAddress, direction: Direction) -> Self {
        Self::new(OperationKind::Quick, direction, address, 0, Payload::None)
    }

    /// Receive byte
    pub fn read_byte(address: SlaveAddress) -> Self {
        Self::new(OperationKind::Byte, Direction::Read, address, 0, Payload::None)
    }

    /// Send byte
    pub fn write_byte(address: SlaveAddress, value: u8) -> Self {
        Self::new(
            OperationKind::Byte,
            Direction::Write,
            address,
            0,
            Payload::Byte(value),
        )
    }

    /// Read byte at a command code
    pub fn read_byte_data(address: SlaveAddress, command: u8) -> Self {
        Self::new(
            OperationKind::ByteData,
            Direction::Read,
            address,
            command,
            Payload::None,
        )
    }

    /// Write byte at a command code
    pub fn write_byte_data(address: SlaveAddress, command: u8, value: u8) -> Self {
        Self::new(
            OperationKind::ByteData,
            Direction::Write,
            address,
            command,
            Payload::Byte(value),
        )
    }

    /// Read word at a command code
    pub fn read_word_data(address: SlaveAddress, command: u8) -> Self {
        Self::new(
            OperationKind::WordData,
            Direction::Read,
            address,
            command,
            Payload::None,
        )
    }

    /// Write word at a command code
    pub fn write_word_data(address: SlaveAddress, command: u8, value: u16) -> Self {
        Self::new(
            OperationKind::WordData,
            Direction::Write,
            address,
            command,
            Payload::Word(value),
        )
    }

    /// Read a length-prefixed block at a command code
    pub fn read_block_data(address: SlaveAddress, command: u8) -> Self {
        Self::new(
            OperationKind::BlockData,
            Direction::Read,
            address,
            command,
            Payload::None,
        )
    }

    /// Write a length-prefixed block at a command code
    pub fn write_block_data(address: SlaveAddress, command: u8, data: &[u8]) -> Result<Self> {
        Ok(Self::new(
            OperationKind::BlockData,
            Direction::Write,
            address,
            command,
            Payload::block(data)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slave_address_range() {
        assert!(SlaveAddress::new(0x00).is_ok());
        assert!(SlaveAddress::new(0x7f).is_ok());
        assert_eq!(SlaveAddress::new(0x80), Err(Error::InvalidArgument));
        assert_eq!(SlaveAddress::try_from(0xff), Err(Error::InvalidArgument));
    }

    #[test]
    fn test_wire_byte() {
        let addr = SlaveAddress::new(0x50).unwrap();
        assert_eq!(addr.wire_byte(Direction::Write), 0xa0);
        assert_eq!(addr.wire_byte(Direction::Read), 0xa1);
    }

    #[test]
    fn test_block_payload_bounds() {
        assert_eq!(Payload::block(&[]), Err(Error::InvalidArgument));
        assert!(Payload::block(&[0u8; 32]).is_ok());
        assert_eq!(Payload::block(&[0u8; 33]), Err(Error::InvalidArgument));

        let payload = Payload::block(&[1, 2, 3]).unwrap();
        assert_eq!(payload.as_block(), Some(&[1u8, 2, 3][..]));
        assert_eq!(payload.as_byte(), None);
    }

    #[test]
    fn test_command_presence() {
        assert!(!OperationKind::Quick.has_command());
        assert!(!OperationKind::Byte.has_command());
        assert!(OperationKind::ByteData.has_command());
        assert!(OperationKind::BlockData.has_command());
    }

    #[test]
    fn test_constructors() {
        let addr = SlaveAddress::new(0x2c).unwrap();
        let op = Operation::write_word_data(addr, 0x10, 0xabcd);
        assert_eq!(op.kind, OperationKind::WordData);
        assert_eq!(op.direction, Direction::Write);
        assert_eq!(op.command, 0x10);
        assert_eq!(op.payload, Payload::Word(0xabcd));

        assert!(Operation::write_block_data(addr, 0, &[0u8; 40]).is_err());
    }
}
