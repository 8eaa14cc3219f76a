//! Bus transaction commands
//!
//! Read commands print the value and also return it.

use smbridge_core::master::SmbusMaster;
use smbridge_core::smbus::{BlockBuf, Direction, SlaveAddress};

type CmdResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Format bytes as space-separated hex
pub fn format_block(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quick command; succeeds if a device acknowledged its address
pub fn run_quick(bus: &mut dyn SmbusMaster, address: u8, read: bool) -> CmdResult<()> {
    let addr = SlaveAddress::new(address)?;
    let direction = if read {
        Direction::Read
    } else {
        Direction::Write
    };
    bus.quick(addr, direction)?;
    println!("Device at {} acknowledged", addr);
    Ok(())
}

pub fn run_read_byte(bus: &mut dyn SmbusMaster, address: u8) -> CmdResult<u8> {
    let value = bus.read_byte(SlaveAddress::new(address)?)?;
    println!("{:#04x}", value);
    Ok(value)
}

pub fn run_write_byte(bus: &mut dyn SmbusMaster, address: u8, value: u8) -> CmdResult<()> {
    bus.write_byte(SlaveAddress::new(address)?, value)?;
    Ok(())
}

pub fn run_read_byte_data(bus: &mut dyn SmbusMaster, address: u8, command: u8) -> CmdResult<u8> {
    let value = bus.read_byte_data(SlaveAddress::new(address)?, command)?;
    println!("{:#04x}", value);
    Ok(value)
}

pub fn run_write_byte_data(
    bus: &mut dyn SmbusMaster,
    address: u8,
    command: u8,
    value: u8,
) -> CmdResult<()> {
    bus.write_byte_data(SlaveAddress::new(address)?, command, value)?;
    Ok(())
}

pub fn run_read_word(
    bus: &mut dyn SmbusMaster,
    address: u8,
    command: u8,
    swapped: bool,
) -> CmdResult<u16> {
    let addr = SlaveAddress::new(address)?;
    let value = if swapped {
        bus.read_word_swapped(addr, command)?
    } else {
        bus.read_word_data(addr, command)?
    };
    println!("{:#06x}", value);
    Ok(value)
}

pub fn run_write_word(
    bus: &mut dyn SmbusMaster,
    address: u8,
    command: u8,
    value: u16,
    swapped: bool,
) -> CmdResult<()> {
    let addr = SlaveAddress::new(address)?;
    if swapped {
        bus.write_word_swapped(addr, command, value)?;
    } else {
        bus.write_word_data(addr, command, value)?;
    }
    Ok(())
}

pub fn run_read_block(
    bus: &mut dyn SmbusMaster,
    address: u8,
    command: u8,
) -> CmdResult<BlockBuf> {
    let data = bus.read_block_data(SlaveAddress::new(address)?, command)?;
    log::info!("Read {} bytes", data.len());
    println!("{}", format_block(&data));
    Ok(data)
}

pub fn run_write_block(
    bus: &mut dyn SmbusMaster,
    address: u8,
    command: u8,
    data: &[u8],
) -> CmdResult<()> {
    bus.write_block_data(SlaveAddress::new(address)?, command, data)?;
    log::info!("Wrote {} bytes", data.len());
    Ok(())
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use crate::adapters::open_adapter;
    use smbridge_core::Error;

    #[test]
    fn test_format_block() {
        assert_eq!(format_block(&[0x01, 0xab, 0x00]), "01 ab 00");
        assert_eq!(format_block(&[]), "");
    }

    #[test]
    fn test_quick_present_and_absent() {
        let mut adapter = open_adapter("dummy").unwrap();
        assert!(run_quick(adapter.master(), 0x50, false).is_ok());

        let err = run_quick(adapter.master(), 0x51, false).unwrap_err();
        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::DeviceNotFound));
    }

    #[test]
    fn test_byte_data_round_trip() {
        let mut adapter = open_adapter("dummy").unwrap();
        run_write_byte_data(adapter.master(), 0x50, 0x20, 0xa5).unwrap();
        assert_eq!(run_read_byte_data(adapter.master(), 0x50, 0x20).unwrap(), 0xa5);
    }

    #[test]
    fn test_word_swapped() {
        let mut adapter = open_adapter("dummy").unwrap();
        run_write_word(adapter.master(), 0x50, 0x30, 0x1234, false).unwrap();
        assert_eq!(run_read_word(adapter.master(), 0x50, 0x30, false).unwrap(), 0x1234);
        assert_eq!(run_read_word(adapter.master(), 0x50, 0x30, true).unwrap(), 0x3412);
    }

    #[test]
    fn test_block_round_trip() {
        let mut adapter = open_adapter("dummy").unwrap();
        run_write_block(adapter.master(), 0x50, 0x40, &[9, 8, 7]).unwrap();
        let data = run_read_block(adapter.master(), 0x50, 0x40).unwrap();
        assert_eq!(data.as_slice(), &[9, 8, 7]);
    }

    #[test]
    fn test_bad_address() {
        let mut adapter = open_adapter("dummy").unwrap();
        let err = run_read_byte(adapter.master(), 0x80).unwrap_err();
        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::InvalidArgument));
    }
}
