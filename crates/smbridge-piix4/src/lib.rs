//! smbridge-piix4 - AMD SB800-family SMBus host controller driver
//!
//! This crate drives the PIIX4-compatible SMBus host controller found in
//! ATI SB7x0/SB8x0/SB9x0 southbridges and AMD FCHs (Hudson, KERNCZ).
//!
//! # Overview
//!
//! The register block lives in legacy I/O space. Its base address is not
//! in a PCI BAR but in power-management space behind the index/data pair
//! at 0xCD6/0xCD7, which this driver shares with other SB800 drivers. The
//! [`resolver`] looks the base up once; after that every transaction is a
//! short sequence of port writes, a bounded busy-poll and a few reads.
//!
//! ```text
//! Piix4Controller::create ──> resolver (0xCD6/0xCD7, claimed briefly)
//!          │
//!          ▼
//! SmbusMaster::execute ──> transfer (program registers)
//!                              └──> transaction (start, poll, decode)
//! ```
//!
//! The core of the driver only needs [`PortIo`](smbridge_core::platform::PortIo),
//! [`RegionArbiter`](smbridge_core::platform::RegionArbiter) and
//! [`ReservedRegions`](smbridge_core::platform::ReservedRegions). With the
//! `std` feature (default) the crate also provides the Linux backends for
//! those: `/dev/port`, lock files, `/proc/ioports` and a sysfs PCI scan.
//!
//! # Example
//!
//! ```no_run
//! use smbridge_core::master::SmbusMaster;
//! use smbridge_core::smbus::SlaveAddress;
//! use smbridge_piix4::{open_piix4, Piix4Options};
//!
//! let mut bus = open_piix4(&Piix4Options::default())?;
//! let spd = SlaveAddress::new(0x50)?;
//! println!("SPD byte 2: {:#04x}", bus.read_byte_data(spd, 2)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # System Requirements
//!
//! - Root privileges (or CAP_SYS_RAWIO) for /dev/port
//! - The kernel `i2c-piix4` driver should not be bound to the same
//!   controller while this crate is in use

#![cfg_attr(not(feature = "std"), no_std)]

pub mod chipset;
pub mod controller;
pub mod regs;
pub mod resolver;
pub mod transaction;
pub mod transfer;

#[cfg(feature = "std")]
pub mod acpi;
#[cfg(feature = "std")]
pub mod adapter;
#[cfg(feature = "std")]
pub mod error;
#[cfg(feature = "std")]
pub mod ioport;
#[cfg(all(feature = "std", target_os = "linux"))]
pub mod lockfile;
#[cfg(feature = "std")]
pub mod pci;

use smbridge_core::smbus::Functionality;

pub use chipset::{match_identity, ControllerIdentity, EnableScheme};
pub use controller::{Context, Piix4Controller};
pub use transaction::{Completion, TransactionReport};

#[cfg(feature = "std")]
pub use adapter::{open_piix4, LockKind, Piix4Options};
#[cfg(feature = "std")]
pub use error::{HostError, Result};
#[cfg(feature = "std")]
pub use ioport::DevPort;

/// Transaction shapes the controller implements
///
/// Always quick, byte, byte data, word data and block data, in both
/// directions.
pub const fn capabilities() -> Functionality {
    Functionality::SMBUS_QUICK
        .union(Functionality::SMBUS_BYTE)
        .union(Functionality::SMBUS_BYTE_DATA)
        .union(Functionality::SMBUS_WORD_DATA)
        .union(Functionality::SMBUS_BLOCK_DATA)
}
