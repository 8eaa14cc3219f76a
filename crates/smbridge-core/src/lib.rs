//! smbridge-core - Core library for SMBus host controllers
//!
//! This crate provides the bus-level vocabulary shared by every SMBus host
//! controller driver in the workspace: transaction shapes, payloads, the
//! error type, the [`SmbusMaster`](master::SmbusMaster) trait that drivers
//! implement, and the platform traits drivers consume (port I/O, shared
//! region arbitration, firmware reservations). It is designed to be
//! `no_std` compatible so the same driver code can run in firmware.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`), which adds
//!   the in-process [`RegionTable`](platform::RegionTable)
//! - `alloc` - Enable heap allocation
//!
//! # Example
//!
//! ```ignore
//! use smbridge_core::master::SmbusMaster;
//! use smbridge_core::smbus::SlaveAddress;
//!
//! fn dump_spd<M: SmbusMaster>(bus: &mut M) -> smbridge_core::Result<()> {
//!     let addr = SlaveAddress::new(0x50)?;
//!     for reg in 0..4 {
//!         let value = bus.read_byte_data(addr, reg)?;
//!         println!("{:#04x}: {:#04x}", reg, value);
//!     }
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod error;
pub mod master;
pub mod message;
pub mod platform;
pub mod smbus;

pub use error::{Error, Result};
