//! Platform services consumed by host controller drivers
//!
//! Drivers never touch hardware directly. They are handed:
//!
//! - a [`PortIo`] backend for byte-wide port reads/writes and short delays
//! - a [`RegionArbiter`] that hands out exclusive, named claims on port
//!   ranges shared with other software (e.g. an index/data pair)
//! - a [`ReservedRegions`] oracle that knows which ranges firmware owns
//!
//! Hosted builds implement these over `/dev/port`, lock files and
//! `/proc/ioports`; tests implement them with emulators and recorders.

mod port;
mod region;

pub use port::{IoRegion, PortIo};
#[cfg(feature = "std")]
pub use region::RegionTable;
pub use region::{claim_region, NoReservations, RegionArbiter, RegionClaim, ReservedRegions};
