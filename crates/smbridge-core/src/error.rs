//! Error types for smbridge-core
//!
//! This module provides a no_std compatible error type shared by the
//! address resolver, the transaction engine and the transfer layer.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    // Attach-time errors
    /// The shared indexed configuration pair is claimed by someone else
    ResourceBusy,
    /// The host controller's enable bit is clear
    ControllerDisabled,
    /// The controller's register window overlaps a firmware-reserved range
    RegionReserved,
    /// No known SMBus host controller matched the platform identity
    NoController,

    // Transaction errors
    /// Stale status flags could not be cleared before starting
    ControllerStuck,
    /// The host-busy bit never cleared within the poll budget
    Timeout,
    /// Failed bus transaction or bus collision
    IoError,
    /// The addressed device did not acknowledge
    DeviceNotFound,

    // Request errors
    /// Transaction shape not supported by this controller
    Unsupported,
    /// The caller supplied an invalid request
    InvalidArgument,
    /// The device returned a malformed response
    ProtocolError,
}

impl Error {
    /// Conventional errno name for this error, used in log output
    pub const fn errno_name(&self) -> &'static str {
        match self {
            Self::ResourceBusy | Self::ControllerStuck => "EBUSY",
            Self::ControllerDisabled | Self::RegionReserved | Self::NoController => "ENODEV",
            Self::Timeout => "ETIMEDOUT",
            Self::IoError => "EIO",
            Self::DeviceNotFound => "ENXIO",
            Self::Unsupported => "EOPNOTSUPP",
            Self::InvalidArgument => "EINVAL",
            Self::ProtocolError => "EPROTO",
        }
    }

    /// Returns true if the error was produced by a bus transaction
    /// (as opposed to attach-time or request validation)
    pub const fn is_transaction_error(&self) -> bool {
        matches!(
            self,
            Self::ControllerStuck
                | Self::Timeout
                | Self::IoError
                | Self::DeviceNotFound
                | Self::ProtocolError
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceBusy => write!(f, "SMBus index region already in use"),
            Self::ControllerDisabled => write!(f, "SMBus host controller not enabled"),
            Self::RegionReserved => write!(f, "SMBus register window reserved by firmware"),
            Self::NoController => write!(f, "no supported SMBus host controller found"),
            Self::ControllerStuck => write!(f, "SMBus host busy and could not be reset"),
            Self::Timeout => write!(f, "SMBus transaction timed out"),
            Self::IoError => write!(f, "SMBus transaction failed"),
            Self::DeviceNotFound => write!(f, "no response from SMBus device"),
            Self::Unsupported => write!(f, "SMBus transaction type not supported"),
            Self::InvalidArgument => write!(f, "invalid SMBus request"),
            Self::ProtocolError => write!(f, "malformed SMBus response"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
