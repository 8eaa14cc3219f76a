//! Errors raised by the host-side plumbing

use std::path::PathBuf;

use thiserror::Error;

/// Host integration errors
#[derive(Debug, Error)]
pub enum HostError {
    /// Controller or bus level failure
    #[error(transparent)]
    Smbus(#[from] smbridge_core::Error),

    /// Failed to open the port device
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to scan PCI devices in sysfs
    #[error("Failed to scan PCI devices: {0}")]
    PciScan(#[source] std::io::Error),

    /// Failed to read /proc/ioports
    #[error("Failed to read {path}: {source}")]
    IoportsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or lock a lock file
    #[error("Failed to lock {path}: {source}")]
    LockFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid adapter option
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Port I/O is not available on this platform
    #[error("Port I/O is not supported on this platform")]
    NotSupported,
}

/// Result type for host operations
pub type Result<T> = std::result::Result<T, HostError>;
