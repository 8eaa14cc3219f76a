//! Opening the system's PIIX4 adapter from CLI options

use std::path::PathBuf;
use std::sync::Arc;

use smbridge_core::platform::{NoReservations, RegionArbiter, RegionTable};
use smbridge_core::Error;

use crate::acpi::AcpiReservations;
use crate::controller::Piix4Controller;
use crate::error::{HostError, Result};
use crate::ioport::{DevPort, DEV_PORT};
use crate::pci::find_smbus_controller;

#[cfg(target_os = "linux")]
use crate::lockfile::DEFAULT_LOCK_DIR;
#[cfg(not(target_os = "linux"))]
const DEFAULT_LOCK_DIR: &str = "/run/lock";

/// How the PM index pair is arbitrated during discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockKind {
    /// Lock files, shared with other processes
    #[default]
    File,
    /// A region table shared by every adapter opened with the same options
    Process,
}

impl LockKind {
    /// Parse a lock kind from an option value
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "file" | "flock" => Some(Self::File),
            "process" => Some(Self::Process),
            _ => None,
        }
    }
}

/// Options for the `piix4` adapter
#[derive(Debug, Clone)]
pub struct Piix4Options {
    /// Port device path
    pub device: PathBuf,
    /// Arbitration of the PM index pair
    pub lock: LockKind,
    /// Directory for lock files
    pub lock_dir: PathBuf,
    /// Claim table used with [`LockKind::Process`]; clones share it
    pub region_table: Arc<RegionTable>,
}

impl Default for Piix4Options {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEV_PORT),
            lock: LockKind::default(),
            lock_dir: PathBuf::from(DEFAULT_LOCK_DIR),
            region_table: Arc::new(RegionTable::new()),
        }
    }
}

impl Piix4Options {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the port device
    pub fn with_device(mut self, device: impl Into<PathBuf>) -> Self {
        self.device = device.into();
        self
    }

    /// Set the arbitration mode
    pub fn with_lock(mut self, lock: LockKind) -> Self {
        self.lock = lock;
        self
    }

    /// Set the lock file directory
    pub fn with_lock_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = dir.into();
        self
    }

    /// Arbitrate through `table`, shared with other drivers in this process
    ///
    /// Switches the lock kind to [`LockKind::Process`].
    pub fn with_region_table(mut self, table: Arc<RegionTable>) -> Self {
        self.lock = LockKind::Process;
        self.region_table = table;
        self
    }

    /// Parse options from key-value pairs (from CLI)
    ///
    /// Supported options:
    /// - dev=/dev/port
    /// - lock=file|process
    /// - lockdir=/run/lock
    pub fn from_options(options: &[(&str, &str)]) -> Result<Self> {
        let mut opts = Self::default();

        for (key, value) in options {
            match *key {
                "dev" => opts.device = PathBuf::from(value),
                "lock" => {
                    opts.lock = LockKind::parse(value).ok_or_else(|| {
                        HostError::InvalidParameter(format!(
                            "Invalid lock value: {} (use: file or process)",
                            value
                        ))
                    })?;
                }
                "lockdir" => opts.lock_dir = PathBuf::from(value),
                _ => {
                    log::warn!("piix4: Unknown option: {}={}", key, value);
                }
            }
        }

        Ok(opts)
    }

    fn arbiter(&self) -> Result<Box<dyn RegionArbiter>> {
        match self.lock {
            LockKind::Process => Ok(Box::new(Arc::clone(&self.region_table))),
            #[cfg(target_os = "linux")]
            LockKind::File => Ok(Box::new(crate::lockfile::LockFileArbiter::new(
                &self.lock_dir,
            )?)),
            #[cfg(not(target_os = "linux"))]
            LockKind::File => Err(HostError::NotSupported),
        }
    }
}

/// Detect the SMBus controller and open it through the port device
pub fn open_piix4(options: &Piix4Options) -> Result<Piix4Controller<DevPort>> {
    let detected = find_smbus_controller()?.ok_or(HostError::Smbus(Error::NoController))?;
    let io = DevPort::open(&options.device)?;
    let arbiter = options.arbiter()?;

    let ctrl = match AcpiReservations::from_system() {
        Ok(reservations) => {
            Piix4Controller::create(io, arbiter.as_ref(), &reservations, detected.identity)?
        }
        Err(e) => {
            log::warn!("Cannot check firmware reservations: {}", e);
            Piix4Controller::create(io, arbiter.as_ref(), &NoReservations, detected.identity)?
        }
    };

    Ok(ctrl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chipset::ControllerIdentity;
    use smbridge_core::platform::{claim_region, IoRegion};
    use smbridge_dummy::Piix4Emulator;

    #[test]
    fn test_defaults() {
        let opts = Piix4Options::from_options(&[]).unwrap();
        assert_eq!(opts.device, PathBuf::from("/dev/port"));
        assert_eq!(opts.lock, LockKind::File);
        assert_eq!(opts.lock_dir, PathBuf::from("/run/lock"));
    }

    #[test]
    fn test_parse_options() {
        let opts = Piix4Options::from_options(&[
            ("dev", "/tmp/port"),
            ("lock", "process"),
            ("lockdir", "/tmp"),
            ("bogus", "1"),
        ])
        .unwrap();
        assert_eq!(opts.device, PathBuf::from("/tmp/port"));
        assert_eq!(opts.lock, LockKind::Process);
        assert_eq!(opts.lock_dir, PathBuf::from("/tmp"));
    }

    #[test]
    fn test_invalid_lock() {
        let result = Piix4Options::from_options(&[("lock", "maybe")]);
        assert!(matches!(result, Err(HostError::InvalidParameter(_))));
    }

    #[test]
    fn test_none_is_not_a_lock_kind() {
        assert_eq!(LockKind::parse("none"), None);
    }

    #[test]
    fn test_process_lock_excludes_other_handles() {
        let table = Arc::new(RegionTable::new());
        let first = Piix4Options::new().with_region_table(Arc::clone(&table));
        let second = first.clone();
        let pair = IoRegion::new(0xcd6, 2);

        let a = first.arbiter().unwrap();
        let b = second.arbiter().unwrap();
        {
            let _claim = claim_region(a.as_ref(), pair, "first").unwrap();
            assert_eq!(b.acquire_region(pair, "second"), Err(Error::ResourceBusy));
            assert_eq!(table.holder(0xcd7), Some("first"));
        }
        assert!(b.acquire_region(pair, "second").is_ok());
        b.release_region(pair);
    }

    #[test]
    fn test_controllers_sharing_a_table_contend() {
        let identity = ControllerIdentity::new(0x1022, 0x790b, 0x61);
        let opts = Piix4Options::new().with_region_table(Arc::new(RegionTable::new()));
        let held = opts.arbiter().unwrap();
        let other = opts.arbiter().unwrap();

        let claim = claim_region(held.as_ref(), IoRegion::new(0xcd6, 2), "other driver").unwrap();
        let result = Piix4Controller::create(
            Piix4Emulator::new(),
            other.as_ref(),
            &NoReservations,
            identity,
        );
        assert!(matches!(result, Err(Error::ResourceBusy)));

        drop(claim);
        let ctrl =
            Piix4Controller::create(Piix4Emulator::new(), other.as_ref(), &NoReservations, identity);
        assert!(ctrl.is_ok());
    }

    #[test]
    fn test_builder() {
        let opts = Piix4Options::new()
            .with_device("/dev/null")
            .with_lock(LockKind::Process)
            .with_lock_dir("/tmp");
        assert_eq!(opts.device, PathBuf::from("/dev/null"));
        assert_eq!(opts.lock, LockKind::Process);
    }
}
