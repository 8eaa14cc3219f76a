//! Cross-process port range arbitration with flock(2)
//!
//! Each claimed range maps to a lock file named after the range. Locks are
//! taken non-blocking, so a range held by another process (or another
//! arbiter in this process) fails immediately with
//! [`Error::ResourceBusy`].

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use smbridge_core::platform::{IoRegion, RegionArbiter};
use smbridge_core::Error;

use crate::error::{HostError, Result};

/// Default lock directory
pub const DEFAULT_LOCK_DIR: &str = "/run/lock";

/// Region arbiter backed by lock files
#[derive(Debug)]
pub struct LockFileArbiter {
    dir: PathBuf,
    held: Mutex<Vec<(IoRegion, File)>>,
}

impl LockFileArbiter {
    /// Use lock files in `dir`, which must exist
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(HostError::InvalidParameter(format!(
                "lock directory {} does not exist",
                dir.display()
            )));
        }
        Ok(Self {
            dir,
            held: Mutex::new(Vec::new()),
        })
    }

    /// Lock file path for `region`
    pub fn lock_path(&self, region: IoRegion) -> PathBuf {
        self.dir
            .join(format!("smbridge-{:04x}-{}.lock", region.start, region.len))
    }

    /// Directory holding the lock files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn try_lock(path: &Path) -> std::result::Result<File, HostError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|source| HostError::LockFailed {
                path: path.to_path_buf(),
                source,
            })?;

        // SAFETY: the descriptor is owned by `file` and stays open for the call
        let ret = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        if ret != 0 {
            return Err(HostError::LockFailed {
                path: path.to_path_buf(),
                source: std::io::Error::last_os_error(),
            });
        }
        Ok(file)
    }
}

impl RegionArbiter for LockFileArbiter {
    fn acquire_region(&self, region: IoRegion, tag: &'static str) -> smbridge_core::Result<()> {
        let path = self.lock_path(region);
        match Self::try_lock(&path) {
            Ok(file) => {
                log::trace!("{} locked {} via {}", tag, region, path.display());
                self.held
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push((region, file));
                Ok(())
            }
            Err(HostError::LockFailed { source, .. })
                if source.kind() == std::io::ErrorKind::WouldBlock =>
            {
                log::debug!("Region {} for {} held by another process", region, tag);
                Err(Error::ResourceBusy)
            }
            Err(e) => {
                log::error!("Cannot claim region {} for {}: {}", region, tag, e);
                Err(Error::ResourceBusy)
            }
        }
    }

    fn release_region(&self, region: IoRegion) {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        match held.iter().position(|(r, _)| *r == region) {
            // Closing the descriptor drops the flock
            Some(pos) => drop(held.swap_remove(pos)),
            None => log::warn!("Releasing region {} that was not locked", region),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smbridge_core::platform::claim_region;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("smbridge-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_lock_path() {
        let dir = temp_dir("path");
        let arbiter = LockFileArbiter::new(&dir).unwrap();
        assert_eq!(
            arbiter.lock_path(IoRegion::new(0xcd6, 2)),
            dir.join("smbridge-0cd6-2.lock")
        );
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_two_arbiters_contend() {
        let dir = temp_dir("contend");
        let first = LockFileArbiter::new(&dir).unwrap();
        let second = LockFileArbiter::new(&dir).unwrap();
        let pair = IoRegion::new(0xcd6, 2);

        {
            let _claim = claim_region(&first, pair, "first").unwrap();
            assert_eq!(
                second.acquire_region(pair, "second"),
                Err(Error::ResourceBusy)
            );
        }

        // Released on drop
        let claim = claim_region(&second, pair, "second");
        assert!(claim.is_ok());
        drop(claim);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_dir() {
        let result = LockFileArbiter::new("/nonexistent/lockdir");
        assert!(matches!(result, Err(HostError::InvalidParameter(_))));
    }
}
