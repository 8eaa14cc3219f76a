//! Port I/O through /dev/port
//!
//! Each access is a one-byte positioned read or write at the port number,
//! which the kernel turns into an `inb`/`outb`. Requires root (or
//! CAP_SYS_RAWIO) and a kernel built with /dev/port support.

use std::path::Path;

use smbridge_core::platform::PortIo;

use crate::error::{HostError, Result};

/// Default port device
pub const DEV_PORT: &str = "/dev/port";

/// Port backend over /dev/port
#[cfg(target_os = "linux")]
pub struct DevPort {
    file: std::fs::File,
}

#[cfg(target_os = "linux")]
impl DevPort {
    /// Open the port device at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| HostError::OpenFailed {
                path: path.to_path_buf(),
                source,
            })?;
        log::debug!("Opened {} for port I/O", path.display());
        Ok(Self { file })
    }
}

#[cfg(target_os = "linux")]
impl PortIo for DevPort {
    fn read_u8(&mut self, port: u16) -> u8 {
        use std::os::unix::fs::FileExt;

        let mut buf = [0xffu8];
        if let Err(e) = self.file.read_exact_at(&mut buf, port as u64) {
            log::trace!("inb({:#06x}) failed: {}", port, e);
            return 0xff;
        }
        buf[0]
    }

    fn write_u8(&mut self, port: u16, value: u8) {
        use std::os::unix::fs::FileExt;

        if let Err(e) = self.file.write_all_at(&[value], port as u64) {
            log::trace!("outb({:#04x}, {:#06x}) failed: {}", value, port, e);
        }
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(std::time::Duration::from_micros(us as u64));
    }
}

/// Port backend placeholder for platforms without /dev/port
#[cfg(not(target_os = "linux"))]
pub struct DevPort {
    _private: (),
}

#[cfg(not(target_os = "linux"))]
impl DevPort {
    /// Port I/O is only implemented on Linux
    pub fn open(_path: impl AsRef<Path>) -> Result<Self> {
        Err(HostError::NotSupported)
    }
}

#[cfg(not(target_os = "linux"))]
impl PortIo for DevPort {
    fn read_u8(&mut self, _port: u16) -> u8 {
        0xff
    }

    fn write_u8(&mut self, _port: u16, _value: u8) {}

    fn delay_us(&mut self, _us: u32) {}
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    #[test]
    fn test_missing_device() {
        let result = DevPort::open("/nonexistent/port");
        assert!(matches!(result, Err(HostError::OpenFailed { .. })));
    }
}
