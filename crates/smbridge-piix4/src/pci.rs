//! SMBus controller discovery via sysfs
//!
//! Walks /sys/bus/pci/devices and returns the first device present in
//! [`SMBUS_CHIPSETS`](crate::chipset::SMBUS_CHIPSETS).

use std::path::Path;

use crate::chipset::{match_identity, ControllerIdentity, SmbusChipset};
use crate::error::{HostError, Result};

/// sysfs directory holding one entry per PCI function
pub const SYSFS_PCI_DEVICES: &str = "/sys/bus/pci/devices";

/// PCI function location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PciAddress {
    /// PCI domain (usually 0)
    pub domain: u16,
    /// Bus number
    pub bus: u8,
    /// Device (slot) number
    pub device: u8,
    /// Function number
    pub function: u8,
}

impl PciAddress {
    /// Parse a sysfs entry name such as `0000:00:14.0`
    pub fn parse(name: &str) -> Option<Self> {
        let mut parts = name.split(':');
        let domain = u16::from_str_radix(parts.next()?, 16).ok()?;
        let bus = u8::from_str_radix(parts.next()?, 16).ok()?;
        let (device, function) = parts.next()?.split_once('.')?;
        if parts.next().is_some() {
            return None;
        }

        Some(Self {
            domain,
            bus,
            device: u8::from_str_radix(device, 16).ok()?,
            function: u8::from_str_radix(function, 16).ok()?,
        })
    }
}

impl std::fmt::Display for PciAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04x}:{:02x}:{:02x}.{:x}",
            self.domain, self.bus, self.device, self.function
        )
    }
}

/// A known SMBus controller found on the PCI bus
#[derive(Debug, Clone, Copy)]
pub struct DetectedController {
    /// Where it sits
    pub address: PciAddress,
    /// IDs read from sysfs
    pub identity: ControllerIdentity,
    /// Matching table entry
    pub chipset: &'static SmbusChipset,
}

fn read_sysfs_hex(path: &Path) -> Option<u32> {
    let content = std::fs::read_to_string(path).ok()?;
    let content = content.trim();
    let hex = content.strip_prefix("0x").unwrap_or(content);
    u32::from_str_radix(hex, 16).ok()
}

/// Read the identity of the PCI function at `dir`
fn read_identity(dir: &Path) -> Option<ControllerIdentity> {
    let vendor_id = read_sysfs_hex(&dir.join("vendor"))?;
    let device_id = read_sysfs_hex(&dir.join("device"))?;
    let revision_id = read_sysfs_hex(&dir.join("revision")).unwrap_or(0);

    Some(ControllerIdentity::new(
        u16::try_from(vendor_id).ok()?,
        u16::try_from(device_id).ok()?,
        u8::try_from(revision_id).ok()?,
    ))
}

/// Scan `root` (normally [`SYSFS_PCI_DEVICES`]) for a known controller
pub fn find_smbus_controller_in(root: &Path) -> Result<Option<DetectedController>> {
    let entries = std::fs::read_dir(root).map_err(HostError::PciScan)?;

    let mut names: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    for name in names {
        let Some(address) = PciAddress::parse(&name) else {
            continue;
        };
        let Some(identity) = read_identity(&root.join(&name)) else {
            continue;
        };

        if let Ok(chipset) =
            match_identity(identity.vendor_id, identity.device_id, identity.revision_id)
        {
            log::info!(
                "Found SMBus controller \"{}\" {} ({}) at {}",
                chipset.vendor_name,
                chipset.device_name,
                identity,
                address
            );
            return Ok(Some(DetectedController {
                address,
                identity,
                chipset,
            }));
        }
    }

    Ok(None)
}

/// Scan the PCI bus for a known SMBus controller
pub fn find_smbus_controller() -> Result<Option<DetectedController>> {
    find_smbus_controller_in(Path::new(SYSFS_PCI_DEVICES))
}
