//! Firmware-owned port ranges from /proc/ioports

use std::path::Path;

use smbridge_core::platform::{IoRegion, ReservedRegions};

use crate::error::{HostError, Result};

/// Kernel port resource listing
pub const PROC_IOPORTS: &str = "/proc/ioports";

/// Owner prefix of ranges claimed by ACPI operation regions
///
/// `pnp` motherboard-resource windows are not included: they routinely cover
/// the SMBus block without firmware ever touching it.
const FIRMWARE_OWNER: &str = "ACPI";

/// One line of /proc/ioports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoportEntry {
    /// Port range
    pub region: IoRegion,
    /// Name of the resource owner
    pub owner: String,
}

impl IoportEntry {
    /// Parse a line such as `  0800-0803 : ACPI PM1a_EVT_BLK`
    pub fn parse(line: &str) -> Option<Self> {
        let (range, owner) = line.trim().split_once(" : ")?;
        let (start, end) = range.split_once('-')?;
        let start = u16::from_str_radix(start, 16).ok()?;
        let end = u16::from_str_radix(end, 16).ok()?;
        if end < start {
            return None;
        }

        let len = (end as u32 - start as u32 + 1).min(u16::MAX as u32) as u16;
        Some(Self {
            region: IoRegion::new(start, len),
            owner: owner.trim().to_string(),
        })
    }

    /// Returns true if firmware owns this range
    pub fn is_firmware(&self) -> bool {
        self.owner.starts_with(FIRMWARE_OWNER)
    }
}

/// Firmware reservations read from the kernel
#[derive(Debug, Clone, Default)]
pub struct AcpiReservations {
    entries: Vec<IoportEntry>,
}

impl AcpiReservations {
    /// Build from the text of /proc/ioports
    pub fn parse(text: &str) -> Self {
        let entries: Vec<_> = text.lines().filter_map(IoportEntry::parse).collect();

        // Unprivileged readers see every range as 0000-0000
        if !entries.is_empty() && entries.iter().all(|e| e.region.start == 0 && e.region.len == 1)
        {
            log::warn!("{} is masked, run as root to check firmware reservations", PROC_IOPORTS);
        }

        Self { entries }
    }

    /// Read and parse `path` (normally [`PROC_IOPORTS`])
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| HostError::IoportsRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// Read the system's /proc/ioports
    pub fn from_system() -> Result<Self> {
        Self::load(PROC_IOPORTS)
    }

    /// All parsed entries
    pub fn entries(&self) -> &[IoportEntry] {
        &self.entries
    }
}

impl ReservedRegions for AcpiReservations {
    fn is_region_reserved(&self, region: IoRegion, tag: &str) -> bool {
        match self
            .entries
            .iter()
            .find(|e| e.is_firmware() && e.region.overlaps(&region))
        {
            Some(entry) => {
                log::warn!(
                    "Resource conflict: {} {} overlaps {} ({})",
                    tag,
                    region,
                    entry.region,
                    entry.owner
                );
                true
            }
            None => false,
        }
    }
}
