//! SMBus controller identity database
//!
//! Maps PCI vendor/device/revision triples to the scheme used to locate the
//! SMBus register block in power-management space.

use core::fmt;

use smbridge_core::{Error, Result};

use crate::regs::{SMB_EN_LEGACY, SMB_EN_NEW};

/// AMD PCI Vendor ID
pub const AMD_VID: u16 = 0x1022;
/// ATI PCI Vendor ID, used by pre-FCH southbridges
pub const ATI_VID: u16 = 0x1002;

/// PCI identity of an SMBus host controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerIdentity {
    /// Vendor ID
    pub vendor_id: u16,
    /// Device ID
    pub device_id: u16,
    /// Revision ID
    pub revision_id: u8,
}

impl ControllerIdentity {
    /// Create an identity from its parts
    pub const fn new(vendor_id: u16, device_id: u16, revision_id: u8) -> Self {
        Self {
            vendor_id,
            device_id,
            revision_id,
        }
    }
}

impl fmt::Display for ControllerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:04x} rev {:02x}",
            self.vendor_id, self.device_id, self.revision_id
        )
    }
}

/// How the SMBus base address is stored in PM space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableScheme {
    /// KERNCZ rev 0x49+: enable bit 4 of PM 0x00, base high byte at PM 0x01
    New,
    /// SB800: enable bit 0 of PM 0x28, base in PM 0x28/0x29
    Legacy,
}

impl EnableScheme {
    /// PM index of the low byte; the high byte lives at the next index
    pub const fn selector(self) -> u8 {
        match self {
            Self::New => SMB_EN_NEW,
            Self::Legacy => SMB_EN_LEGACY,
        }
    }
}

impl fmt::Display for EnableScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Legacy => write!(f, "legacy"),
        }
    }
}

/// Revision ID matching mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionMatch {
    /// Match any revision
    Any,
    /// Match this revision and every later one
    AtLeast(u8),
    /// Match revisions strictly below this one
    Below(u8),
}

impl RevisionMatch {
    const fn accepts(self, revision_id: u8) -> bool {
        match self {
            Self::Any => true,
            Self::AtLeast(rev) => revision_id >= rev,
            Self::Below(rev) => revision_id < rev,
        }
    }
}

/// One entry of the controller table
#[derive(Debug, Clone, Copy)]
pub struct SmbusChipset {
    /// PCI vendor ID
    pub vendor_id: u16,
    /// PCI device ID
    pub device_id: u16,
    /// Revision ID matching
    pub revision: RevisionMatch,
    /// Register discovery scheme
    pub scheme: EnableScheme,
    /// Vendor name
    pub vendor_name: &'static str,
    /// Device/chipset name
    pub device_name: &'static str,
}

impl SmbusChipset {
    /// Check if this entry matches the given PCI device
    pub fn matches(&self, vendor_id: u16, device_id: u16, revision_id: u8) -> bool {
        self.vendor_id == vendor_id
            && self.device_id == device_id
            && self.revision.accepts(revision_id)
    }
}

/// Known SB800-family SMBus controllers
pub static SMBUS_CHIPSETS: &[SmbusChipset] = &[
    SmbusChipset {
        vendor_id: AMD_VID,
        device_id: 0x790b,
        revision: RevisionMatch::AtLeast(0x49),
        scheme: EnableScheme::New,
        vendor_name: "AMD",
        device_name: "FCH (KERNCZ)",
    },
    SmbusChipset {
        vendor_id: AMD_VID,
        device_id: 0x790b,
        revision: RevisionMatch::Below(0x49),
        scheme: EnableScheme::Legacy,
        vendor_name: "AMD",
        device_name: "FCH (early KERNCZ)",
    },
    SmbusChipset {
        vendor_id: ATI_VID,
        device_id: 0x4385,
        revision: RevisionMatch::Any,
        scheme: EnableScheme::Legacy,
        vendor_name: "ATI",
        device_name: "SB7x0/SB8x0/SB9x0",
    },
    SmbusChipset {
        vendor_id: AMD_VID,
        device_id: 0x780b,
        revision: RevisionMatch::Any,
        scheme: EnableScheme::Legacy,
        vendor_name: "AMD",
        device_name: "Hudson-2",
    },
];

/// Look up a controller in [`SMBUS_CHIPSETS`]
///
/// Returns [`Error::NoController`] for identities this driver does not know.
pub fn match_identity(
    vendor_id: u16,
    device_id: u16,
    revision_id: u8,
) -> Result<&'static SmbusChipset> {
    SMBUS_CHIPSETS
        .iter()
        .find(|entry| entry.matches(vendor_id, device_id, revision_id))
        .ok_or(Error::NoController)
}

/// Scheme for an identity, falling back to legacy for unknown parts
pub fn scheme_for(identity: &ControllerIdentity) -> EnableScheme {
    match match_identity(identity.vendor_id, identity.device_id, identity.revision_id) {
        Ok(entry) => entry.scheme,
        Err(_) => EnableScheme::Legacy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revision_threshold() {
        let entry = match_identity(AMD_VID, 0x790b, 0x49).unwrap();
        assert_eq!(entry.scheme, EnableScheme::New);
        let entry = match_identity(AMD_VID, 0x790b, 0x61).unwrap();
        assert_eq!(entry.scheme, EnableScheme::New);

        let entry = match_identity(AMD_VID, 0x790b, 0x42).unwrap();
        assert_eq!(entry.scheme, EnableScheme::Legacy);
    }

    #[test]
    fn test_legacy_parts() {
        assert_eq!(
            match_identity(ATI_VID, 0x4385, 0x3c).unwrap().device_name,
            "SB7x0/SB8x0/SB9x0"
        );
        assert_eq!(
            match_identity(AMD_VID, 0x780b, 0x14).unwrap().scheme,
            EnableScheme::Legacy
        );
    }

    #[test]
    fn test_unknown_identity() {
        assert_eq!(
            match_identity(0x8086, 0x1c22, 0x05).err(),
            Some(Error::NoController)
        );
        let unknown = ControllerIdentity::new(0x8086, 0x1c22, 0x05);
        assert_eq!(scheme_for(&unknown), EnableScheme::Legacy);
    }

    #[test]
    fn test_selectors() {
        assert_eq!(EnableScheme::New.selector(), 0x00);
        assert_eq!(EnableScheme::Legacy.selector(), 0x28);
    }
}
