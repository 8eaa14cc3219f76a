//! SMBus base address discovery
//!
//! SB800-family southbridges do not expose the SMBus register block in a
//! PCI BAR. Its base address lives in power-management space, which is
//! reached through the index/data pair at 0xCD6/0xCD7. That pair is shared
//! with other drivers (watchdog, GPIO, sensors), so it is claimed only for
//! the four port accesses below and released before anything else happens.

use smbridge_core::platform::{claim_region, IoRegion, PortIo, RegionArbiter, ReservedRegions};
use smbridge_core::{Error, Result};

use crate::chipset::{scheme_for, ControllerIdentity, EnableScheme};
use crate::regs::{
    SB800_PIIX4_MUXED_NAME, SB800_PIIX4_SMB_IDX, SB800_PIIX4_SMB_IDX_LEN, SMBIOSIZE,
    SMBUS_REGION_NAME, SMB_EN_LEGACY_ENABLE, SMB_EN_NEW_ENABLE, SMB_LEGACY_BASE_MASK,
    SMB_NEW_BASE_LO,
};

/// The shared PM index/data pair
pub const PM_INDEX_PAIR: IoRegion = IoRegion::new(SB800_PIIX4_SMB_IDX, SB800_PIIX4_SMB_IDX_LEN);

/// Decoded enable register contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmbusEnable {
    /// SMBus decoding enabled in PM space
    pub enabled: bool,
    /// Register block base address
    pub base: u16,
}

/// Compose the enable bit and base address from the two PM bytes
pub const fn compose(scheme: EnableScheme, lo: u8, hi: u8) -> SmbusEnable {
    match scheme {
        EnableScheme::New => SmbusEnable {
            enabled: lo & SMB_EN_NEW_ENABLE != 0,
            base: ((hi as u16) << 8) | SMB_NEW_BASE_LO,
        },
        EnableScheme::Legacy => SmbusEnable {
            enabled: lo & SMB_EN_LEGACY_ENABLE != 0,
            base: (((hi as u16) << 8) | lo as u16) & SMB_LEGACY_BASE_MASK,
        },
    }
}

/// Read the two PM bytes at `selector` and `selector + 1`
fn read_pm_pair<P: PortIo + ?Sized>(io: &mut P, selector: u8) -> (u8, u8) {
    let data = SB800_PIIX4_SMB_IDX + 1;

    io.write_u8(SB800_PIIX4_SMB_IDX, selector);
    let lo = io.read_u8(data);
    io.write_u8(SB800_PIIX4_SMB_IDX, selector.wrapping_add(1));
    let hi = io.read_u8(data);

    (lo, hi)
}

/// Discover the SMBus base address for `identity`
///
/// Fails with [`Error::ResourceBusy`] if another driver holds the index
/// pair, [`Error::ControllerDisabled`] if SMBus decoding is switched off,
/// and [`Error::RegionReserved`] if firmware owns the register block.
pub fn resolve_base<P, A, R>(
    io: &mut P,
    arbiter: &A,
    reservations: &R,
    identity: &ControllerIdentity,
) -> Result<u16>
where
    P: PortIo + ?Sized,
    A: RegionArbiter + ?Sized,
    R: ReservedRegions + ?Sized,
{
    let scheme = scheme_for(identity);
    let selector = scheme.selector();

    let (lo, hi) = {
        let _claim = claim_region(arbiter, PM_INDEX_PAIR, SB800_PIIX4_MUXED_NAME).map_err(|e| {
            log::error!("SMB base address index region {} already in use", PM_INDEX_PAIR);
            e
        })?;
        read_pm_pair(io, selector)
    };

    let smb = compose(scheme, lo, hi);
    log::debug!(
        "{} scheme: PM[{:#04x}]={:#04x} PM[{:#04x}]={:#04x} -> base {:#06x}",
        scheme,
        selector,
        lo,
        selector.wrapping_add(1),
        hi,
        smb.base
    );

    if !smb.enabled {
        log::error!("SMBus Host Controller not enabled!");
        return Err(Error::ControllerDisabled);
    }

    let window = IoRegion::new(smb.base, SMBIOSIZE);
    if reservations.is_region_reserved(window, SMBUS_REGION_NAME) {
        log::debug!("{} conflicts with a firmware-owned region", window);
        return Err(Error::RegionReserved);
    }

    Ok(smb.base)
}
