//! Shared port range arbitration and firmware reservations

use crate::error::{Error, Result};

use super::port::IoRegion;

/// Advisory mutual exclusion over port ranges shared between drivers
///
/// Claims are named by a tag so a busy range can be attributed in logs.
/// Acquisition never blocks: a range that is already claimed yields
/// [`Error::ResourceBusy`].
pub trait RegionArbiter {
    /// Claim `region` for `tag`
    fn acquire_region(&self, region: IoRegion, tag: &'static str) -> Result<()>;

    /// Release a claim previously granted by [`acquire_region`](Self::acquire_region)
    fn release_region(&self, region: IoRegion);
}

impl<T: RegionArbiter + ?Sized> RegionArbiter for &T {
    fn acquire_region(&self, region: IoRegion, tag: &'static str) -> Result<()> {
        (**self).acquire_region(region, tag)
    }

    fn release_region(&self, region: IoRegion) {
        (**self).release_region(region)
    }
}

#[cfg(feature = "std")]
impl<T: RegionArbiter + ?Sized> RegionArbiter for std::sync::Arc<T> {
    fn acquire_region(&self, region: IoRegion, tag: &'static str) -> Result<()> {
        (**self).acquire_region(region, tag)
    }

    fn release_region(&self, region: IoRegion) {
        (**self).release_region(region)
    }
}

/// A granted claim, released when dropped
pub struct RegionClaim<'a, A: RegionArbiter + ?Sized> {
    arbiter: &'a A,
    region: IoRegion,
}

impl<A: RegionArbiter + ?Sized> RegionClaim<'_, A> {
    /// The claimed range
    pub fn region(&self) -> IoRegion {
        self.region
    }
}

impl<A: RegionArbiter + ?Sized> Drop for RegionClaim<'_, A> {
    fn drop(&mut self) {
        self.arbiter.release_region(self.region);
    }
}

/// Claim `region` and return a guard that releases it on drop
pub fn claim_region<'a, A: RegionArbiter + ?Sized>(
    arbiter: &'a A,
    region: IoRegion,
    tag: &'static str,
) -> Result<RegionClaim<'a, A>> {
    arbiter.acquire_region(region, tag)?;
    Ok(RegionClaim { arbiter, region })
}

/// Knowledge of port ranges owned by platform firmware
pub trait ReservedRegions {
    /// Returns true if any port of `region` is reserved by firmware
    ///
    /// `tag` names the driver asking, for diagnostics.
    fn is_region_reserved(&self, region: IoRegion, tag: &str) -> bool;
}

impl<T: ReservedRegions + ?Sized> ReservedRegions for &T {
    fn is_region_reserved(&self, region: IoRegion, tag: &str) -> bool {
        (**self).is_region_reserved(region, tag)
    }
}

impl ReservedRegions for [IoRegion] {
    fn is_region_reserved(&self, region: IoRegion, tag: &str) -> bool {
        match self.iter().find(|reserved| reserved.overlaps(&region)) {
            Some(reserved) => {
                log::debug!("{}: {} overlaps reserved {}", tag, region, reserved);
                true
            }
            None => false,
        }
    }
}

/// Reservation oracle for platforms without firmware-owned ranges
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReservations;

impl ReservedRegions for NoReservations {
    fn is_region_reserved(&self, _region: IoRegion, _tag: &str) -> bool {
        false
    }
}

/// In-process table of claimed port ranges
///
/// One table is shared (typically behind an `Arc`) by every driver in the
/// process that touches the same hardware. Claims are keyed by the port
/// range itself, so two drivers asking for an overlapping range contend
/// regardless of the tag they use.
#[cfg(feature = "std")]
#[derive(Debug, Default)]
pub struct RegionTable {
    claims: std::sync::Mutex<std::vec::Vec<(IoRegion, &'static str)>>,
}

#[cfg(feature = "std")]
impl RegionTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag of the claim currently covering `port`, if any
    pub fn holder(&self, port: u16) -> Option<&'static str> {
        let claims = self.lock();
        claims
            .iter()
            .find(|(region, _)| region.contains(port))
            .map(|(_, tag)| *tag)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, std::vec::Vec<(IoRegion, &'static str)>> {
        // Every mutation is a single push or swap_remove
        self.claims
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(feature = "std")]
impl RegionArbiter for RegionTable {
    fn acquire_region(&self, region: IoRegion, tag: &'static str) -> Result<()> {
        let mut claims = self.lock();

        if let Some((held, holder)) = claims.iter().find(|(held, _)| held.overlaps(&region)) {
            log::debug!(
                "Region {} for {} busy: {} held by {}",
                region,
                tag,
                held,
                holder
            );
            return Err(Error::ResourceBusy);
        }

        claims.push((region, tag));
        Ok(())
    }

    fn release_region(&self, region: IoRegion) {
        let mut claims = self.lock();
        if let Some(pos) = claims.iter().position(|(held, _)| *held == region) {
            claims.swap_remove(pos);
        } else {
            log::warn!("Releasing region {} that was not claimed", region);
        }
    }
}
