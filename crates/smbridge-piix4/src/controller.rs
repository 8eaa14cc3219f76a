//! PIIX4 SMBus controller instance

use core::fmt;

use smbridge_core::master::SmbusMaster;
use smbridge_core::platform::{PortIo, RegionArbiter, ReservedRegions};
use smbridge_core::smbus::{Functionality, Operation, Payload};
use smbridge_core::Result;

use crate::chipset::ControllerIdentity;
use crate::resolver::resolve_base;
use crate::transaction::{HostRegisters, TransactionReport};
use crate::transfer::transfer;

/// Resolved controller location, fixed for the life of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    base: u16,
    identity: ControllerIdentity,
}

impl Context {
    /// SMBus register block base address
    pub fn base(&self) -> u16 {
        self.base
    }

    /// PCI identity the controller was created for
    pub fn identity(&self) -> ControllerIdentity {
        self.identity
    }
}

/// Adapter name as reported in logs and by the CLI
pub struct AdapterName(u16);

impl fmt::Display for AdapterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SMBus PIIX4 adapter at {:04x}", self.0)
    }
}

/// SB800-family SMBus host controller
///
/// Owns its port backend. Transactions take `&mut self`, so one controller
/// never has two transactions in flight.
pub struct Piix4Controller<P: PortIo> {
    io: P,
    ctx: Context,
    last_report: Option<TransactionReport>,
}

impl<P: PortIo> Piix4Controller<P> {
    /// Locate the controller for `identity` and take ownership of `io`
    ///
    /// `arbiter` guards the PM index pair during discovery only; it is not
    /// retained.
    pub fn create<A, R>(
        mut io: P,
        arbiter: &A,
        reservations: &R,
        identity: ControllerIdentity,
    ) -> Result<Self>
    where
        A: RegionArbiter + ?Sized,
        R: ReservedRegions + ?Sized,
    {
        let base = resolve_base(&mut io, arbiter, reservations, &identity)?;
        let ctrl = Self {
            io,
            ctx: Context { base, identity },
            last_report: None,
        };
        log::info!("Created SMBus adapter '{}' for {}", ctrl.name(), identity);
        Ok(ctrl)
    }

    /// Release the controller, handing back the port backend
    pub fn destroy(self) -> P {
        log::debug!("Releasing SMBus adapter '{}'", self.name());
        self.io
    }

    /// Adapter name
    pub fn name(&self) -> AdapterName {
        AdapterName(self.ctx.base)
    }

    /// Resolved location
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Engine report of the most recent started transaction
    pub fn last_report(&self) -> Option<&TransactionReport> {
        self.last_report.as_ref()
    }

    /// Mutable access to the port backend
    pub fn io_mut(&mut self) -> &mut P {
        &mut self.io
    }
}

impl<P: PortIo> SmbusMaster for Piix4Controller<P> {
    fn functionality(&self) -> Functionality {
        crate::capabilities()
    }

    fn execute(&mut self, op: &Operation) -> Result<Option<Payload>> {
        self.last_report = None;
        let mut regs = HostRegisters::new(&mut self.io, self.ctx.base);
        transfer(&mut regs, op, &mut self.last_report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smbridge_core::platform::{NoReservations, RegionTable};
    use smbridge_core::smbus::{Direction, SlaveAddress};
    use smbridge_core::Error;
    use smbridge_dummy::{Piix4Emulator, DEFAULT_BASE, DEFAULT_DEVICE};

    const KERNCZ: ControllerIdentity = ControllerIdentity::new(0x1022, 0x790b, 0x61);

    fn controller() -> Piix4Controller<Piix4Emulator> {
        let table = RegionTable::new();
        Piix4Controller::create(Piix4Emulator::new(), &table, &NoReservations, KERNCZ).unwrap()
    }

    fn dev() -> SlaveAddress {
        SlaveAddress::new(DEFAULT_DEVICE).unwrap()
    }

    #[test]
    fn test_create_and_name() {
        let ctrl = controller();
        assert_eq!(ctrl.context().base(), DEFAULT_BASE);
        assert_eq!(ctrl.context().identity(), KERNCZ);
        assert_eq!(ctrl.name().to_string(), "SMBus PIIX4 adapter at 0b20");
    }

    #[test]
    fn test_create_fails_when_disabled() {
        let table = RegionTable::new();
        let mut emu = Piix4Emulator::new();
        emu.set_pm(0x00, 0x00);
        let result = Piix4Controller::create(emu, &table, &NoReservations, KERNCZ);
        assert!(matches!(result, Err(Error::ControllerDisabled)));
    }

    #[test]
    fn test_helpers_through_master() {
        let mut ctrl = controller();
        ctrl.quick(dev(), Direction::Write).unwrap();
        ctrl.write_byte_data(dev(), 0x05, 0x99).unwrap();
        assert_eq!(ctrl.read_byte_data(dev(), 0x05), Ok(0x99));

        ctrl.write_word_data(dev(), 0x40, 0x1234).unwrap();
        assert_eq!(ctrl.read_word_data(dev(), 0x40), Ok(0x1234));
        assert_eq!(ctrl.read_word_swapped(dev(), 0x40), Ok(0x3412));

        ctrl.write_block_data(dev(), 0x60, b"smbus").unwrap();
        let block = ctrl.read_block_data(dev(), 0x60).unwrap();
        assert_eq!(block.as_slice(), b"smbus");
    }

    #[test]
    fn test_residual_does_not_fail_execute() {
        let mut ctrl = controller();
        ctrl.io_mut().set_residual_status(0x40);

        assert_eq!(ctrl.write_byte_data(dev(), 0x01, 0x02), Ok(()));
        let report = ctrl.last_report().unwrap();
        assert!(report.residual.is_some());
    }

    #[test]
    fn test_errors_map_to_kinds() {
        let mut ctrl = controller();
        let absent = SlaveAddress::new(0x2a).unwrap();
        assert_eq!(ctrl.read_byte(absent), Err(Error::DeviceNotFound));

        ctrl.io_mut().hang();
        assert_eq!(ctrl.read_byte(dev()), Err(Error::Timeout));
    }

    #[test]
    fn test_functionality_is_fixed() {
        let ctrl = controller();
        assert_eq!(ctrl.functionality(), crate::capabilities());
    }

    #[test]
    fn test_destroy_returns_backend() {
        let mut ctrl = controller();
        ctrl.write_byte_data(dev(), 0x07, 0x42).unwrap();

        let emu = ctrl.destroy();
        assert_eq!(emu.device(DEFAULT_DEVICE).unwrap().register(0x07), 0x42);
    }
}
