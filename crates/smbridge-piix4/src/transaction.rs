//! Host transaction engine
//!
//! Runs one armed transaction to completion: clear stale status, set the
//! start bit, poll the busy flag under an iteration cap, classify the final
//! status byte and clear it again.

use core::fmt;

use smbridge_core::platform::PortIo;
use smbridge_core::{Error, Result};

use crate::regs::{HostControl, HostStatus, Register, MAX_TIMEOUT, POLL_DELAY_US};

/// Port accessor for one controller's register block
pub struct HostRegisters<'a, P: PortIo + ?Sized> {
    io: &'a mut P,
    base: u16,
}

impl<'a, P: PortIo + ?Sized> HostRegisters<'a, P> {
    /// Access the register block at `base`
    pub fn new(io: &'a mut P, base: u16) -> Self {
        Self { io, base }
    }

    /// Read a register
    #[inline]
    pub fn read(&mut self, reg: Register) -> u8 {
        self.io.read_u8(reg.port(self.base))
    }

    /// Write a register
    #[inline]
    pub fn write(&mut self, reg: Register, value: u8) {
        self.io.write_u8(reg.port(self.base), value)
    }

    /// Read the status register
    pub fn status(&mut self) -> HostStatus {
        HostStatus::from_bits_retain(self.read(Register::Status))
    }

    /// Read-and-discard of the control register, rewinding the block FIFO
    pub fn reset_block_pointer(&mut self) {
        let _ = self.read(Register::Control);
    }

    fn delay(&mut self) {
        self.io.delay_us(POLL_DELAY_US);
    }
}

/// Classified end state of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Transaction completed without error bits
    Success,
    /// Busy flag still set after the poll cap
    Timeout,
    /// Failed bus transaction
    Failed,
    /// Bus collision; the bus may stay wedged until a hard reset
    BusCollision,
    /// Slave did not acknowledge
    NoResponse,
}

impl Completion {
    /// Classify the last status byte
    ///
    /// Error bits take precedence over the timeout: failed transaction,
    /// then bus collision, then no response.
    pub fn decode(status: HostStatus, timed_out: bool) -> Self {
        if status.contains(HostStatus::FAILED) {
            Self::Failed
        } else if status.contains(HostStatus::BUS_ERR) {
            Self::BusCollision
        } else if status.contains(HostStatus::DEV_ERR) {
            Self::NoResponse
        } else if timed_out {
            Self::Timeout
        } else {
            Self::Success
        }
    }

    /// The error to report for this completion, if any
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Success => Ok(()),
            Self::Timeout => Err(Error::Timeout),
            Self::Failed | Self::BusCollision => Err(Error::IoError),
            Self::NoResponse => Err(Error::DeviceNotFound),
        }
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Timeout => write!(f, "timeout"),
            Self::Failed => write!(f, "failed bus transaction"),
            Self::BusCollision => write!(f, "bus collision"),
            Self::NoResponse => write!(f, "no response"),
        }
    }
}

/// What one engine run observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionReport {
    /// Classified result
    pub status: Completion,
    /// Last status byte read while polling
    pub last_status: HostStatus,
    /// Number of status reads in the poll loop
    pub polls: u32,
    /// Status left over after the end-of-transaction clear
    pub residual: Option<HostStatus>,
}

impl TransactionReport {
    /// The result the caller of `execute` sees; `residual` never affects it
    pub fn result(&self) -> Result<()> {
        self.status.into_result()
    }
}

/// Bring a dirty status register back to zero before arming
fn clear_stale_status<P: PortIo + ?Sized>(regs: &mut HostRegisters<'_, P>) -> Result<()> {
    let status = regs.read(Register::Status);
    if status == 0 {
        return Ok(());
    }

    log::debug!("SMBus busy ({:02x}). Resetting...", status);
    regs.write(Register::Status, status);

    let status = regs.read(Register::Status);
    if status != 0 {
        log::error!("Failed! ({:02x})", status);
        return Err(Error::ControllerStuck);
    }

    log::debug!("Successful!");
    Ok(())
}

/// Run the transaction already programmed into the register block
///
/// Only [`Error::ControllerStuck`] is returned as an error here: the
/// transaction outcome itself is carried in the report so residual status
/// can be inspected.
pub fn run_transaction<P: PortIo + ?Sized>(
    regs: &mut HostRegisters<'_, P>,
) -> Result<TransactionReport> {
    clear_stale_status(regs)?;

    let control = HostControl::from_bits_retain(regs.read(Register::Control));
    regs.write(Register::Control, (control | HostControl::START).bits());

    // Controller needs time before the busy flag is meaningful
    regs.delay();

    let mut polls = 0;
    let last_status = loop {
        let status = regs.status();
        polls += 1;
        if !status.contains(HostStatus::HOST_BUSY) || polls >= MAX_TIMEOUT {
            break status;
        }
        regs.delay();
    };

    let timed_out = last_status.contains(HostStatus::HOST_BUSY);
    let status = Completion::decode(last_status, timed_out);
    match status {
        Completion::Success => {}
        Completion::Timeout => log::error!("SMBus Timeout!"),
        Completion::Failed => log::error!("Error: Failed bus transaction"),
        Completion::BusCollision => {
            log::debug!("Bus collision! SMBus may be locked until next hard reset")
        }
        Completion::NoResponse => log::debug!("Error: no response!"),
    }

    let leftover = regs.read(Register::Status);
    if leftover != 0 {
        regs.write(Register::Status, leftover);
    }
    let residual = match regs.status() {
        s if s.is_empty() => None,
        s => {
            log::error!("Failed reset at end of transaction ({:02x})", s.bits());
            Some(s)
        }
    };

    Ok(TransactionReport {
        status,
        last_status,
        polls,
        residual,
    })
}
