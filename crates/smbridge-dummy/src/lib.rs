//! smbridge-dummy - SB800 SMBus controller emulator for testing
//!
//! This crate provides a register-level model of the PIIX4-compatible SMBus
//! host controller, reachable through the [`PortIo`] trait exactly like the
//! real hardware: the PM index/data pair at 0xCD6/0xCD7 and the
//! host register block. Simple memory-like devices sit on the emulated bus.
//!
//! [`PortRecorder`] wraps any backend and logs every access so tests can
//! assert on the exact port sequence a driver produces.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use smbridge_core::platform::PortIo;

/// PM index register
pub const PM_INDEX: u16 = 0x0cd6;
/// PM data register
pub const PM_DATA: u16 = 0x0cd7;

/// SMBus base address the default PM contents decode to
pub const DEFAULT_BASE: u16 = 0x0b20;
/// Address of the device present on a fresh emulator
pub const DEFAULT_DEVICE: u8 = 0x50;

const STS_BUSY: u8 = 0x01;
const STS_INTR: u8 = 0x02;
const STS_DEV_ERR: u8 = 0x04;
const STS_FAILED: u8 = 0x10;

const CNT_START: u8 = 0x40;
const CNT_SIZE: u8 = 0x1c;

const FIFO_LEN: usize = 32;

/// A memory-like SMBus slave
///
/// Byte and word accesses hit a 256-byte register file. Block accesses use
/// a separate store keyed by command code. Send-byte sets the register
/// pointer used by receive-byte.
#[derive(Debug, Clone)]
pub struct SmbusDevice {
    regs: [u8; 256],
    blocks: BTreeMap<u8, Vec<u8>>,
    reported_len: BTreeMap<u8, u8>,
    pointer: u8,
    last_sent: Option<u8>,
}

impl Default for SmbusDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SmbusDevice {
    /// Create a device with all registers zero
    pub fn new() -> Self {
        Self {
            regs: [0; 256],
            blocks: BTreeMap::new(),
            reported_len: BTreeMap::new(),
            pointer: 0,
            last_sent: None,
        }
    }

    /// Register contents
    pub fn register(&self, cmd: u8) -> u8 {
        self.regs[cmd as usize]
    }

    /// Set a register
    pub fn set_register(&mut self, cmd: u8, value: u8) {
        self.regs[cmd as usize] = value;
    }

    /// Block stored at `cmd`
    pub fn block(&self, cmd: u8) -> Option<&[u8]> {
        self.blocks.get(&cmd).map(Vec::as_slice)
    }

    /// Store a block at `cmd`
    pub fn set_block(&mut self, cmd: u8, data: &[u8]) {
        self.blocks.insert(cmd, data.to_vec());
    }

    /// Report `len` as the block length for reads at `cmd`, whatever is stored
    pub fn set_reported_block_len(&mut self, cmd: u8, len: u8) {
        self.reported_len.insert(cmd, len);
    }

    /// Last byte received through send-byte
    pub fn last_sent(&self) -> Option<u8> {
        self.last_sent
    }
}

/// Emulated SB800 SMBus controller
#[derive(Debug, Clone)]
pub struct Piix4Emulator {
    pm: [u8; 256],
    pm_index: u8,
    base: u16,

    status: u8,
    control: u8,
    command: u8,
    address: u8,
    data0: u8,
    data1: u8,
    fifo: [u8; FIFO_LEN],
    fifo_pos: usize,

    devices: BTreeMap<u8, SmbusDevice>,

    running: bool,
    busy_polls: u32,
    busy_remaining: u32,
    hung: bool,
    forced_status: Option<u8>,
    sticky: u8,
    residual: u8,

    transactions: u32,
    delay_total_us: u64,
}

impl Default for Piix4Emulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Piix4Emulator {
    /// Create an emulator with SMBus enabled at [`DEFAULT_BASE`] in both PM
    /// layouts and one device at [`DEFAULT_DEVICE`]
    pub fn new() -> Self {
        let mut pm = [0u8; 256];
        // New layout: enable bit 4, base high byte
        pm[0x00] = 0x10;
        pm[0x01] = (DEFAULT_BASE >> 8) as u8;
        // Legacy layout: enable bit 0, base 0x0b20
        pm[0x28] = (DEFAULT_BASE as u8) | 0x01;
        pm[0x29] = (DEFAULT_BASE >> 8) as u8;

        let mut devices = BTreeMap::new();
        devices.insert(DEFAULT_DEVICE, SmbusDevice::new());

        Self {
            pm,
            pm_index: 0,
            base: DEFAULT_BASE,
            status: 0,
            control: 0,
            command: 0,
            address: 0,
            data0: 0,
            data1: 0,
            fifo: [0; FIFO_LEN],
            fifo_pos: 0,
            devices,
            running: false,
            busy_polls: 0,
            busy_remaining: 0,
            hung: false,
            forced_status: None,
            sticky: 0,
            residual: 0,
            transactions: 0,
            delay_total_us: 0,
        }
    }

    /// Move the host register block; PM contents are left alone
    pub fn set_base(&mut self, base: u16) {
        self.base = base;
    }

    /// Host register block base
    pub fn base(&self) -> u16 {
        self.base
    }

    /// Set a PM register
    pub fn set_pm(&mut self, index: u8, value: u8) {
        self.pm[index as usize] = value;
    }

    /// Read a PM register without going through the index pair
    pub fn pm(&self, index: u8) -> u8 {
        self.pm[index as usize]
    }

    /// Attach a device at `addr`, replacing any existing one
    pub fn add_device(&mut self, addr: u8) -> &mut SmbusDevice {
        let dev = self.devices.entry(addr).or_default();
        *dev = SmbusDevice::new();
        dev
    }

    /// Detach the device at `addr`
    pub fn remove_device(&mut self, addr: u8) -> Option<SmbusDevice> {
        self.devices.remove(&addr)
    }

    /// Device at `addr`
    pub fn device(&self, addr: u8) -> Option<&SmbusDevice> {
        self.devices.get(&addr)
    }

    /// Mutable device at `addr`
    pub fn device_mut(&mut self, addr: u8) -> Option<&mut SmbusDevice> {
        self.devices.get_mut(&addr)
    }

    /// Keep the busy flag set for `polls` status reads after each start
    pub fn set_busy_polls(&mut self, polls: u32) {
        self.busy_polls = polls;
    }

    /// Never complete transactions
    pub fn hang(&mut self) {
        self.hung = true;
    }

    /// Complete every transaction with `status` instead of talking to the
    /// device; while hung, these bits show up next to the busy flag
    pub fn force_status(&mut self, status: u8) {
        self.forced_status = Some(status);
    }

    /// Leave bits in the status register that clear on write-back
    pub fn set_stale_status(&mut self, bits: u8) {
        self.status |= bits;
    }

    /// Leave bits in the status register that never clear
    pub fn set_stuck_status(&mut self, bits: u8) {
        self.status |= bits;
        self.sticky |= bits;
    }

    /// Status bits raised on every completion that survive the end clear
    pub fn set_residual_status(&mut self, bits: u8) {
        self.residual = bits;
    }

    /// Number of transactions started
    pub fn transactions(&self) -> u32 {
        self.transactions
    }

    /// Sum of all requested delays
    pub fn delay_total_us(&self) -> u64 {
        self.delay_total_us
    }

    fn start(&mut self) {
        self.running = true;
        self.busy_remaining = self.busy_polls;
        self.transactions += 1;
        log::trace!(
            "emu: start size={:#04x} addr={:#04x} cmd={:#04x}",
            self.control & CNT_SIZE,
            self.address,
            self.command
        );
    }

    fn complete(&mut self) {
        self.running = false;
        let result = match self.forced_status {
            Some(status) => status,
            None => self.perform(),
        };
        self.status |= result | self.residual;
        self.sticky |= self.residual;
    }

    /// Carry out the programmed transaction against the device model
    fn perform(&mut self) -> u8 {
        let addr = self.address >> 1;
        let read = self.address & 1 != 0;
        let cmd = self.command;

        let Some(dev) = self.devices.get_mut(&addr) else {
            return STS_DEV_ERR;
        };

        match self.control & CNT_SIZE {
            0x00 => {}
            0x04 if read => self.data0 = dev.regs[dev.pointer as usize],
            0x04 => {
                dev.last_sent = Some(cmd);
                dev.pointer = cmd;
            }
            0x08 if read => self.data0 = dev.regs[cmd as usize],
            0x08 => dev.regs[cmd as usize] = self.data0,
            0x0c if read => {
                self.data0 = dev.regs[cmd as usize];
                self.data1 = dev.regs[cmd.wrapping_add(1) as usize];
            }
            0x0c => {
                dev.regs[cmd as usize] = self.data0;
                dev.regs[cmd.wrapping_add(1) as usize] = self.data1;
            }
            0x14 if read => {
                let block = dev.blocks.get(&cmd).cloned().unwrap_or_default();
                let len = block.len().min(FIFO_LEN);
                self.fifo[..len].copy_from_slice(&block[..len]);
                self.fifo_pos = 0;
                self.data0 = dev.reported_len.get(&cmd).copied().unwrap_or(len as u8);
            }
            0x14 => {
                let len = (self.data0 as usize).min(FIFO_LEN);
                dev.blocks.insert(cmd, self.fifo[..len].to_vec());
            }
            _ => return STS_FAILED,
        }

        STS_INTR
    }

    fn read_status(&mut self) -> u8 {
        if self.running {
            if self.hung {
                return self.status | STS_BUSY | self.forced_status.unwrap_or(0);
            }
            if self.busy_remaining > 0 {
                self.busy_remaining -= 1;
                return self.status | STS_BUSY;
            }
            self.complete();
        }
        self.status
    }

    fn host_read(&mut self, offset: u16) -> u8 {
        match offset {
            0 => self.read_status(),
            2 => {
                // Reading the control register rewinds the block FIFO
                self.fifo_pos = 0;
                self.control
            }
            3 => self.command,
            4 => self.address,
            5 => self.data0,
            6 => self.data1,
            7 => {
                let value = self.fifo[self.fifo_pos % FIFO_LEN];
                self.fifo_pos += 1;
                value
            }
            _ => 0xff,
        }
    }

    fn host_write(&mut self, offset: u16, value: u8) {
        match offset {
            0 => self.status &= !(value & !self.sticky),
            2 => {
                self.control = value & !CNT_START;
                if value & CNT_START != 0 {
                    self.start();
                }
            }
            3 => self.command = value,
            4 => self.address = value,
            5 => self.data0 = value,
            6 => self.data1 = value,
            7 => {
                self.fifo[self.fifo_pos % FIFO_LEN] = value;
                self.fifo_pos += 1;
            }
            _ => {}
        }
    }

    fn host_offset(&self, port: u16) -> Option<u16> {
        port.checked_sub(self.base).filter(|offset| *offset < 8)
    }
}

impl PortIo for Piix4Emulator {
    fn read_u8(&mut self, port: u16) -> u8 {
        match port {
            PM_INDEX => self.pm_index,
            PM_DATA => self.pm[self.pm_index as usize],
            _ => match self.host_offset(port) {
                Some(offset) => self.host_read(offset),
                None => 0xff,
            },
        }
    }

    fn write_u8(&mut self, port: u16, value: u8) {
        match port {
            PM_INDEX => self.pm_index = value,
            PM_DATA => self.pm[self.pm_index as usize] = value,
            _ => {
                if let Some(offset) = self.host_offset(port) {
                    self.host_write(offset, value);
                }
            }
        }
    }

    fn delay_us(&mut self, us: u32) {
        self.delay_total_us += us as u64;
    }
}

/// One recorded port access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// `read_u8(port)` returned the value
    Read(u16, u8),
    /// `write_u8(port, value)`
    Write(u16, u8),
    /// `delay_us(us)`
    Delay(u32),
}

/// Port backend wrapper that records every access
#[derive(Debug, Clone, Default)]
pub struct PortRecorder<P> {
    inner: P,
    accesses: Vec<Access>,
}

impl<P: PortIo> PortRecorder<P> {
    /// Wrap `inner`
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            accesses: Vec::new(),
        }
    }

    /// Accesses so far, oldest first
    pub fn accesses(&self) -> &[Access] {
        &self.accesses
    }

    /// Forget recorded accesses
    pub fn clear(&mut self) {
        self.accesses.clear();
    }

    /// Number of writes to `port`
    pub fn writes_to(&self, port: u16) -> usize {
        self.accesses
            .iter()
            .filter(|a| matches!(a, Access::Write(p, _) if *p == port))
            .count()
    }

    /// The wrapped backend
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// The wrapped backend, mutably; accesses through it are not recorded
    pub fn inner_mut(&mut self) -> &mut P {
        &mut self.inner
    }

    /// Unwrap the backend
    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: PortIo> PortIo for PortRecorder<P> {
    fn read_u8(&mut self, port: u16) -> u8 {
        let value = self.inner.read_u8(port);
        self.accesses.push(Access::Read(port, value));
        value
    }

    fn write_u8(&mut self, port: u16, value: u8) {
        self.inner.write_u8(port, value);
        self.accesses.push(Access::Write(port, value));
    }

    fn delay_us(&mut self, us: u32) {
        self.inner.delay_us(us);
        self.accesses.push(Access::Delay(us));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STS: u16 = DEFAULT_BASE;
    const CNT: u16 = DEFAULT_BASE + 2;
    const CMD: u16 = DEFAULT_BASE + 3;
    const ADD: u16 = DEFAULT_BASE + 4;
    const DAT0: u16 = DEFAULT_BASE + 5;

    #[test]
    fn test_pm_index_pair() {
        let mut emu = Piix4Emulator::new();
        emu.write_u8(PM_INDEX, 0x29);
        assert_eq!(emu.read_u8(PM_DATA), 0x0b);
        emu.write_u8(PM_DATA, 0x0c);
        assert_eq!(emu.pm(0x29), 0x0c);
    }

    #[test]
    fn test_byte_data_cycle() {
        let mut emu = Piix4Emulator::new();
        emu.write_u8(ADD, DEFAULT_DEVICE << 1);
        emu.write_u8(CMD, 0x12);
        emu.write_u8(DAT0, 0x34);
        emu.write_u8(CNT, 0x08 | CNT_START);

        assert_eq!(emu.read_u8(STS), STS_INTR);
        assert_eq!(emu.device(DEFAULT_DEVICE).unwrap().register(0x12), 0x34);

        emu.write_u8(STS, STS_INTR);
        assert_eq!(emu.read_u8(STS), 0);
        // Start bit self-clears
        assert_eq!(emu.read_u8(CNT), 0x08);
    }

    #[test]
    fn test_absent_device() {
        let mut emu = Piix4Emulator::new();
        emu.write_u8(ADD, 0x10 << 1);
        emu.write_u8(CNT, CNT_START);
        assert_eq!(emu.read_u8(STS), STS_DEV_ERR);
    }

    #[test]
    fn test_busy_polls_and_hang() {
        let mut emu = Piix4Emulator::new();
        emu.set_busy_polls(2);
        emu.write_u8(ADD, DEFAULT_DEVICE << 1);
        emu.write_u8(CNT, CNT_START);
        assert_eq!(emu.read_u8(STS), STS_BUSY);
        assert_eq!(emu.read_u8(STS), STS_BUSY);
        assert_eq!(emu.read_u8(STS), STS_INTR);

        emu.write_u8(STS, 0xff);
        emu.hang();
        emu.write_u8(CNT, CNT_START);
        for _ in 0..10 {
            assert_eq!(emu.read_u8(STS), STS_BUSY);
        }
        assert_eq!(emu.transactions(), 2);
    }

    #[test]
    fn test_sticky_bits() {
        let mut emu = Piix4Emulator::new();
        emu.set_stale_status(0x02);
        emu.set_stuck_status(0x08);
        emu.write_u8(STS, 0xff);
        assert_eq!(emu.read_u8(STS), 0x08);
    }

    #[test]
    fn test_recorder() {
        let mut rec = PortRecorder::new(Piix4Emulator::new());
        rec.write_u8(PM_INDEX, 0x00);
        let lo = rec.read_u8(PM_DATA);
        rec.delay_us(25);

        assert_eq!(
            rec.accesses(),
            &[
                Access::Write(PM_INDEX, 0x00),
                Access::Read(PM_DATA, lo),
                Access::Delay(25),
            ]
        );
        assert_eq!(rec.writes_to(PM_INDEX), 1);
        assert_eq!(rec.into_inner().delay_total_us(), 25);
    }

    #[test]
    fn test_unmapped_ports_float() {
        let mut emu = Piix4Emulator::new();
        assert_eq!(emu.read_u8(0x80), 0xff);
        assert_eq!(emu.read_u8(DEFAULT_BASE + 8), 0xff);
    }
}
