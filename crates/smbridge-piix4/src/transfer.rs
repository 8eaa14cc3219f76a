//! Transfer orchestration
//!
//! Maps an [`Operation`] onto the host registers, runs the transaction
//! engine and collects the read result. Every check that can fail on the
//! caller's input runs before the first port access.

use smbridge_core::platform::PortIo;
use smbridge_core::smbus::{Direction, Operation, OperationKind, Payload, BLOCK_MAX};
use smbridge_core::{Error, Result};

use crate::regs::{
    HostControl, Register, PIIX4_BLOCK_DATA, PIIX4_BYTE, PIIX4_BYTE_DATA, PIIX4_QUICK,
    PIIX4_WORD_DATA,
};
use crate::transaction::{run_transaction, HostRegisters, TransactionReport};

/// SMBHSTCNT size code per [`OperationKind`], `None` where unsupported
const SIZE_CODES: [Option<u8>; OperationKind::COUNT] = [
    Some(PIIX4_QUICK),      // Quick
    Some(PIIX4_BYTE),       // Byte
    Some(PIIX4_BYTE_DATA),  // ByteData
    Some(PIIX4_WORD_DATA),  // WordData
    None,                   // ProcessCall
    Some(PIIX4_BLOCK_DATA), // BlockData
    None,                   // BlockProcessCall
    None,                   // I2cBlockData
];

/// Size code for `kind`, or [`Error::Unsupported`]
pub fn size_code(kind: OperationKind) -> Result<u8> {
    SIZE_CODES[kind.index()].ok_or_else(|| {
        log::warn!("Unsupported transaction {}", kind);
        Error::Unsupported
    })
}

/// Data to program for a write, already checked against the kind
#[derive(Clone, Copy)]
enum Outbound<'a> {
    None,
    Byte(u8),
    Word(u16),
    Block(&'a [u8]),
}

fn outbound(op: &Operation) -> Result<Outbound<'_>> {
    if op.direction == Direction::Read {
        return Ok(Outbound::None);
    }

    match (op.kind, &op.payload) {
        (OperationKind::Quick, _) => Ok(Outbound::None),
        (OperationKind::Byte | OperationKind::ByteData, Payload::Byte(b)) => Ok(Outbound::Byte(*b)),
        (OperationKind::WordData, Payload::Word(w)) => Ok(Outbound::Word(*w)),
        (OperationKind::BlockData, Payload::Block(block)) => {
            if block.is_empty() || block.len() > BLOCK_MAX {
                return Err(Error::InvalidArgument);
            }
            Ok(Outbound::Block(block.as_slice()))
        }
        (kind, payload) => {
            log::debug!("{} write cannot carry {:?}", kind, payload);
            Err(Error::InvalidArgument)
        }
    }
}

/// Program everything except the start bit
fn program<P: PortIo + ?Sized>(
    regs: &mut HostRegisters<'_, P>,
    op: &Operation,
    size: u8,
    data: Outbound<'_>,
) {
    regs.write(Register::Address, op.address.wire_byte(op.direction));

    match data {
        // Send byte: the controller takes the data from the command register
        Outbound::Byte(b) if op.kind == OperationKind::Byte => regs.write(Register::Command, b),
        _ if op.kind.has_command() => regs.write(Register::Command, op.command),
        _ => {}
    }

    match data {
        Outbound::Byte(b) if op.kind == OperationKind::ByteData => regs.write(Register::Data0, b),
        Outbound::Word(w) => {
            let [lo, hi] = w.to_le_bytes();
            regs.write(Register::Data0, lo);
            regs.write(Register::Data1, hi);
        }
        Outbound::Block(block) => {
            // Length is at most BLOCK_MAX, checked in outbound()
            regs.write(Register::Data0, block.len() as u8);
            regs.reset_block_pointer();
            for &b in block {
                regs.write(Register::BlockData, b);
            }
        }
        _ => {}
    }

    regs.write(Register::Control, HostControl::for_size(size).bits());
}

/// Collect the result of a successful read
fn read_back<P: PortIo + ?Sized>(
    regs: &mut HostRegisters<'_, P>,
    kind: OperationKind,
) -> Result<Payload> {
    match kind {
        OperationKind::WordData => {
            let lo = regs.read(Register::Data0);
            let hi = regs.read(Register::Data1);
            Ok(Payload::Word(u16::from_le_bytes([lo, hi])))
        }
        OperationKind::BlockData => {
            let len = regs.read(Register::Data0) as usize;
            if len == 0 || len > BLOCK_MAX {
                log::debug!("Device reported invalid block length {}", len);
                return Err(Error::ProtocolError);
            }
            regs.reset_block_pointer();
            let mut buf = [0u8; BLOCK_MAX];
            for byte in &mut buf[..len] {
                *byte = regs.read(Register::BlockData);
            }
            Payload::block(&buf[..len])
        }
        _ => Ok(Payload::Byte(regs.read(Register::Data0))),
    }
}

/// Run `op` on the register block
///
/// The engine's report is stored in `report` whenever a transaction was
/// started, including failed ones.
pub fn transfer<P: PortIo + ?Sized>(
    regs: &mut HostRegisters<'_, P>,
    op: &Operation,
    report: &mut Option<TransactionReport>,
) -> Result<Option<Payload>> {
    let size = size_code(op.kind)?;
    let data = outbound(op)?;

    program(regs, op, size, data);

    let outcome = run_transaction(regs)?;
    *report = Some(outcome);
    outcome.result()?;

    if op.direction == Direction::Write || op.kind == OperationKind::Quick {
        return Ok(None);
    }

    read_back(regs, op.kind).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use smbridge_core::smbus::{BlockBuf, SlaveAddress};
    use smbridge_dummy::{Access, Piix4Emulator, PortRecorder, DEFAULT_BASE, DEFAULT_DEVICE};

    const CNT: u16 = DEFAULT_BASE + 2;
    const CMD: u16 = DEFAULT_BASE + 3;
    const ADD: u16 = DEFAULT_BASE + 4;
    const DAT0: u16 = DEFAULT_BASE + 5;
    const DAT1: u16 = DEFAULT_BASE + 6;
    const BLK: u16 = DEFAULT_BASE + 7;

    fn dev() -> SlaveAddress {
        SlaveAddress::new(DEFAULT_DEVICE).unwrap()
    }

    fn run<P: PortIo>(io: &mut P, op: &Operation) -> Result<Option<Payload>> {
        let mut report = None;
        transfer(&mut HostRegisters::new(io, DEFAULT_BASE), op, &mut report)
    }

    fn writes(rec: &PortRecorder<Piix4Emulator>) -> Vec<(u16, u8)> {
        rec.accesses()
            .iter()
            .filter_map(|a| match *a {
                Access::Write(port, value) => Some((port, value)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_size_table() {
        assert_eq!(size_code(OperationKind::Quick), Ok(0x00));
        assert_eq!(size_code(OperationKind::Byte), Ok(0x04));
        assert_eq!(size_code(OperationKind::ByteData), Ok(0x08));
        assert_eq!(size_code(OperationKind::WordData), Ok(0x0c));
        assert_eq!(size_code(OperationKind::BlockData), Ok(0x14));
        assert_eq!(size_code(OperationKind::ProcessCall), Err(Error::Unsupported));
        assert_eq!(size_code(OperationKind::I2cBlockData), Err(Error::Unsupported));
    }

    #[test]
    fn test_quick_touches_no_data_registers() {
        let mut rec = PortRecorder::new(Piix4Emulator::new());
        run(&mut rec, &Operation::quick(dev(), Direction::Write)).unwrap();

        let written: Vec<u16> = writes(&rec).iter().map(|(port, _)| *port).collect();
        assert!(written.contains(&ADD));
        assert!(written.contains(&CNT));
        assert!(!written.contains(&CMD));
        assert!(!written.contains(&DAT0));
        assert!(!written.contains(&DAT1));
        assert!(!written.contains(&BLK));
    }

    #[test]
    fn test_program_sequence_for_byte_data_write() {
        let mut rec = PortRecorder::new(Piix4Emulator::new());
        run(&mut rec, &Operation::write_byte_data(dev(), 0x21, 0x5a)).unwrap();

        let written = writes(&rec);
        assert_eq!(
            &written[..4],
            &[(ADD, 0xa0), (CMD, 0x21), (DAT0, 0x5a), (CNT, 0x08)]
        );
        assert_eq!(written[4], (CNT, 0x48));
    }

    #[test]
    fn test_send_byte_uses_command_register() {
        // Intended hardware behaviour: send-byte data goes out via SMBHSTCMD
        let mut rec = PortRecorder::new(Piix4Emulator::new());
        run(&mut rec, &Operation::write_byte(dev(), 0x7e)).unwrap();

        let written = writes(&rec);
        assert!(written.contains(&(CMD, 0x7e)));
        assert!(!written.iter().any(|(port, _)| *port == DAT0));
        assert_eq!(rec.inner().device(DEFAULT_DEVICE).unwrap().last_sent(), Some(0x7e));
    }

    #[test]
    fn test_receive_byte_leaves_command_register_alone() {
        let mut rec = PortRecorder::new(Piix4Emulator::new());
        rec.inner_mut()
            .device_mut(DEFAULT_DEVICE)
            .unwrap()
            .set_register(0, 0x3c);
        let byte = run(&mut rec, &Operation::read_byte(dev())).unwrap();
        assert_eq!(byte, Some(Payload::Byte(0x3c)));

        let written = writes(&rec);
        assert!(!written.iter().any(|(port, _)| *port == CMD));
        assert!(written.contains(&(ADD, 0xa1)));
    }

    #[test]
    fn test_word_round_trip() {
        let mut rec = PortRecorder::new(Piix4Emulator::new());
        run(&mut rec, &Operation::write_word_data(dev(), 0x10, 0xabcd)).unwrap();

        let written = writes(&rec);
        assert!(written.contains(&(DAT0, 0xcd)));
        assert!(written.contains(&(DAT1, 0xab)));

        let word = run(&mut rec, &Operation::read_word_data(dev(), 0x10)).unwrap();
        assert_eq!(word, Some(Payload::Word(0xabcd)));
    }

    #[test]
    fn test_block_round_trip() {
        let mut emu = Piix4Emulator::new();
        let op = Operation::write_block_data(dev(), 0x30, &[0x01, 0x02, 0x03]).unwrap();
        assert_eq!(run(&mut emu, &op), Ok(None));

        let block = run(&mut emu, &Operation::read_block_data(dev(), 0x30)).unwrap();
        assert_eq!(block, Some(Payload::block(&[0x01, 0x02, 0x03]).unwrap()));
    }

    #[test]
    fn test_full_size_block_round_trip() {
        let data: Vec<u8> = (0..BLOCK_MAX as u8).collect();
        let mut emu = Piix4Emulator::new();
        let op = Operation::write_block_data(dev(), 0x31, &data).unwrap();
        assert_eq!(run(&mut emu, &op), Ok(None));
        assert_eq!(
            emu.device(DEFAULT_DEVICE).unwrap().block(0x31),
            Some(&data[..])
        );

        let block = run(&mut emu, &Operation::read_block_data(dev(), 0x31)).unwrap();
        match block {
            Some(Payload::Block(buf)) => {
                assert_eq!(buf.len(), BLOCK_MAX);
                assert_eq!(buf.as_slice(), &data[..]);
            }
            other => panic!("expected a block, got {:?}", other),
        }
    }

    #[test]
    fn test_block_write_resets_pointer_before_streaming() {
        let mut rec = PortRecorder::new(Piix4Emulator::new());
        let op = Operation::write_block_data(dev(), 0x30, &[0xaa, 0xbb]).unwrap();
        run(&mut rec, &op).unwrap();

        let acc = rec.accesses();
        let len_at = acc.iter().position(|a| *a == Access::Write(DAT0, 2)).unwrap();
        assert!(matches!(acc[len_at + 1], Access::Read(CNT, _)));
        assert_eq!(acc[len_at + 2], Access::Write(BLK, 0xaa));
        assert_eq!(acc[len_at + 3], Access::Write(BLK, 0xbb));
    }

    #[test]
    fn test_invalid_block_write_touches_nothing() {
        let mut rec = PortRecorder::new(Piix4Emulator::new());
        let empty = Operation::new(
            OperationKind::BlockData,
            Direction::Write,
            dev(),
            0,
            Payload::Block(BlockBuf::new()),
        );
        assert_eq!(run(&mut rec, &empty), Err(Error::InvalidArgument));
        assert!(rec.accesses().is_empty());
    }

    #[test]
    fn test_mismatched_payload_touches_nothing() {
        let mut rec = PortRecorder::new(Piix4Emulator::new());
        let op = Operation::new(
            OperationKind::ByteData,
            Direction::Write,
            dev(),
            0,
            Payload::Word(1),
        );
        assert_eq!(run(&mut rec, &op), Err(Error::InvalidArgument));
        assert!(rec.accesses().is_empty());
    }

    #[test]
    fn test_unsupported_kind_touches_nothing() {
        let mut rec = PortRecorder::new(Piix4Emulator::new());
        let op = Operation::new(
            OperationKind::ProcessCall,
            Direction::Write,
            dev(),
            0,
            Payload::Word(1),
        );
        assert_eq!(run(&mut rec, &op), Err(Error::Unsupported));
        assert!(rec.accesses().is_empty());
    }

    #[test]
    fn test_bad_block_length_from_device() {
        for len in [0u8, 33] {
            let mut emu = Piix4Emulator::new();
            emu.device_mut(DEFAULT_DEVICE)
                .unwrap()
                .set_reported_block_len(0x30, len);
            let result = run(&mut emu, &Operation::read_block_data(dev(), 0x30));
            assert_eq!(result, Err(Error::ProtocolError));
        }
    }

    #[test]
    fn test_failure_skips_readback() {
        let mut rec = PortRecorder::new(Piix4Emulator::new());
        let absent = SlaveAddress::new(0x11).unwrap();
        let result = run(&mut rec, &Operation::read_word_data(absent, 0));
        assert_eq!(result, Err(Error::DeviceNotFound));

        // Nothing read from the data registers after the failed transaction
        assert!(!rec
            .accesses()
            .iter()
            .any(|a| matches!(a, Access::Read(DAT0 | DAT1, _))));
    }

    #[test]
    fn test_report_kept_on_failure() {
        let mut emu = Piix4Emulator::new();
        emu.force_status(0x12);
        let mut report = None;
        let result = transfer(
            &mut HostRegisters::new(&mut emu, DEFAULT_BASE),
            &Operation::read_byte(dev()),
            &mut report,
        );
        assert_eq!(result, Err(Error::IoError));
        assert_eq!(report.unwrap().last_status.bits(), 0x12);
    }
}
