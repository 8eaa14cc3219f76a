//! SB800/PIIX4 SMBus host register definitions
//!
//! Register offsets are relative to the SMBus base address discovered by
//! the resolver. All registers are 8 bits wide.
//!
//! ```text
//! +0  SMBHSTSTS   host status (write 1 to clear)
//! +2  SMBHSTCNT   host control (size, start, interrupt enable)
//! +3  SMBHSTCMD   command code
//! +4  SMBHSTADD   slave address and R/W bit
//! +5  SMBHSTDAT0  data 0 / block length
//! +6  SMBHSTDAT1  data 1
//! +7  SMBBLKDAT   block data FIFO
//! ```

use bitflags::bitflags;

// ============================================================================
// Index/data pair (power management space)
// ============================================================================

/// PM index register; the data register follows at `+1`
pub const SB800_PIIX4_SMB_IDX: u16 = 0x0cd6;
/// Number of ports in the index/data pair
pub const SB800_PIIX4_SMB_IDX_LEN: u16 = 2;
/// Claim tag for the index/data pair, shared with other SB800 drivers
pub const SB800_PIIX4_MUXED_NAME: &str = "sb800_piix4_smb";

/// PM enable selector used by KERNCZ revision 0x49 and later
pub const SMB_EN_NEW: u8 = 0x00;
/// PM enable selector used by older SB800 parts
pub const SMB_EN_LEGACY: u8 = 0x28;

/// SMBus enable bit in the low byte, new scheme
pub const SMB_EN_NEW_ENABLE: u8 = 0x10;
/// SMBus enable bit in the low byte, legacy scheme
pub const SMB_EN_LEGACY_ENABLE: u8 = 0x01;
/// Fixed low byte of the base address, new scheme
pub const SMB_NEW_BASE_LO: u16 = 0x20;
/// Base address mask, legacy scheme
pub const SMB_LEGACY_BASE_MASK: u16 = 0xffe0;

// ============================================================================
// Host register block
// ============================================================================

/// Number of ports checked against firmware reservations
pub const SMBIOSIZE: u16 = 7;
/// Tag used for the firmware reservation check
pub const SMBUS_REGION_NAME: &str = "piix4_smbus";

/// Host status register
pub const SMBHSTSTS: u16 = 0;
/// Host control register
pub const SMBHSTCNT: u16 = 2;
/// Host command register
pub const SMBHSTCMD: u16 = 3;
/// Host address register
pub const SMBHSTADD: u16 = 4;
/// Host data 0 register
pub const SMBHSTDAT0: u16 = 5;
/// Host data 1 register
pub const SMBHSTDAT1: u16 = 6;
/// Block data register
pub const SMBBLKDAT: u16 = 7;

// SMBHSTCNT size field
/// Quick command
pub const PIIX4_QUICK: u8 = 0x00;
/// Send/receive byte
pub const PIIX4_BYTE: u8 = 0x04;
/// Byte data
pub const PIIX4_BYTE_DATA: u8 = 0x08;
/// Word data
pub const PIIX4_WORD_DATA: u8 = 0x0c;
/// Block data
pub const PIIX4_BLOCK_DATA: u8 = 0x14;

/// Maximum number of status polls per transaction
pub const MAX_TIMEOUT: u32 = 500;
/// Delay before the first poll and between polls, in microseconds
pub const POLL_DELAY_US: u32 = 25;

/// Logical register of the host block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// SMBHSTSTS
    Status,
    /// SMBHSTCNT
    Control,
    /// SMBHSTCMD
    Command,
    /// SMBHSTADD
    Address,
    /// SMBHSTDAT0
    Data0,
    /// SMBHSTDAT1
    Data1,
    /// SMBBLKDAT
    BlockData,
}

impl Register {
    /// Offset from the SMBus base address
    pub const fn offset(self) -> u16 {
        match self {
            Self::Status => SMBHSTSTS,
            Self::Control => SMBHSTCNT,
            Self::Command => SMBHSTCMD,
            Self::Address => SMBHSTADD,
            Self::Data0 => SMBHSTDAT0,
            Self::Data1 => SMBHSTDAT1,
            Self::BlockData => SMBBLKDAT,
        }
    }

    /// Absolute port number for a controller at `base`
    pub const fn port(self, base: u16) -> u16 {
        base.wrapping_add(self.offset())
    }
}

bitflags! {
    /// SMBHSTSTS bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HostStatus: u8 {
        /// Host busy, transaction in progress
        const HOST_BUSY = 0x01;
        /// Transaction completed
        const INTR      = 0x02;
        /// Device error: no acknowledge from the slave
        const DEV_ERR   = 0x04;
        /// Bus collision
        const BUS_ERR   = 0x08;
        /// Failed bus transaction
        const FAILED    = 0x10;

        // Vendor-specific bits are preserved so write-back clears them too
        const _ = !0;
    }
}

bitflags! {
    /// SMBHSTCNT bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HostControl: u8 {
        /// Interrupt enable (kept clear, this driver polls)
        const INTREN = 0x01;
        /// Protocol size field
        const SIZE   = 0x1c;
        /// Start the transaction
        const START  = 0x40;

        const _ = !0;
    }
}

impl HostControl {
    /// Control value for a protocol size code with interrupts disabled
    pub const fn for_size(size: u8) -> Self {
        Self::from_bits_retain(size & Self::SIZE.bits())
    }
}
