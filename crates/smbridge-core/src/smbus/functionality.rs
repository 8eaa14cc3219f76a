//! Host controller functionality flags

use bitflags::bitflags;

use super::operation::OperationKind;

bitflags! {
    /// SMBus functionality flags
    ///
    /// Bit positions follow the Linux `I2C_FUNC_*` numbering so values can
    /// be compared with what `i2cdetect -F` prints.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Functionality: u32 {
        /// Plain I2C-level commands
        const I2C                    = 0x0000_0001;
        /// SMBus block process call
        const SMBUS_BLOCK_PROC_CALL  = 0x0000_8000;
        /// SMBus quick command
        const SMBUS_QUICK            = 0x0001_0000;
        /// SMBus receive byte
        const SMBUS_READ_BYTE        = 0x0002_0000;
        /// SMBus send byte
        const SMBUS_WRITE_BYTE       = 0x0004_0000;
        /// SMBus read byte data
        const SMBUS_READ_BYTE_DATA   = 0x0008_0000;
        /// SMBus write byte data
        const SMBUS_WRITE_BYTE_DATA  = 0x0010_0000;
        /// SMBus read word data
        const SMBUS_READ_WORD_DATA   = 0x0020_0000;
        /// SMBus write word data
        const SMBUS_WRITE_WORD_DATA  = 0x0040_0000;
        /// SMBus process call
        const SMBUS_PROC_CALL        = 0x0080_0000;
        /// SMBus read block data
        const SMBUS_READ_BLOCK_DATA  = 0x0100_0000;
        /// SMBus write block data
        const SMBUS_WRITE_BLOCK_DATA = 0x0200_0000;
        /// I2C block read
        const SMBUS_READ_I2C_BLOCK   = 0x0400_0000;
        /// I2C block write
        const SMBUS_WRITE_I2C_BLOCK  = 0x0800_0000;

        /// Send and receive byte
        const SMBUS_BYTE = Self::SMBUS_READ_BYTE.bits() | Self::SMBUS_WRITE_BYTE.bits();
        /// Read and write byte data
        const SMBUS_BYTE_DATA =
            Self::SMBUS_READ_BYTE_DATA.bits() | Self::SMBUS_WRITE_BYTE_DATA.bits();
        /// Read and write word data
        const SMBUS_WORD_DATA =
            Self::SMBUS_READ_WORD_DATA.bits() | Self::SMBUS_WRITE_WORD_DATA.bits();
        /// Read and write block data
        const SMBUS_BLOCK_DATA =
            Self::SMBUS_READ_BLOCK_DATA.bits() | Self::SMBUS_WRITE_BLOCK_DATA.bits();
        /// Read and write I2C block
        const SMBUS_I2C_BLOCK =
            Self::SMBUS_READ_I2C_BLOCK.bits() | Self::SMBUS_WRITE_I2C_BLOCK.bits();
    }
}

impl Default for Functionality {
    fn default() -> Self {
        Functionality::empty()
    }
}

impl Functionality {
    /// Flags covering both directions of a transaction shape
    pub const fn for_kind(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Quick => Self::SMBUS_QUICK,
            OperationKind::Byte => Self::SMBUS_BYTE,
            OperationKind::ByteData => Self::SMBUS_BYTE_DATA,
            OperationKind::WordData => Self::SMBUS_WORD_DATA,
            OperationKind::ProcessCall => Self::SMBUS_PROC_CALL,
            OperationKind::BlockData => Self::SMBUS_BLOCK_DATA,
            OperationKind::BlockProcessCall => Self::SMBUS_BLOCK_PROC_CALL,
            OperationKind::I2cBlockData => Self::SMBUS_I2C_BLOCK,
        }
    }

    /// Returns true if every flag of `kind` is present
    pub fn supports(&self, kind: OperationKind) -> bool {
        self.contains(Self::for_kind(kind))
    }

    /// Iterate over the transaction shapes fully covered by these flags
    pub fn kinds(&self) -> impl Iterator<Item = OperationKind> + '_ {
        const ALL: [OperationKind; 8] = [
            OperationKind::Quick,
            OperationKind::Byte,
            OperationKind::ByteData,
            OperationKind::WordData,
            OperationKind::ProcessCall,
            OperationKind::BlockData,
            OperationKind::BlockProcessCall,
            OperationKind::I2cBlockData,
        ];
        ALL.into_iter().filter(move |kind| self.supports(*kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_bit_values() {
        assert_eq!(Functionality::SMBUS_QUICK.bits(), 0x0001_0000);
        assert_eq!(Functionality::SMBUS_BYTE.bits(), 0x0006_0000);
        assert_eq!(Functionality::SMBUS_BLOCK_DATA.bits(), 0x0300_0000);
    }

    #[test]
    fn test_kinds_iteration() {
        let funcs = Functionality::SMBUS_QUICK | Functionality::SMBUS_WORD_DATA;
        let kinds: heapless::Vec<OperationKind, 8> = funcs.kinds().collect();
        assert_eq!(
            kinds.as_slice(),
            &[OperationKind::Quick, OperationKind::WordData]
        );
    }

    #[test]
    fn test_partial_direction_not_supported() {
        let funcs = Functionality::SMBUS_READ_BYTE_DATA;
        assert!(!funcs.supports(OperationKind::ByteData));
    }
}
