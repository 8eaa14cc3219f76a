//! CLI argument parsing

use clap::{Parser, Subcommand};

/// Adapter names shown in help output
const ADAPTER_HELP: &str =
    "Adapter to use, as name[:key=value,...] [available: piix4, dummy]";

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a hex or decimal byte
pub fn parse_u8(s: &str) -> Result<u8, String> {
    let value = parse_hex_u32(s)?;
    u8::try_from(value).map_err(|_| format!("Value out of range for a byte: {}", s))
}

/// Parse a hex or decimal word
pub fn parse_u16(s: &str) -> Result<u16, String> {
    let value = parse_hex_u32(s)?;
    u16::try_from(value).map_err(|_| format!("Value out of range for a word: {}", s))
}

/// Parse a 7-bit slave address
pub fn parse_address(s: &str) -> Result<u8, String> {
    let value = parse_u8(s)?;
    if value > 0x7f {
        return Err(format!("Address {:#04x} is not a 7-bit address", value));
    }
    Ok(value)
}

#[derive(Parser)]
#[command(name = "smbridge")]
#[command(author, version, about = "SMBus host controller tool", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Adapter selection shared by every command that touches the bus
#[derive(clap::Args, Debug, Clone)]
pub struct AdapterArgs {
    #[arg(short, long, default_value = "piix4", help = ADAPTER_HELP)]
    pub adapter: String,
}

/// Adapter plus target device
#[derive(clap::Args, Debug, Clone)]
pub struct TargetArgs {
    #[command(flatten)]
    pub adapter: AdapterArgs,

    /// 7-bit slave address (hex with 0x prefix, or decimal)
    #[arg(value_parser = parse_address)]
    pub address: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Locate the SMBus controller and show its register window
    Detect {
        #[command(flatten)]
        adapter: AdapterArgs,
    },

    /// Show the transaction types the adapter supports
    Capabilities {
        #[command(flatten)]
        adapter: AdapterArgs,
    },

    /// Send a quick command (probe a device)
    Quick {
        #[command(flatten)]
        target: TargetArgs,

        /// Send the read variant instead of the write variant
        #[arg(long)]
        read: bool,
    },

    /// Receive one byte
    ReadByte {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Send one byte
    WriteByte {
        #[command(flatten)]
        target: TargetArgs,

        /// Byte to send
        #[arg(value_parser = parse_u8)]
        value: u8,
    },

    /// Read a byte register
    ReadByteData {
        #[command(flatten)]
        target: TargetArgs,

        /// Command code (register)
        #[arg(value_parser = parse_u8)]
        command: u8,
    },

    /// Write a byte register
    WriteByteData {
        #[command(flatten)]
        target: TargetArgs,

        /// Command code (register)
        #[arg(value_parser = parse_u8)]
        command: u8,

        /// Byte to write
        #[arg(value_parser = parse_u8)]
        value: u8,
    },

    /// Read a word register
    ReadWord {
        #[command(flatten)]
        target: TargetArgs,

        /// Command code (register)
        #[arg(value_parser = parse_u8)]
        command: u8,

        /// Swap the bytes of the result (big-endian devices)
        #[arg(long)]
        swapped: bool,
    },

    /// Write a word register
    WriteWord {
        #[command(flatten)]
        target: TargetArgs,

        /// Command code (register)
        #[arg(value_parser = parse_u8)]
        command: u8,

        /// Word to write
        #[arg(value_parser = parse_u16)]
        value: u16,

        /// Swap the bytes before sending (big-endian devices)
        #[arg(long)]
        swapped: bool,
    },

    /// Read a block (up to 32 bytes)
    ReadBlock {
        #[command(flatten)]
        target: TargetArgs,

        /// Command code
        #[arg(value_parser = parse_u8)]
        command: u8,
    },

    /// Write a block (1 to 32 bytes)
    WriteBlock {
        #[command(flatten)]
        target: TargetArgs,

        /// Command code
        #[arg(value_parser = parse_u8)]
        command: u8,

        /// Bytes to write
        #[arg(required = true, num_args = 1..=32, value_parser = parse_u8)]
        data: Vec<u8>,
    },

    /// List supported adapters
    ListAdapters,
}
