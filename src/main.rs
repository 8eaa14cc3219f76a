//! smbridge - SMBus host controller tool
//!
//! Drives the PIIX4-compatible SMBus controller of AMD SB800-family
//! southbridges and FCHs directly from user space.
//!
//! # Architecture
//!
//! Every adapter is the same driver over a different port backend:
//! - **piix4** - the real controller through `/dev/port`, located with a
//!   PCI scan and the PM index pair at 0xCD6/0xCD7
//! - **dummy** - a register-level emulator of the controller with one
//!   memory-like device attached
//!
//! Bus commands only see `dyn SmbusMaster`, so they behave the same on both.

mod adapters;
mod cli;
mod commands;

#[cfg(not(any(feature = "piix4", feature = "dummy")))]
compile_error!("enable at least one adapter feature (piix4, dummy)");

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let (spec, target) = match &cli.command {
        Commands::ListAdapters => {
            commands::list_adapters();
            return Ok(());
        }
        Commands::Detect { adapter } | Commands::Capabilities { adapter } => {
            (adapter.adapter.as_str(), None)
        }
        Commands::Quick { target, .. }
        | Commands::ReadByte { target }
        | Commands::WriteByte { target, .. }
        | Commands::ReadByteData { target, .. }
        | Commands::WriteByteData { target, .. }
        | Commands::ReadWord { target, .. }
        | Commands::WriteWord { target, .. }
        | Commands::ReadBlock { target, .. }
        | Commands::WriteBlock { target, .. } => {
            (target.adapter.adapter.as_str(), Some(target.address))
        }
    };

    let mut adapter = adapters::open_adapter(spec)?;
    let address = target.unwrap_or_default();

    let result = match &cli.command {
        Commands::Detect { .. } => commands::run_detect(&adapter),
        Commands::Capabilities { .. } => commands::run_capabilities(&mut adapter),
        Commands::Quick { read, .. } => commands::run_quick(adapter.master(), address, *read),
        Commands::ReadByte { .. } => commands::run_read_byte(adapter.master(), address).map(drop),
        Commands::WriteByte { value, .. } => {
            commands::run_write_byte(adapter.master(), address, *value)
        }
        Commands::ReadByteData { command, .. } => {
            commands::run_read_byte_data(adapter.master(), address, *command).map(drop)
        }
        Commands::WriteByteData { command, value, .. } => {
            commands::run_write_byte_data(adapter.master(), address, *command, *value)
        }
        Commands::ReadWord {
            command, swapped, ..
        } => commands::run_read_word(adapter.master(), address, *command, *swapped).map(drop),
        Commands::WriteWord {
            command,
            value,
            swapped,
            ..
        } => commands::run_write_word(adapter.master(), address, *command, *value, *swapped),
        Commands::ReadBlock { command, .. } => {
            commands::run_read_block(adapter.master(), address, *command).map(drop)
        }
        Commands::WriteBlock { command, data, .. } => {
            commands::run_write_block(adapter.master(), address, *command, data)
        }
        Commands::ListAdapters => Ok(()),
    };

    if let Some(report) = adapter.last_report() {
        log::debug!(
            "Last transaction: {} after {} polls (status {:#04x})",
            report.status,
            report.polls,
            report.last_status.bits()
        );
    }

    if let Err(e) = &result {
        if let Some(err) = e.downcast_ref::<smbridge_core::Error>() {
            log::debug!("SMBus error code: {}", err.errno_name());
        }
    }

    adapter.close();
    result
}
