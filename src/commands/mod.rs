//! CLI command implementations
//!
//! Bus commands take `&mut dyn SmbusMaster`, so they run unchanged against
//! the hardware controller and the emulator. `detect` and `capabilities`
//! look at the opened [`Adapter`](crate::adapters::Adapter) itself.

mod detect;
mod list;
mod transfer;

pub use detect::{run_capabilities, run_detect};
pub use list::list_adapters;
pub use transfer::{
    run_quick, run_read_block, run_read_byte, run_read_byte_data, run_read_word,
    run_write_block, run_write_byte, run_write_byte_data, run_write_word,
};
