//! SMBus transaction vocabulary
//!
//! Transaction shapes, directions, slave addresses, payloads and the
//! functionality flags a host controller advertises.

mod functionality;
mod operation;

pub use functionality::Functionality;
pub use operation::{
    BlockBuf, Direction, Operation, OperationKind, Payload, SlaveAddress, BLOCK_MAX,
};
