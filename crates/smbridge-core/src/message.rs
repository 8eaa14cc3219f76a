//! Ordered message lists
//!
//! Devices such as RGB controllers are programmed with a sequence of
//! register accesses that only make sense together. [`run_messages`] runs
//! such a list in order on one master and stops at the first failure,
//! leaving the remaining messages untouched.

use crate::error::{Error, Result};
use crate::master::SmbusMaster;
use crate::smbus::{Operation, Payload};

/// One entry of a message list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmbusMessage {
    /// The transaction to run
    pub op: Operation,
    /// Word data travels high byte first
    pub swapped: bool,
    /// Data read back by the transaction, filled in by [`run_messages`]
    pub response: Option<Payload>,
}

impl SmbusMessage {
    /// Wrap an operation
    pub fn new(op: Operation) -> Self {
        Self {
            op,
            swapped: false,
            response: None,
        }
    }

    /// Byte-swap word data in both directions
    pub fn with_swapped(mut self) -> Self {
        self.swapped = true;
        self
    }

    fn execute<M: SmbusMaster + ?Sized>(&self, master: &mut M) -> Result<Option<Payload>> {
        if !self.swapped {
            return master.execute(&self.op);
        }

        let response = match self.op.payload {
            Payload::Word(word) => {
                let mut op = self.op.clone();
                op.payload = Payload::Word(word.swap_bytes());
                master.execute(&op)?
            }
            _ => master.execute(&self.op)?,
        };
        Ok(response.map(|payload| match payload {
            Payload::Word(word) => Payload::Word(word.swap_bytes()),
            other => other,
        }))
    }
}

impl From<Operation> for SmbusMessage {
    fn from(op: Operation) -> Self {
        Self::new(op)
    }
}

/// Run `messages` in order, storing each read response in place
///
/// Returns the number of messages that completed. On error, messages after
/// the failing one are not attempted and keep their previous `response`.
/// An empty list is rejected with [`Error::InvalidArgument`].
pub fn run_messages<M: SmbusMaster + ?Sized>(
    master: &mut M,
    messages: &mut [SmbusMessage],
) -> Result<usize> {
    if messages.is_empty() {
        return Err(Error::InvalidArgument);
    }

    for (index, msg) in messages.iter_mut().enumerate() {
        match msg.execute(master) {
            Ok(response) => msg.response = response,
            Err(e) => {
                log::debug!(
                    "Message {} ({} to {}) failed: {}",
                    index,
                    msg.op.kind,
                    msg.op.address,
                    e
                );
                return Err(e);
            }
        }
    }
    Ok(messages.len())
}
