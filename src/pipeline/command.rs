//! The unit of work flowing through a pipeline (`spec.md` §3, "Command").

use bytes::Bytes;
use tokio::sync::oneshot;

use crate::error::CommandError;
use crate::resp::RespValue;

/// A single-shot producer-side handle, fulfilled once with either a
/// successful [`RespValue`] or an error.
///
/// Grounded on `other_examples/ff421dda_brocaar-redis-rs__src-aio.rs.rs`'s
/// `PipelineOutput` (a `oneshot::Sender` per in-flight command) — the real
/// `redis-rs` async client uses exactly this shape for the same reason
/// spec.md names it: RESP2's strict FIFO reply order means one sender per
/// submitted command is all the bookkeeping a pipeline needs.
pub type Completion = oneshot::Sender<Result<RespValue, CommandError>>;

/// A command awaiting dispatch: its argv (already rendered as bulk
/// strings) and the completion it will fulfill once answered.
pub struct Command {
    pub argv: Vec<Bytes>,
    pub completion: Completion,
}

impl Command {
    pub fn new(argv: Vec<Bytes>, completion: Completion) -> Self {
        debug_assert!(!argv.is_empty(), "a command's argv must be non-empty");
        Command { argv, completion }
    }
}
