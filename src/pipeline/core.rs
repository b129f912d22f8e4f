//! Ordered command pipeline (`spec.md` §4.4, component C5).
//!
//! Pairs inbound [`RespValue`]s with the oldest outstanding completion,
//! strictly FIFO, exploiting RESP2's guarantee that the server answers in
//! send order. The pure dispatch logic lives here, separate from the I/O
//! driver in [`super::connection`], so it can be exercised directly
//! without a transport (see the unit tests below and the `tests/`
//! integration suite, which drives the same logic over a real
//! `tokio::io::duplex` transport).

use crate::error::CommandError;
use crate::metrics;
use crate::resp::{ProtocolError, RespValue};

use super::queue::InFlightQueue;

/// What the driver loop should do after handing a value or an error to
/// [`CommandPipeline`].
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The value was matched to a completion and delivered; keep reading.
    Dispatched,
    /// The queue was empty when a value arrived — a fatal invariant
    /// violation per `spec.md` §4.4. The driver must log at critical
    /// severity and fail the connection.
    UnexpectedValue,
}

/// The ordinary request/response pipeline state: just the in-flight
/// queue. Kept as its own type (rather than folding the queue directly
/// into the connection driver) so it can be handed to
/// [`super::pubsub::PubSubPipeline`] via [`super::queue::transplant`].
#[derive(Default)]
pub struct CommandPipeline {
    in_flight: InFlightQueue,
}

impl CommandPipeline {
    pub fn new() -> Self {
        CommandPipeline::default()
    }

    pub fn in_flight(&mut self) -> &mut InFlightQueue {
        &mut self.in_flight
    }

    /// Enqueue a completion for a command about to be written. Per
    /// `spec.md` §4.4 this must happen in the same atomic step as the
    /// write — the driver calls this immediately before writing the
    /// encoded bytes, inside a single uninterrupted branch of its event
    /// loop (`spec.md` §5, "Scheduling model").
    pub fn enqueue(&mut self, completion: super::command::Completion) {
        self.in_flight.push(completion);
    }

    /// Match one inbound value to the oldest outstanding completion.
    ///
    /// `Error` frames fail the command (not the connection); anything
    /// else is delivered as a success. Both paths bump the matching
    /// metrics counter.
    pub fn dispatch(&mut self, value: RespValue) -> Outcome {
        dispatch_to_queue(&mut self.in_flight, value)
    }

    /// Fatal path: drain every pending completion with `err` and mark the
    /// queue empty. The caller (the connection driver) is responsible for
    /// then closing the transport and rejecting further submissions.
    pub fn fail_all(&mut self, err: ProtocolError) {
        self.in_flight.drain_with_error(err);
    }
}

/// The dispatch logic [`CommandPipeline::dispatch`] runs, factored out so
/// [`super::pubsub::PubSubPipeline`] can apply the same FIFO matching to
/// frames it forwards from its whitelisted commands (`spec.md` §4.5,
/// "PING/QUIT... fall through to the ordinary pipeline").
pub fn dispatch_to_queue(queue: &mut InFlightQueue, value: RespValue) -> Outcome {
    let completion = match queue.pop() {
        Some(c) => c,
        None => return Outcome::UnexpectedValue,
    };

    let result = if let RespValue::Error(text) = value {
        metrics::record_failure();
        Err(CommandError::Server(text))
    } else {
        metrics::record_success();
        Ok(value)
    };

    let _ = completion.send(result);
    Outcome::Dispatched
}
