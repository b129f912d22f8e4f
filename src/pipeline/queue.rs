//! The in-flight completion queue (`spec.md` §3, "InFlightQueue") and the
//! handler-replacement machinery described in `spec.md` §9.

use std::collections::VecDeque;

use crate::error::{CommandError, ProtocolError};

use super::command::Completion;

/// An ordered, FIFO sequence of completions: one slot per command sent
/// but not yet answered.
///
/// Invariant: its length equals the number of requests sent minus the
/// number answered so far.
#[derive(Default)]
pub struct InFlightQueue {
    completions: VecDeque<Completion>,
}

impl InFlightQueue {
    pub fn new() -> Self {
        InFlightQueue::default()
    }

    pub fn push(&mut self, completion: Completion) {
        self.completions.push_back(completion);
    }

    pub fn pop(&mut self) -> Option<Completion> {
        self.completions.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.completions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.completions.len()
    }

    /// Fail every pending completion with the same error and leave the
    /// queue empty. Used when a protocol/transport error is fatal to the
    /// connection (`spec.md` §4.4, "Transport errors").
    pub fn drain_with_error(&mut self, err: ProtocolError) {
        while let Some(completion) = self.completions.pop_front() {
            let _ = completion.send(Err(CommandError::Protocol(err.clone())));
        }
    }
}

/// Moves the in-flight queue out of `from` and into `to`, as the sole
/// permitted way to share FIFO state between a [`super::CommandPipeline`]
/// and a [`super::PubSubPipeline`] (`spec.md` §4.4, "Handler replacement";
/// §9's "cyclic references via a command-handler core class" note).
///
/// Fails the transfer with [`ProtocolError::TransplantNonEmptyQueue`] if
/// `from` still has outstanding completions — replacing a handler out
/// from under in-flight commands would desynchronize the FIFO match,
/// which `spec.md` calls a fatal invariant violation.
pub fn transplant(from: &mut InFlightQueue, to: &mut InFlightQueue) -> Result<(), ProtocolError> {
    if !from.is_empty() {
        return Err(ProtocolError::TransplantNonEmptyQueue);
    }
    std::mem::swap(from, to);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[test]
    fn fifo_order() {
        let mut q = InFlightQueue::new();
        let (tx1, _rx1) = oneshot::channel();
        let (tx2, _rx2) = oneshot::channel();
        q.push(tx1);
        q.push(tx2);
        assert_eq!(q.len(), 2);
        assert!(q.pop().is_some());
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn drain_fails_every_completion() {
        let mut q = InFlightQueue::new();
        let (tx1, mut rx1) = oneshot::channel();
        let (tx2, mut rx2) = oneshot::channel();
        q.push(tx1);
        q.push(tx2);
        q.drain_with_error(ProtocolError::ConnectionClosed);
        assert!(q.is_empty());
        assert!(rx1.try_recv().unwrap().is_err());
        assert!(rx2.try_recv().unwrap().is_err());
    }

    #[test]
    fn transplant_requires_empty_source() {
        let mut from = InFlightQueue::new();
        let mut to = InFlightQueue::new();
        let (tx, _rx) = oneshot::channel();
        from.push(tx);
        assert!(transplant(&mut from, &mut to).is_err());

        let mut from = InFlightQueue::new();
        let mut to = InFlightQueue::new();
        let (tx, _rx) = oneshot::channel();
        to.push(tx);
        assert!(transplant(&mut from, &mut to).is_ok());
        assert_eq!(to.len(), 1);
    }
}
