//! The connection driver (`spec.md` §5, "Scheduling model").
//!
//! Owns the transport and the single `select!` loop that alternates
//! between accepting new submissions and reading replies off the wire.
//! Everything here runs on one logical executor per connection — the
//! cooperative, single-threaded-per-connection model `spec.md` calls for —
//! so enqueuing a completion and writing its bytes, or matching a reply and
//! delivering it, each happen inside one uninterrupted branch with no
//! chance for another branch to observe a half-updated queue.

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::Framed;

use crate::error::CommandError;
use crate::resp::encoder::build_argv;
use crate::resp::{ClientCodec, ProtocolError, RespValue};

use super::command::Command;
use super::core::{dispatch_to_queue, CommandPipeline, Outcome};
use super::pubsub::{Callback, PubSubOutcome, PubSubPipeline, SubscriptionId};
use super::queue::transplant;

/// Depth of the submission channel. Bounded so a runaway caller applies
/// backpressure rather than growing the queue without limit; unrelated to
/// RESP2 pipelining depth, which has no limit of its own.
const SUBMISSION_CHANNEL_CAPACITY: usize = 256;

enum DriverMessage {
    Submit(Command),
    Subscribe {
        channels: Vec<String>,
        pattern: bool,
        callback: Callback,
        reply: oneshot::Sender<Result<Vec<SubscriptionId>, CommandError>>,
    },
    Unsubscribe {
        keys: Vec<String>,
        pattern: bool,
        reply: oneshot::Sender<Result<(), CommandError>>,
    },
}

/// Which pipeline is currently interpreting inbound frames. The driver
/// swaps between the two via [`transplant`], never holding both at once.
enum Mode {
    Command(CommandPipeline),
    PubSub(PubSubPipeline),
}

fn fail_all(mode: &mut Mode, err: ProtocolError) {
    match mode {
        Mode::Command(pipeline) => pipeline.fail_all(err),
        Mode::PubSub(pipeline) => pipeline.in_flight().drain_with_error(err),
    }
}

fn to_bulk_args(items: &[String]) -> Vec<Bytes> {
    items.iter().map(|s| Bytes::copy_from_slice(s.as_bytes())).collect()
}

/// A cheaply cloneable front door onto a running [`Connection`]. Every
/// clone shares the same submission channel, so many callers (or many
/// `commands::*` wrappers) can submit concurrently onto one physical
/// connection — the pipelining property `spec.md` §1 exists to provide.
#[derive(Clone)]
pub struct ConnectionHandle {
    sender: mpsc::Sender<DriverMessage>,
}

impl ConnectionHandle {
    /// Submit one command and await its reply, FIFO-ordered against every
    /// other submission on this handle (`spec.md` §4.4).
    pub async fn submit(&self, argv: Vec<Bytes>) -> Result<RespValue, CommandError> {
        let (tx, rx) = oneshot::channel();
        let command = Command::new(argv, tx);
        self.sender
            .send(DriverMessage::Submit(command))
            .await
            .map_err(|_| CommandError::connection_closed())?;
        rx.await.map_err(|_| CommandError::connection_closed())?
    }

    /// Enter Pub/Sub mode (if not already in it) and register `callback`
    /// under every channel in `channels`, writing `SUBSCRIBE` on the wire.
    ///
    /// Requires no commands to be in flight at the moment of the call —
    /// `spec.md` §9's handler-replacement note makes queue transfer legal
    /// only when the source queue is empty, so mixing an outstanding
    /// request/response command with a fresh subscription is rejected
    /// rather than silently desynchronizing the FIFO match.
    pub async fn subscribe(
        &self,
        channels: Vec<String>,
        callback: impl FnMut(&str, &[u8]) + Send + 'static,
    ) -> Result<Vec<SubscriptionId>, CommandError> {
        self.subscribe_inner(channels, false, Box::new(callback)).await
    }

    pub async fn psubscribe(
        &self,
        patterns: Vec<String>,
        callback: impl FnMut(&str, &[u8]) + Send + 'static,
    ) -> Result<Vec<SubscriptionId>, CommandError> {
        self.subscribe_inner(patterns, true, Box::new(callback)).await
    }

    async fn subscribe_inner(
        &self,
        channels: Vec<String>,
        pattern: bool,
        callback: Callback,
    ) -> Result<Vec<SubscriptionId>, CommandError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(DriverMessage::Subscribe { channels, pattern, callback, reply: tx })
            .await
            .map_err(|_| CommandError::connection_closed())?;
        rx.await.map_err(|_| CommandError::connection_closed())?
    }

    pub async fn unsubscribe(&self, keys: Vec<String>) -> Result<(), CommandError> {
        self.unsubscribe_inner(keys, false).await
    }

    pub async fn punsubscribe(&self, patterns: Vec<String>) -> Result<(), CommandError> {
        self.unsubscribe_inner(patterns, true).await
    }

    async fn unsubscribe_inner(&self, keys: Vec<String>, pattern: bool) -> Result<(), CommandError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(DriverMessage::Unsubscribe { keys, pattern, reply: tx })
            .await
            .map_err(|_| CommandError::connection_closed())?;
        rx.await.map_err(|_| CommandError::connection_closed())?
    }
}

/// Spawns and owns the driver task for one transport.
pub struct Connection;

impl Connection {
    /// Wrap `transport` in the wire codec, spawn the driver loop, and hand
    /// back a [`ConnectionHandle`] for submitting commands.
    pub fn spawn<T>(transport: T) -> ConnectionHandle
    where
        T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let framed = Framed::new(transport, ClientCodec::new());
        let (sender, receiver) = mpsc::channel(SUBMISSION_CHANNEL_CAPACITY);
        tokio::spawn(run(framed, receiver));
        ConnectionHandle { sender }
    }
}

async fn run<T>(mut framed: Framed<T, ClientCodec>, mut receiver: mpsc::Receiver<DriverMessage>)
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let mut mode = Mode::Command(CommandPipeline::new());

    loop {
        tokio::select! {
            message = receiver.recv() => {
                let Some(message) = message else {
                    log::debug!("submission channel closed, shutting connection down");
                    fail_all(&mut mode, ProtocolError::ConnectionClosed);
                    return;
                };
                match message {
                    DriverMessage::Submit(command) => {
                        let Command { argv, completion } = command;
                        match &mut mode {
                            Mode::Command(pipeline) => pipeline.enqueue(completion),
                            Mode::PubSub(pipeline) => pipeline.in_flight().push(completion),
                        }
                        if let Err(err) = framed.send(argv).await {
                            log::error!("write failed, draining in-flight commands: {err}");
                            fail_all(&mut mode, err);
                            return;
                        }
                    }
                    DriverMessage::Subscribe { channels, pattern, callback, reply } => {
                        if let Mode::Command(pipeline) = &mut mode {
                            if !pipeline.in_flight().is_empty() {
                                log::error!("handler replacement attempted on a non-empty queue, closing connection");
                                pipeline.fail_all(ProtocolError::TransplantNonEmptyQueue);
                                let _ = reply.send(Err(CommandError::Protocol(
                                    ProtocolError::TransplantNonEmptyQueue,
                                )));
                                return;
                            }
                            let mut pubsub = PubSubPipeline::new();
                            transplant(pipeline.in_flight(), pubsub.in_flight())
                                .expect("queue checked empty above");
                            mode = Mode::PubSub(pubsub);
                        }
                        let Mode::PubSub(pubsub) = &mut mode else { unreachable!() };
                        let ids = pubsub.subscribe(&channels, callback);
                        let verb = if pattern { "PSUBSCRIBE" } else { "SUBSCRIBE" };
                        let argv = build_argv(verb, &to_bulk_args(&channels));
                        if let Err(err) = framed.send(argv).await {
                            log::error!("subscribe write failed: {err}");
                            fail_all(&mut mode, err.clone());
                            let _ = reply.send(Err(CommandError::Protocol(err)));
                            return;
                        }
                        let _ = reply.send(Ok(ids));
                    }
                    DriverMessage::Unsubscribe { keys, pattern, reply } => {
                        let Mode::PubSub(pubsub) = &mut mode else {
                            let _ = reply.send(Ok(()));
                            continue;
                        };
                        pubsub.unsubscribe_keys(&keys);
                        let verb = if pattern { "PUNSUBSCRIBE" } else { "UNSUBSCRIBE" };
                        let argv = build_argv(verb, &to_bulk_args(&keys));
                        if let Err(err) = framed.send(argv).await {
                            log::error!("unsubscribe write failed: {err}");
                            fail_all(&mut mode, err.clone());
                            let _ = reply.send(Err(CommandError::Protocol(err)));
                            return;
                        }
                        let _ = reply.send(Ok(()));
                    }
                }
            }
            frame = framed.next() => {
                match frame {
                    Some(Ok(value)) => {
                        if let Err(err) = handle_inbound(&mut mode, value) {
                            log::error!("fatal pipeline invariant violation, closing connection: {err}");
                            fail_all(&mut mode, err);
                            return;
                        }
                    }
                    Some(Err(err)) => {
                        log::error!("protocol error, closing connection: {err}");
                        fail_all(&mut mode, err);
                        return;
                    }
                    None => {
                        log::debug!("peer closed the connection");
                        fail_all(&mut mode, ProtocolError::ConnectionClosed);
                        return;
                    }
                }
            }
        }
    }
}

/// Dispatches one inbound value against the current mode. Returns
/// `Err` when `spec.md` §4.4's fatal invariant is violated — a reply
/// with nothing in flight to match it to, or (per §9's resolution of the
/// "exit Pub/Sub on zero" TODO) a Pub/Sub-shaped frame arriving after the
/// connection has already transitioned back to ordinary command mode.
fn handle_inbound(mode: &mut Mode, value: RespValue) -> Result<(), ProtocolError> {
    match mode {
        Mode::Command(pipeline) => {
            if is_pubsub_shaped(&value) {
                return Err(ProtocolError::UnexpectedValue);
            }
            if pipeline.dispatch(value) == Outcome::UnexpectedValue {
                return Err(ProtocolError::UnexpectedValue);
            }
            Ok(())
        }
        Mode::PubSub(pubsub) => match pubsub.dispatch(value) {
            PubSubOutcome::MessageDelivered => Ok(()),
            PubSubOutcome::SubscriptionChanged { active_count } => {
                if active_count == 0 {
                    let mut command_pipeline = CommandPipeline::new();
                    transplant(pubsub.in_flight(), command_pipeline.in_flight())
                        .expect("pub/sub queue holds only whitelisted commands, drained above");
                    *mode = Mode::Command(command_pipeline);
                }
                Ok(())
            }
            PubSubOutcome::ForwardToQueue(forwarded) => {
                log::debug!("received non-Pub/Sub frame while in Pub/Sub mode, forwarding to the FIFO queue: {forwarded:?}");
                if dispatch_to_queue(pubsub.in_flight(), forwarded) == Outcome::UnexpectedValue {
                    return Err(ProtocolError::UnexpectedValue);
                }
                Ok(())
            }
        },
    }
}

/// True for the same three-or-four-element, known-first-word array shape
/// [`super::pubsub::PubSubPipeline::dispatch`] recognizes. Used only to
/// detect a Pub/Sub frame arriving in ordinary command mode, which can
/// only happen if the server re-entered Pub/Sub mode unprompted.
fn is_pubsub_shaped(value: &RespValue) -> bool {
    let items = match value {
        RespValue::Array(Some(items)) if items.len() == 3 || items.len() == 4 => items,
        _ => return false,
    };
    let verb = match &items[0] {
        RespValue::BulkString(Some(b)) => std::str::from_utf8(b).ok().map(|s| s.to_ascii_lowercase()),
        _ => return false,
    };
    matches!(
        (verb.as_deref(), items.len()),
        (Some("message"), 3)
            | (Some("pmessage"), 4)
            | (Some("subscribe"), 3)
            | (Some("psubscribe"), 3)
            | (Some("unsubscribe"), 3)
            | (Some("punsubscribe"), 3)
    )
}
