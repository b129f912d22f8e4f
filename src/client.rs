//! The thin convenience surface over a connection (`spec.md` §2, component
//! C7). Everything here is sugar over [`crate::pipeline::ConnectionHandle`]:
//! build an argv, submit it, decode the typed reply.

use bytes::Bytes;

use crate::error::CommandError;
use crate::pipeline::{Connection, ConnectionHandle, SubscriptionId};
use crate::resp::encoder::build_argv;
use crate::resp::{Decode, RespValue, ToResp};
use crate::transport::{self, Transport};

/// A handle to one Redis-compatible connection.
///
/// Cloning a `Client` is cheap — it shares the same connection and
/// submission queue, so multiple call sites can pipeline commands onto the
/// same socket concurrently (`spec.md` §1).
#[derive(Clone)]
pub struct Client {
    connection: ConnectionHandle,
}

impl Client {
    /// Wrap any [`Transport`] (already connected) as a client.
    pub fn new<T: Transport>(transport: T) -> Self {
        Client { connection: Connection::spawn(transport) }
    }

    /// Dial a TCP Redis-compatible server at `addr`.
    pub async fn connect_tcp(addr: &str) -> Result<Self, CommandError> {
        let stream = transport::connect_tcp(addr).await?;
        Ok(Client::new(stream))
    }

    /// Dial a Redis-compatible server over a Unix domain socket.
    pub async fn connect_unix(path: &str) -> Result<Self, CommandError> {
        let stream = transport::connect_unix(path).await?;
        Ok(Client::new(stream))
    }

    /// Submit a raw command (verb already uppercase ASCII, args already
    /// rendered) and return the undecoded reply, for callers that want to
    /// build their own argv (`commands::*` wrappers use this).
    pub async fn submit(&self, argv: Vec<Bytes>) -> Result<RespValue, CommandError> {
        self.connection.submit(argv).await
    }

    /// Build a command from a verb and [`ToResp`] arguments, submit it, and
    /// decode the reply as `R`.
    pub async fn command<R: Decode>(&self, verb: &str, args: &[Bytes]) -> Result<R, CommandError> {
        let argv = build_argv(verb, args);
        let reply = self.connection.submit(argv).await?;
        R::decode(&reply).map_err(CommandError::from)
    }

    /// Enter Pub/Sub mode and register `callback` under each channel in
    /// `channels`. See [`ConnectionHandle::subscribe`] for the
    /// empty-in-flight-queue precondition.
    pub async fn subscribe(
        &self,
        channels: Vec<String>,
        callback: impl FnMut(&str, &[u8]) + Send + 'static,
    ) -> Result<Vec<SubscriptionId>, CommandError> {
        self.connection.subscribe(channels, callback).await
    }

    pub async fn psubscribe(
        &self,
        patterns: Vec<String>,
        callback: impl FnMut(&str, &[u8]) + Send + 'static,
    ) -> Result<Vec<SubscriptionId>, CommandError> {
        self.connection.psubscribe(patterns, callback).await
    }

    pub async fn unsubscribe(&self, channels: Vec<String>) -> Result<(), CommandError> {
        self.connection.unsubscribe(channels).await
    }

    pub async fn punsubscribe(&self, patterns: Vec<String>) -> Result<(), CommandError> {
        self.connection.punsubscribe(patterns).await
    }
}

/// Helper shared by `commands::*` for stringly-typed arguments.
pub(crate) fn arg(value: impl ToResp) -> Bytes {
    value.to_resp_bytes()
}
