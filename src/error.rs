//! The three error categories from `spec.md` §7.
//!
//! - Server errors (RESP `Error` frames) and decode errors are surfaced to
//!   the originating command only — they never close the connection.
//! - Protocol/transport errors are fatal: every pending completion fails
//!   with the same error and the connection closes.

use thiserror::Error;

pub use crate::resp::{DecodeError, ProtocolError};

/// The failure a single command's [`crate::pipeline::Completion`] is
/// fulfilled with.
#[derive(Debug, Error, Clone)]
pub enum CommandError {
    /// A RESP `Error` frame returned by the server for this command.
    /// Not fatal to the connection (`spec.md` §7).
    #[error("{0}")]
    Server(String),

    /// The reply could not be turned into the caller's requested type.
    /// Not fatal to the connection.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A protocol or transport failure drained this command along with
    /// every other pending completion.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl CommandError {
    pub fn connection_closed() -> Self {
        CommandError::Protocol(ProtocolError::ConnectionClosed)
    }
}
