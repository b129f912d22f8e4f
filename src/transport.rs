//! Transport constructors (`spec.md` §2, "the client is transport-agnostic
//! over anything implementing `AsyncRead + AsyncWrite`").
//!
//! [`crate::pipeline::Connection::spawn`] accepts any transport meeting
//! [`Transport`]; these two functions are the convenience paths most
//! callers actually want, mirroring the teacher's own `TcpListener::bind`
//! setup in `examples/yash-jain-1-muDB/src/server.rs`, just dialing out
//! instead of listening.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, UnixStream};

use crate::error::CommandError;
use crate::resp::ProtocolError;

/// Anything the connection driver can read commands' replies from and
/// write commands to.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T> Transport for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

/// Dial a TCP Redis-compatible server at `addr` (e.g. `"127.0.0.1:6379"`).
pub async fn connect_tcp(addr: &str) -> Result<TcpStream, CommandError> {
    TcpStream::connect(addr)
        .await
        .map_err(|e| CommandError::Protocol(ProtocolError::from(e)))
}

/// Dial a Redis-compatible server over a Unix domain socket at `path`.
pub async fn connect_unix(path: &str) -> Result<UnixStream, CommandError> {
    UnixStream::connect(path)
        .await
        .map_err(|e| CommandError::Protocol(ProtocolError::from(e)))
}
