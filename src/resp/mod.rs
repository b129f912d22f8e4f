//! RESP2 codec: wire value type, streaming decoder and command encoder.
//!
//! This module is the layer described in `spec.md` §4.1–§4.3 (components
//! C1–C4): it knows how to turn bytes into [`value::RespValue`]s and back,
//! and how to turn a `RespValue` into a typed Rust value. It knows nothing
//! about sockets, pipelining or Pub/Sub — those live in [`crate::pipeline`].

pub mod codec;
pub mod decode;
pub mod decoder;
pub mod encoder;
pub mod streams;
pub mod value;

pub use codec::ClientCodec;
pub use decode::{Decode, DecodeError, DecodeOptional};
pub use decoder::RespDecoder;
pub use encoder::{CommandEncoder, ToResp};
pub use value::RespValue;

use thiserror::Error;

/// A malformed or out-of-spec byte sequence encountered while decoding.
///
/// Protocol errors are fatal to the connection they occur on: once framing
/// is lost there is no way to know where the next value starts (`spec.md`
/// §4.1, "Failure").
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unrecognized RESP type byte {0:#04x}")]
    UnknownTypeByte(u8),
    #[error("line is not valid UTF-8")]
    NotUtf8,
    #[error("invalid length prefix: {0:?}")]
    InvalidLength(String),
    #[error("invalid integer value: {0:?}")]
    InvalidInteger(String),
    #[error("bulk string length {0} exceeds the maximum allowed")]
    BulkTooLarge(i64),
    #[error("array length {0} exceeds the maximum allowed")]
    ArrayTooLarge(i64),
    #[error("bulk string payload missing its trailing CRLF terminator")]
    MissingTerminator,
    #[error("connection closed")]
    ConnectionClosed,
    #[error("I/O error: {0}")]
    Io(String),
    #[error("received a value while the in-flight queue was empty")]
    UnexpectedValue,
    #[error("cannot transplant a non-empty in-flight queue between pipeline handlers")]
    TransplantNonEmptyQueue,
}

impl From<std::io::Error> for ProtocolError {
    fn from(err: std::io::Error) -> Self {
        ProtocolError::Io(err.to_string())
    }
}
