//! The central RESP2 value type.
//!
//! A [`RespValue`] is the wire-level tagged value every decoded frame and
//! every encoded command argument is built from. There are exactly five
//! cases on the wire; the null-bulk and null-array sentinels are kept
//! distinct here because they are distinct bytes on the wire (`$-1\r\n`
//! vs `*-1\r\n`). They collapse into a single logical `None` only at the
//! typed-decode layer (see [`crate::resp::decode`]).

use bytes::Bytes;

/// A single RESP2 protocol value.
///
/// Values are immutable once constructed: bulk payloads preserve their
/// exact bytes and arrays preserve element order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RespValue {
    /// `+<text>\r\n` — short, no CR/LF in the payload.
    SimpleString(String),
    /// `-<text>\r\n` — a semantic "command failed" signal from the server.
    Error(String),
    /// `:<i64>\r\n`
    Integer(i64),
    /// `$<len>\r\n<bytes>\r\n`, or `$-1\r\n` (`None`) for the null bulk.
    BulkString(Option<Bytes>),
    /// `*<count>\r\n<items...>`, or `*-1\r\n` (`None`) for the null array.
    Array(Option<Vec<RespValue>>),
}

impl RespValue {
    /// Convenience constructor for a non-null bulk string built from any
    /// byte-like input.
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        RespValue::BulkString(Some(data.into()))
    }

    /// The null bulk string (`$-1\r\n`).
    pub fn null_bulk() -> Self {
        RespValue::BulkString(None)
    }

    /// The null array (`*-1\r\n`).
    pub fn null_array() -> Self {
        RespValue::Array(None)
    }

    /// True for either wire-level null sentinel.
    pub fn is_null(&self) -> bool {
        matches!(self, RespValue::BulkString(None) | RespValue::Array(None))
    }

    /// True for a RESP `Error` frame — the server-side "command failed" signal.
    pub fn is_error(&self) -> bool {
        matches!(self, RespValue::Error(_))
    }

    /// Borrow the error text, if this is an `Error` value.
    pub fn as_error(&self) -> Option<&str> {
        match self {
            RespValue::Error(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_builds_non_null() {
        let v = RespValue::bulk("hello");
        assert_eq!(v, RespValue::BulkString(Some(Bytes::from_static(b"hello"))));
        assert!(!v.is_null());
    }

    #[test]
    fn null_sentinels_are_distinguishable_but_both_null() {
        assert!(RespValue::null_bulk().is_null());
        assert!(RespValue::null_array().is_null());
        assert_ne!(RespValue::null_bulk(), RespValue::null_array());
    }

    #[test]
    fn error_accessors() {
        let v = RespValue::Error("ERR boom".to_string());
        assert!(v.is_error());
        assert_eq!(v.as_error(), Some("ERR boom"));
        assert_eq!(RespValue::Integer(1).as_error(), None);
    }
}
