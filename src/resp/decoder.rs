//! Incremental RESP2 decoder.
//!
//! Turns an arbitrary, possibly-split byte stream into a sequence of
//! [`RespValue`]s without ever requiring a whole frame to be buffered up
//! front. Implemented as a [`tokio_util::codec::Decoder`] so it can be
//! driven by `Framed` exactly the way the teacher's `RespCommandFrame`
//! drove command decoding (`examples/yash-jain-1-muDB/src/resp/frame.rs`),
//! just inverted: here we decode *replies*, not commands.
//!
//! The decoder never advances the input buffer past a partially parsed
//! value — on "not enough bytes yet" the buffer is left untouched so the
//! next call (fed more bytes) can resume from the same position.

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

use super::value::RespValue;
use super::ProtocolError;

/// Longest decimal length prefix we're willing to trust before bounding the
/// resulting allocation. 512 MiB mirrors Redis's own `proto-max-bulk-len`
/// default ceiling.
const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;

/// Largest array we'll build eagerly. Bounds memory if a server (or a
/// test feeding malformed bytes) claims an enormous element count.
const MAX_ARRAY_LEN: i64 = 1024 * 1024;

/// A partially parsed aggregate frame on the decoder's stack.
///
/// Only arrays nest in RESP2, so the stack holds nothing but this one
/// variant; it still needs to be a stack because arrays nest arbitrarily
/// deep (an array of arrays of arrays...).
struct PendingArray {
    remaining: usize,
    items: Vec<RespValue>,
}

/// Streaming RESP2 decoder state.
///
/// One instance is owned per connection. It is not restartable after a
/// [`ProtocolError`] — once framing is lost there is no way to know where
/// the next value begins, so the connection must be discarded along with
/// the decoder (see `spec.md` §4.1, "Failure").
#[derive(Default)]
pub struct RespDecoder {
    stack: Vec<PendingArray>,
}

impl RespDecoder {
    pub fn new() -> Self {
        RespDecoder { stack: Vec::new() }
    }

    /// Fold a freshly parsed value into the enclosing aggregate frame, if
    /// any. Returns `Some(value)` once a value has bubbled all the way up
    /// to the top level (i.e. is not itself part of a still-open array).
    fn absorb(&mut self, mut value: RespValue) -> Option<RespValue> {
        loop {
            match self.stack.last_mut() {
                None => return Some(value),
                Some(frame) => {
                    frame.items.push(value);
                    frame.remaining -= 1;
                    if frame.remaining > 0 {
                        return None;
                    }
                    let frame = self.stack.pop().expect("just matched Some above");
                    value = RespValue::Array(Some(frame.items));
                }
            }
        }
    }
}

/// One decode step: either we don't have enough bytes yet, we pushed a new
/// pending array frame and should keep looping, or we produced a complete
/// scalar/aggregate value to feed into [`RespDecoder::absorb`].
enum Step {
    NeedMoreBytes,
    PushArrayFrame(usize),
    Value(RespValue),
}

impl Decoder for RespDecoder {
    type Item = RespValue;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<RespValue>, ProtocolError> {
        loop {
            match step(src)? {
                Step::NeedMoreBytes => return Ok(None),
                Step::PushArrayFrame(remaining) => {
                    self.stack.push(PendingArray {
                        remaining,
                        items: Vec::with_capacity(remaining),
                    });
                }
                Step::Value(value) => {
                    if let Some(top) = self.absorb(value) {
                        return Ok(Some(top));
                    }
                }
            }
        }
    }
}

fn step(src: &mut BytesMut) -> Result<Step, ProtocolError> {
    if src.is_empty() {
        return Ok(Step::NeedMoreBytes);
    }

    match src[0] {
        b'+' => Ok(take_line(src)?.map_or(Step::NeedMoreBytes, |line| {
            Step::Value(RespValue::SimpleString(line))
        })),
        b'-' => Ok(take_line(src)?
            .map_or(Step::NeedMoreBytes, |line| Step::Value(RespValue::Error(line)))),
        b':' => match take_line(src)? {
            None => Ok(Step::NeedMoreBytes),
            Some(line) => {
                let n = line
                    .parse::<i64>()
                    .map_err(|_| ProtocolError::InvalidInteger(line))?;
                Ok(Step::Value(RespValue::Integer(n)))
            }
        },
        b'$' => parse_bulk_string(src),
        b'*' => parse_array_header(src),
        other => Err(ProtocolError::UnknownTypeByte(other)),
    }
}

/// Find the next CRLF-terminated line starting right after the type byte,
/// without consuming any bytes unless the whole line is present.
///
/// Returns the line's text (excluding the type byte and the CRLF) and, as
/// a side effect when `Some` is returned, advances `src` past the line.
fn take_line(src: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
    match find_crlf(&src[1..]) {
        None => Ok(None),
        Some(end) => {
            let line_bytes = src[1..1 + end].to_vec();
            src.advance(1 + end + 2);
            String::from_utf8(line_bytes)
                .map(Some)
                .map_err(|_| ProtocolError::NotUtf8)
        }
    }
}

/// Index of the `\r` in the first `\r\n` found in `buf`, if any.
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Parse the `<len>` portion of a `$<len>\r\n` or `*<len>\r\n` header
/// without consuming anything. Returns `(header_len_in_bytes, parsed_len)`.
fn parse_len_header(src: &BytesMut) -> Result<Option<(usize, i64)>, ProtocolError> {
    match find_crlf(&src[1..]) {
        None => Ok(None),
        Some(end) => {
            let digits = std::str::from_utf8(&src[1..1 + end]).map_err(|_| ProtocolError::NotUtf8)?;
            let len = digits
                .parse::<i64>()
                .map_err(|_| ProtocolError::InvalidLength(digits.to_string()))?;
            if len < -1 {
                return Err(ProtocolError::InvalidLength(digits.to_string()));
            }
            Ok(Some((1 + end + 2, len)))
        }
    }
}

fn parse_bulk_string(src: &mut BytesMut) -> Result<Step, ProtocolError> {
    let (header_len, len) = match parse_len_header(src)? {
        None => return Ok(Step::NeedMoreBytes),
        Some(v) => v,
    };

    if len == -1 {
        src.advance(header_len);
        return Ok(Step::Value(RespValue::BulkString(None)));
    }

    if len > MAX_BULK_LEN {
        return Err(ProtocolError::BulkTooLarge(len));
    }

    let total = header_len + len as usize + 2;
    if src.len() < total {
        // Not enough bytes for the payload + trailing CRLF yet. Leave the
        // buffer untouched — re-parsing the header next call is cheap and
        // keeps the decoder free of extra "partial bulk" state.
        return Ok(Step::NeedMoreBytes);
    }

    if &src[total - 2..total] != b"\r\n" {
        return Err(ProtocolError::MissingTerminator);
    }

    let payload = src[header_len..total - 2].to_vec();
    src.advance(total);
    Ok(Step::Value(RespValue::BulkString(Some(payload.into()))))
}

fn parse_array_header(src: &mut BytesMut) -> Result<Step, ProtocolError> {
    let (header_len, len) = match parse_len_header(src)? {
        None => return Ok(Step::NeedMoreBytes),
        Some(v) => v,
    };
    src.advance(header_len);

    if len == -1 {
        return Ok(Step::Value(RespValue::Array(None)));
    }
    if len == 0 {
        return Ok(Step::Value(RespValue::Array(Some(Vec::new()))));
    }
    if len > MAX_ARRAY_LEN {
        return Err(ProtocolError::ArrayTooLarge(len));
    }

    Ok(Step::PushArrayFrame(len as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn decode_all(bytes: &[u8]) -> Vec<RespValue> {
        let mut decoder = RespDecoder::new();
        let mut buf = BytesMut::from(bytes);
        let mut out = Vec::new();
        while let Some(v) = decoder.decode(&mut buf).unwrap() {
            out.push(v);
        }
        out
    }

    #[test]
    fn simple_string() {
        assert_eq!(
            decode_all(b"+PONG\r\n"),
            vec![RespValue::SimpleString("PONG".into())]
        );
    }

    #[test]
    fn error_value() {
        assert_eq!(
            decode_all(b"-ERR value is not an integer\r\n"),
            vec![RespValue::Error("ERR value is not an integer".into())]
        );
    }

    #[test]
    fn integer() {
        assert_eq!(decode_all(b":1000\r\n"), vec![RespValue::Integer(1000)]);
    }

    #[test]
    fn negative_integer() {
        assert_eq!(decode_all(b":-5\r\n"), vec![RespValue::Integer(-5)]);
    }

    #[test]
    fn bulk_string_and_null_bulk() {
        assert_eq!(
            decode_all(b"$5\r\nhello\r\n"),
            vec![RespValue::bulk("hello")]
        );
        assert_eq!(decode_all(b"$-1\r\n"), vec![RespValue::null_bulk()]);
        assert_eq!(decode_all(b"$0\r\n\r\n"), vec![RespValue::bulk("")]);
    }

    #[test]
    fn nested_array() {
        let bytes = b"*2\r\n*1\r\n:1\r\n$3\r\nfoo\r\n";
        let expected = RespValue::Array(Some(vec![
            RespValue::Array(Some(vec![RespValue::Integer(1)])),
            RespValue::bulk("foo"),
        ]));
        assert_eq!(decode_all(bytes), vec![expected]);
    }

    #[test]
    fn null_array_and_empty_array() {
        assert_eq!(decode_all(b"*-1\r\n"), vec![RespValue::null_array()]);
        assert_eq!(
            decode_all(b"*0\r\n"),
            vec![RespValue::Array(Some(Vec::new()))]
        );
    }

    #[test]
    fn partial_input_retains_remainder() {
        let mut decoder = RespDecoder::new();
        let mut buf = BytesMut::from(&b"$5\r\nhel"[..]);
        assert_eq!(decoder.decode(&mut buf).unwrap(), None);
        assert_eq!(&buf[..], b"$5\r\nhel");
        buf.extend_from_slice(b"lo\r\n");
        assert_eq!(decoder.decode(&mut buf).unwrap(), Some(RespValue::bulk("hello")));
        assert!(buf.is_empty());
    }

    #[test]
    fn arbitrary_chunking_yields_same_values_as_whole_buffer() {
        let whole = b"*2\r\n$4\r\nPING\r\n:42\r\n".to_vec();
        let whole_values = decode_all(&whole);

        for split in 0..=whole.len() {
            let (a, b) = whole.split_at(split);
            let mut decoder = RespDecoder::new();
            let mut buf = BytesMut::from(a);
            let mut out = Vec::new();
            while let Some(v) = decoder.decode(&mut buf).unwrap() {
                out.push(v);
            }
            buf.extend_from_slice(b);
            while let Some(v) = decoder.decode(&mut buf).unwrap() {
                out.push(v);
            }
            assert_eq!(out, whole_values, "split at {split}");
        }
    }

    #[test]
    fn invalid_length_is_protocol_error() {
        let mut decoder = RespDecoder::new();
        let mut buf = BytesMut::from(&b"$-2\r\n"[..]);
        assert!(decoder.decode(&mut buf).is_err());
    }

    #[test]
    fn unknown_type_byte_is_protocol_error() {
        let mut decoder = RespDecoder::new();
        let mut buf = BytesMut::from(&b"@nope\r\n"[..]);
        assert!(decoder.decode(&mut buf).is_err());
    }
}
