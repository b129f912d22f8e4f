//! RESP2 command encoding: argv -> the multi-bulk wire form.
//!
//! Mirrors the teacher's `RespType::to_bytes` (`examples/yash-jain-1-muDB/src/resp/types.rs`)
//! and `Encoder for RespCommandFrame` (`.../frame.rs`), but encodes a whole
//! command's argument vector at once rather than a single reply value,
//! since a client only ever writes commands, never arbitrary RESP values.

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::Encoder;

use super::value::RespValue;
use super::ProtocolError;

/// Renders a Rust value as the bulk-string bytes RESP2 expects as a
/// command argument.
///
/// Integers and floats are stringified in canonical form (`-?[0-9]+` for
/// integers, full-precision decimal for floats) per `spec.md` §4.2.
pub trait ToResp {
    fn to_resp_bytes(&self) -> Bytes;
}

impl ToResp for Bytes {
    fn to_resp_bytes(&self) -> Bytes {
        self.clone()
    }
}

impl ToResp for Vec<u8> {
    fn to_resp_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl ToResp for &[u8] {
    fn to_resp_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl ToResp for str {
    fn to_resp_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToResp for String {
    fn to_resp_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToResp for &str {
    fn to_resp_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

macro_rules! impl_to_resp_for_int {
    ($($t:ty),*) => {
        $(
            impl ToResp for $t {
                fn to_resp_bytes(&self) -> Bytes {
                    Bytes::from(self.to_string().into_bytes())
                }
            }
        )*
    };
}

impl_to_resp_for_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl ToResp for f64 {
    fn to_resp_bytes(&self) -> Bytes {
        // `{}` already round-trips finite f64s through the shortest
        // representation that parses back to the same value, matching
        // "full precision, no exponent normalisation beyond what a
        // round-trip requires" (spec.md §4.2).
        Bytes::from(format!("{self}").into_bytes())
    }
}

impl ToResp for f32 {
    fn to_resp_bytes(&self) -> Bytes {
        Bytes::from(format!("{self}").into_bytes())
    }
}

/// Build a command's argv as bulk-string [`Bytes`] from any mix of
/// [`ToResp`]-implementing arguments. The verb itself should already be
/// uppercase ASCII, per `spec.md` §3 ("the first element being the command
/// name in uppercase ASCII").
pub fn build_argv(verb: &str, args: &[Bytes]) -> Vec<Bytes> {
    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push(Bytes::copy_from_slice(verb.as_bytes()));
    argv.extend_from_slice(args);
    argv
}

/// Serializes a command's argv into the RESP2 "array of bulk strings"
/// wire form: `*N\r\n` followed by `$len\r\n<bytes>\r\n` per argument.
pub fn encode_command(argv: &[Bytes], dst: &mut BytesMut) {
    dst.reserve(argv.iter().map(|a| a.len() + 16).sum::<usize>() + 16);
    dst.put_slice(format!("*{}\r\n", argv.len()).as_bytes());
    for arg in argv {
        dst.put_slice(format!("${}\r\n", arg.len()).as_bytes());
        dst.put_slice(arg);
        dst.put_slice(b"\r\n");
    }
}

/// A [`tokio_util::codec::Encoder`] that writes a command's argv in the
/// multi-bulk wire form. Paired with [`super::RespDecoder`] on a `Framed`
/// connection, this is the write half of the codec described in `spec.md`
/// §4.2 (C3).
#[derive(Default)]
pub struct CommandEncoder;

impl Encoder<Vec<Bytes>> for CommandEncoder {
    type Error = ProtocolError;

    fn encode(&mut self, argv: Vec<Bytes>, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        encode_command(&argv, dst);
        Ok(())
    }
}

/// Encode a single already-built [`RespValue`] (only `BulkString`/`Array`
/// forms make sense as a command), used by tests exercising the
/// round-trip property in `spec.md` §8.
pub fn encode_value(value: &RespValue, dst: &mut BytesMut) {
    match value {
        RespValue::SimpleString(s) => {
            dst.put_u8(b'+');
            dst.put_slice(s.as_bytes());
            dst.put_slice(b"\r\n");
        }
        RespValue::Error(s) => {
            dst.put_u8(b'-');
            dst.put_slice(s.as_bytes());
            dst.put_slice(b"\r\n");
        }
        RespValue::Integer(n) => {
            dst.put_slice(format!(":{n}\r\n").as_bytes());
        }
        RespValue::BulkString(None) => dst.put_slice(b"$-1\r\n"),
        RespValue::BulkString(Some(bytes)) => {
            dst.put_slice(format!("${}\r\n", bytes.len()).as_bytes());
            dst.put_slice(bytes);
            dst.put_slice(b"\r\n");
        }
        RespValue::Array(None) => dst.put_slice(b"*-1\r\n"),
        RespValue::Array(Some(items)) => {
            dst.put_slice(format!("*{}\r\n", items.len()).as_bytes());
            for item in items {
                encode_value(item, dst);
            }
        }
    }
}
