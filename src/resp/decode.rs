//! Typed decode layer (`spec.md` §4.3, component C4).
//!
//! Two contracts are exposed, deliberately kept separate per the design
//! note in `spec.md` §9 ("optional decoding distinguished from absent
//! value"): [`Decode`] always returns `T` or fails, [`DecodeOptional`]
//! returns `Option<T>` or fails, where `Ok(None)` models a protocol-level
//! null distinct from a decode failure.

use std::collections::HashMap;

use thiserror::Error;

use super::value::RespValue;

/// Everything that can go wrong turning a [`RespValue`] into a domain type.
///
/// Grounded on the `thiserror` taxonomy style used across the example
/// pack (e.g. `examples/ivanbgd-redis-server-rust/src/errors.rs`), since
/// the teacher's own hand-rolled `RespError` has no source-chaining and
/// `Composite` needs one.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    /// An aggregate (array) was shorter than the decoder expected.
    #[error("index {index} out of range for an aggregate of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A labelled-field response (e.g. XINFO STREAM) had the wrong key at
    /// a known offset.
    #[error("expected key {expected:?} at this offset, got {actual:?}")]
    KeyMismatch { expected: String, actual: String },

    /// The wire shape cannot produce the target type.
    #[error("expected {expected_type}, got {got}")]
    TypeMismatch { expected_type: &'static str, got: String },

    /// An inner decode failed while traversing an aggregate decoder.
    #[error("failed decoding {expected_type} (got {got}): {cause}")]
    Composite {
        expected_type: &'static str,
        got: String,
        #[source]
        cause: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Wrap `self` as the cause of a composite failure while decoding an
    /// aggregate of `expected_type`, annotated with what the aggregate's
    /// own wire shape looked like (`got`).
    pub fn composite(self, expected_type: &'static str, got: impl Into<String>) -> DecodeError {
        DecodeError::Composite {
            expected_type,
            got: got.into(),
            cause: Box::new(self),
        }
    }
}

/// A short, human-readable tag for a value's wire shape, used in error
/// messages (`TypeMismatch::got`, `KeyMismatch::actual`, ...).
pub fn shape_of(value: &RespValue) -> String {
    match value {
        RespValue::SimpleString(s) => format!("SimpleString({s:?})"),
        RespValue::Error(e) => format!("Error({e:?})"),
        RespValue::Integer(n) => format!("Integer({n})"),
        RespValue::BulkString(None) => "BulkString(nil)".to_string(),
        RespValue::BulkString(Some(b)) => format!("BulkString({} bytes)", b.len()),
        RespValue::Array(None) => "Array(nil)".to_string(),
        RespValue::Array(Some(items)) => format!("Array({} items)", items.len()),
    }
}

/// Total decode: always produces a `T` or fails.
pub trait Decode: Sized {
    fn decode(value: &RespValue) -> Result<Self, DecodeError>;
}

/// Partial decode: a protocol-level null is `Ok(None)`, distinct from a
/// genuine decode failure.
pub trait DecodeOptional: Sized {
    fn decode_optional(value: &RespValue) -> Result<Option<Self>, DecodeError>;
}

/// Any type implementing the total [`Decode`] contract gets the optional
/// one for free: a wire-level null decodes to `None`, anything else goes
/// through the total decoder.
impl<T: Decode> DecodeOptional for T {
    fn decode_optional(value: &RespValue) -> Result<Option<T>, DecodeError> {
        if value.is_null() {
            return Ok(None);
        }
        T::decode(value).map(Some)
    }
}

impl Decode for i64 {
    fn decode(value: &RespValue) -> Result<Self, DecodeError> {
        match value {
            RespValue::Integer(n) => Ok(*n),
            RespValue::BulkString(Some(b)) => std::str::from_utf8(b)
                .ok()
                .and_then(|s| s.trim().parse::<i64>().ok())
                .ok_or_else(|| DecodeError::TypeMismatch {
                    expected_type: "integer",
                    got: shape_of(value),
                }),
            RespValue::SimpleString(s) => s.trim().parse::<i64>().map_err(|_| DecodeError::TypeMismatch {
                expected_type: "integer",
                got: shape_of(value),
            }),
            _ => Err(DecodeError::TypeMismatch {
                expected_type: "integer",
                got: shape_of(value),
            }),
        }
    }
}

impl Decode for String {
    fn decode(value: &RespValue) -> Result<Self, DecodeError> {
        match value {
            RespValue::SimpleString(s) => Ok(s.clone()),
            RespValue::BulkString(Some(b)) => String::from_utf8(b.to_vec()).map_err(|_| DecodeError::TypeMismatch {
                expected_type: "utf8 string",
                got: shape_of(value),
            }),
            _ => Err(DecodeError::TypeMismatch {
                expected_type: "string",
                got: shape_of(value),
            }),
        }
    }
}

/// Raw, non-UTF8-checked bytes. Only a non-null `BulkString` can produce
/// this — a caller wanting to distinguish "absent" should use
/// [`DecodeOptional`].
pub struct RawBytes(pub bytes::Bytes);

impl Decode for RawBytes {
    fn decode(value: &RespValue) -> Result<Self, DecodeError> {
        match value {
            RespValue::BulkString(Some(b)) => Ok(RawBytes(b.clone())),
            _ => Err(DecodeError::TypeMismatch {
                expected_type: "bulk string",
                got: shape_of(value),
            }),
        }
    }
}

impl Decode for bool {
    fn decode(value: &RespValue) -> Result<Self, DecodeError> {
        match value {
            RespValue::Integer(1) => Ok(true),
            RespValue::Integer(0) => Ok(false),
            RespValue::SimpleString(s) if s == "OK" => Ok(true),
            _ => Err(DecodeError::TypeMismatch {
                expected_type: "boolean",
                got: shape_of(value),
            }),
        }
    }
}

impl Decode for f64 {
    fn decode(value: &RespValue) -> Result<Self, DecodeError> {
        let text = String::decode(value).map_err(|e| e.composite("float", shape_of(value)))?;
        text.trim()
            .parse::<f64>()
            .map_err(|_| DecodeError::TypeMismatch {
                expected_type: "float",
                got: shape_of(value),
            })
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(value: &RespValue) -> Result<Self, DecodeError> {
        match value {
            RespValue::Array(Some(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    T::decode(item).map_err(|e| e.composite("sequence element", format!("index {i}")))
                })
                .collect(),
            _ => Err(DecodeError::TypeMismatch {
                expected_type: "array",
                got: shape_of(value),
            }),
        }
    }
}

/// An `Array` of even length interpreted as alternating key/value pairs,
/// decoded into a `HashMap<String, T>`.
impl<T: Decode> Decode for HashMap<String, T> {
    fn decode(value: &RespValue) -> Result<Self, DecodeError> {
        match value {
            RespValue::Array(Some(items)) => {
                if items.len() % 2 != 0 {
                    return Err(DecodeError::TypeMismatch {
                        expected_type: "even-length key/value array",
                        got: shape_of(value),
                    });
                }
                let mut map = HashMap::with_capacity(items.len() / 2);
                for pair in items.chunks_exact(2) {
                    let key = String::decode(&pair[0])
                        .map_err(|e| e.composite("mapping key", shape_of(&pair[0])))?;
                    let val = T::decode(&pair[1])
                        .map_err(|e| e.composite("mapping value", shape_of(&pair[1])))?;
                    map.insert(key, val);
                }
                Ok(map)
            }
            _ => Err(DecodeError::TypeMismatch {
                expected_type: "array",
                got: shape_of(value),
            }),
        }
    }
}

/// Read `(key, value)` at a fixed pair-offset in a flat labelled-response
/// array (`[k1, v1, k2, v2, ...]`) and enforce `key == expected`.
///
/// Underpins every stream-info decoder in [`super::streams`].
pub fn labelled_pair<T: Decode>(
    items: &[RespValue],
    offset: usize,
    expected: &str,
) -> Result<T, DecodeError> {
    let key_value = items
        .get(offset)
        .ok_or(DecodeError::IndexOutOfRange { index: offset, len: items.len() })?;
    let actual = String::decode(key_value)
        .map_err(|e| e.composite("labelled key", shape_of(key_value)))?;
    if actual != expected {
        return Err(DecodeError::KeyMismatch {
            expected: expected.to_string(),
            actual,
        });
    }
    let value = items
        .get(offset + 1)
        .ok_or(DecodeError::IndexOutOfRange { index: offset + 1, len: items.len() })?;
    T::decode(value).map_err(|e| e.composite("labelled value", shape_of(value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_from_integer_and_bulk_string() {
        assert_eq!(i64::decode(&RespValue::Integer(7)).unwrap(), 7);
        assert_eq!(i64::decode(&RespValue::bulk("7")).unwrap(), 7);
        assert_eq!(i64::decode(&RespValue::SimpleString("7".into())).unwrap(), 7);
    }

    #[test]
    fn boolean_decoding_rules() {
        assert!(bool::decode(&RespValue::Integer(1)).unwrap());
        assert!(!bool::decode(&RespValue::Integer(0)).unwrap());
        assert!(bool::decode(&RespValue::SimpleString("OK".into())).unwrap());
        assert!(bool::decode(&RespValue::SimpleString("NOTOK".into())).is_err());
    }

    #[test]
    fn optional_decode_distinguishes_null_from_failure() {
        assert_eq!(String::decode_optional(&RespValue::null_bulk()).unwrap(), None);
        assert_eq!(
            String::decode_optional(&RespValue::bulk("hi")).unwrap(),
            Some("hi".to_string())
        );
        assert!(String::decode_optional(&RespValue::Integer(1)).is_err());
    }

    #[test]
    fn sequence_decode_element_wise() {
        let arr = RespValue::Array(Some(vec![RespValue::Integer(1), RespValue::Integer(2)]));
        assert_eq!(Vec::<i64>::decode(&arr).unwrap(), vec![1, 2]);
    }

    #[test]
    fn mapping_decode_alternating_kv() {
        let arr = RespValue::Array(Some(vec![
            RespValue::bulk("a"),
            RespValue::Integer(1),
            RespValue::bulk("b"),
            RespValue::Integer(2),
        ]));
        let map = HashMap::<String, i64>::decode(&arr).unwrap();
        assert_eq!(map.get("a"), Some(&1));
        assert_eq!(map.get("b"), Some(&2));
    }

    #[test]
    fn labelled_pair_matches_spec_example() {
        let items = vec![
            RespValue::bulk("length"),
            RespValue::Integer(1),
            RespValue::bulk("groups"),
            RespValue::Integer(2),
            RespValue::bulk("bogus"),
            RespValue::Integer(3),
        ];
        assert_eq!(labelled_pair::<i64>(&items, 2, "groups").unwrap(), 2);

        match labelled_pair::<i64>(&items, 2, "length") {
            Err(DecodeError::KeyMismatch { expected, actual }) => {
                assert_eq!(expected, "length");
                assert_eq!(actual, "groups");
            }
            other => panic!("expected KeyMismatch, got {other:?}"),
        }
    }
}
