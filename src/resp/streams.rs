//! Stream-domain aggregate decoders (`spec.md` §4.3, bit-exact positions).
//!
//! These sit on top of [`super::decode`]'s generic [`Decode`]/[`labelled_pair`]
//! primitives and know the specific shapes Redis Streams commands reply
//! with. There is no teacher or pack precedent for Streams specifically —
//! this module follows the decoding style established in `resp::decode`
//! (thiserror-backed `DecodeError`, `Composite` wrapping).

use std::collections::HashMap;

use super::decode::{labelled_pair, Decode, DecodeError};
use super::value::RespValue;

/// A single stream entry: `[id, hash]` where `hash` is an even-length
/// alternating key/value array.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEntry {
    pub id: String,
    pub fields: HashMap<String, String>,
}

impl Decode for StreamEntry {
    fn decode(value: &RespValue) -> Result<Self, DecodeError> {
        let items = match value {
            RespValue::Array(Some(items)) if items.len() == 2 => items,
            _ => {
                return Err(DecodeError::TypeMismatch {
                    expected_type: "[id, hash] stream entry",
                    got: super::decode::shape_of(value),
                })
            }
        };
        let id = String::decode(&items[0]).map_err(|e| e.composite("stream entry id", super::decode::shape_of(&items[0])))?;
        let fields = HashMap::<String, String>::decode(&items[1])
            .map_err(|e| e.composite("stream entry fields", super::decode::shape_of(&items[1])))?;
        Ok(StreamEntry { id, fields })
    }
}

/// The response to `XREAD`/`XREADGROUP`: an array of `[streamKey, [entry, ...]]`
/// pairs, or `Null` meaning "no data".
pub fn decode_xread_response(
    value: &RespValue,
) -> Result<HashMap<String, Vec<StreamEntry>>, DecodeError> {
    match value {
        RespValue::Array(None) | RespValue::BulkString(None) => Ok(HashMap::new()),
        RespValue::Array(Some(streams)) => {
            let mut out = HashMap::with_capacity(streams.len());
            for stream in streams {
                let pair = match stream {
                    RespValue::Array(Some(pair)) if pair.len() == 2 => pair,
                    other => {
                        return Err(DecodeError::TypeMismatch {
                            expected_type: "[streamKey, [entry, ...]] pair",
                            got: super::decode::shape_of(other),
                        })
                    }
                };
                let key = String::decode(&pair[0])
                    .map_err(|e| e.composite("stream key", super::decode::shape_of(&pair[0])))?;
                let entries = Vec::<StreamEntry>::decode(&pair[1])
                    .map_err(|e| e.composite("stream entries", super::decode::shape_of(&pair[1])))?;
                out.insert(key, entries);
            }
            Ok(out)
        }
        other => Err(DecodeError::TypeMismatch {
            expected_type: "XREAD response",
            got: super::decode::shape_of(other),
        }),
    }
}

/// `XINFO STREAM` reply: labelled pairs at offsets 0,2,4,6,8,10,12.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub length: i64,
    pub radix_tree_keys: i64,
    pub radix_tree_nodes: i64,
    pub groups: i64,
    pub last_generated_id: String,
    pub first_entry: Option<StreamEntry>,
    pub last_entry: Option<StreamEntry>,
}

impl Decode for StreamInfo {
    fn decode(value: &RespValue) -> Result<Self, DecodeError> {
        let items = as_array(value, "XINFO STREAM reply")?;
        Ok(StreamInfo {
            length: labelled_pair(items, 0, "length")?,
            radix_tree_keys: labelled_pair(items, 2, "radix-tree-keys")?,
            radix_tree_nodes: labelled_pair(items, 4, "radix-tree-nodes")?,
            groups: labelled_pair(items, 6, "groups")?,
            last_generated_id: labelled_pair(items, 8, "last-generated-id")?,
            first_entry: decode_optional_entry(items, 10, "first-entry")?,
            last_entry: decode_optional_entry(items, 12, "last-entry")?,
        })
    }
}

fn decode_optional_entry(
    items: &[RespValue],
    offset: usize,
    expected: &str,
) -> Result<Option<StreamEntry>, DecodeError> {
    let key_value = items
        .get(offset)
        .ok_or(DecodeError::IndexOutOfRange { index: offset, len: items.len() })?;
    let actual = String::decode(key_value).map_err(|e| e.composite("labelled key", super::decode::shape_of(key_value)))?;
    if actual != expected {
        return Err(DecodeError::KeyMismatch { expected: expected.to_string(), actual });
    }
    let value = items
        .get(offset + 1)
        .ok_or(DecodeError::IndexOutOfRange { index: offset + 1, len: items.len() })?;
    if value.is_null() {
        return Ok(None);
    }
    StreamEntry::decode(value)
        .map(Some)
        .map_err(|e| e.composite("stream entry", super::decode::shape_of(value)))
}

/// `XINFO GROUPS` element: keys `name`, `consumers`, `pending`,
/// `last-delivered-id` at offsets 0,2,4,6.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupInfo {
    pub name: String,
    pub consumers: i64,
    pub pending: i64,
    pub last_delivered_id: String,
}

impl Decode for GroupInfo {
    fn decode(value: &RespValue) -> Result<Self, DecodeError> {
        let items = as_array(value, "XINFO GROUPS element")?;
        Ok(GroupInfo {
            name: labelled_pair(items, 0, "name")?,
            consumers: labelled_pair(items, 2, "consumers")?,
            pending: labelled_pair(items, 4, "pending")?,
            last_delivered_id: labelled_pair(items, 6, "last-delivered-id")?,
        })
    }
}

/// `XINFO CONSUMERS` element: keys `name`, `pending`, `idle` at offsets 0,2,4.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumerInfo {
    pub name: String,
    pub pending: i64,
    pub idle: i64,
}

impl Decode for ConsumerInfo {
    fn decode(value: &RespValue) -> Result<Self, DecodeError> {
        let items = as_array(value, "XINFO CONSUMERS element")?;
        Ok(ConsumerInfo {
            name: labelled_pair(items, 0, "name")?,
            pending: labelled_pair(items, 2, "pending")?,
            idle: labelled_pair(items, 4, "idle")?,
        })
    }
}

/// `XPENDING` summary form: `[count, smallestId, greatestId, [[consumer,count], ...]]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSummary {
    pub count: i64,
    pub smallest_id: String,
    pub greatest_id: String,
    pub per_consumer: Vec<(String, i64)>,
}

/// Decodes an `XPENDING` summary reply. A zero `count` is reported as
/// `Ok(None)` at this optional layer, per `spec.md` §4.3.
pub fn decode_pending_summary(value: &RespValue) -> Result<Option<PendingSummary>, DecodeError> {
    let items = as_array(value, "XPENDING summary")?;
    if items.len() < 4 {
        return Err(DecodeError::IndexOutOfRange { index: 3, len: items.len() });
    }
    let count = i64::decode(&items[0]).map_err(|e| e.composite("pending count", super::decode::shape_of(&items[0])))?;
    if count == 0 {
        return Ok(None);
    }
    let smallest_id =
        String::decode(&items[1]).map_err(|e| e.composite("smallest id", super::decode::shape_of(&items[1])))?;
    let greatest_id =
        String::decode(&items[2]).map_err(|e| e.composite("greatest id", super::decode::shape_of(&items[2])))?;

    let per_consumer_items = as_array(&items[3], "per-consumer breakdown")?;
    let mut per_consumer = Vec::with_capacity(per_consumer_items.len());
    for entry in per_consumer_items {
        let pair = as_array(entry, "[consumer, count] pair")?;
        if pair.len() != 2 {
            return Err(DecodeError::TypeMismatch {
                expected_type: "[consumer, count] pair",
                got: super::decode::shape_of(entry),
            });
        }
        let consumer = String::decode(&pair[0]).map_err(|e| e.composite("consumer name", super::decode::shape_of(&pair[0])))?;
        let count = i64::decode(&pair[1]).map_err(|e| e.composite("consumer pending count", super::decode::shape_of(&pair[1])))?;
        per_consumer.push((consumer, count));
    }

    Ok(Some(PendingSummary {
        count,
        smallest_id,
        greatest_id,
        per_consumer,
    }))
}

/// `XPENDING` extended form: array of `[id, consumer, msSinceLast, deliveryCount]` tuples.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEntry {
    pub id: String,
    pub consumer: String,
    pub ms_since_last_delivery: i64,
    pub delivery_count: i64,
}

impl Decode for PendingEntry {
    fn decode(value: &RespValue) -> Result<Self, DecodeError> {
        let items = as_array(value, "XPENDING extended entry")?;
        if items.len() != 4 {
            return Err(DecodeError::TypeMismatch {
                expected_type: "[id, consumer, msSinceLast, deliveryCount]",
                got: super::decode::shape_of(value),
            });
        }
        Ok(PendingEntry {
            id: String::decode(&items[0]).map_err(|e| e.composite("pending entry id", super::decode::shape_of(&items[0])))?,
            consumer: String::decode(&items[1]).map_err(|e| e.composite("pending entry consumer", super::decode::shape_of(&items[1])))?,
            ms_since_last_delivery: i64::decode(&items[2]).map_err(|e| e.composite("ms since last delivery", super::decode::shape_of(&items[2])))?,
            delivery_count: i64::decode(&items[3]).map_err(|e| e.composite("delivery count", super::decode::shape_of(&items[3])))?,
        })
    }
}

fn as_array<'a>(value: &'a RespValue, expected_type: &'static str) -> Result<&'a [RespValue], DecodeError> {
    match value {
        RespValue::Array(Some(items)) => Ok(items),
        _ => Err(DecodeError::TypeMismatch {
            expected_type,
            got: super::decode::shape_of(value),
        }),
    }
}
