//! Redis Streams commands (`XADD`, `XREAD`, consumer groups, pending entries).

use std::collections::HashMap;

use crate::client::{arg, Client};
use crate::error::CommandError;
use crate::resp::encoder::build_argv;
use crate::resp::streams::{decode_pending_summary, PendingEntry, PendingSummary, StreamEntry, StreamInfo};
use crate::resp::{Decode, RespValue};

pub async fn xadd(
    client: &Client,
    stream: &str,
    id: &str,
    fields: &[(String, String)],
) -> Result<String, CommandError> {
    let mut args = vec![arg(stream), arg(id)];
    for (field, value) in fields {
        args.push(arg(field.as_str()));
        args.push(arg(value.as_str()));
    }
    client.command("XADD", &args).await
}

pub async fn xlen(client: &Client, stream: &str) -> Result<i64, CommandError> {
    client.command("XLEN", &[arg(stream)]).await
}

/// `XREAD [COUNT n] STREAMS key... id...`. `streams` pairs each key with
/// the id to read after, matching the order the wire command needs —
/// deliberately `&[(String, String)]` rather than a `HashMap`, since a
/// map's iteration order isn't guaranteed to put keys and ids in matching
/// positions across the two halves of the `STREAMS` argument list.
pub async fn xread(
    client: &Client,
    count: Option<i64>,
    streams: &[(String, String)],
) -> Result<HashMap<String, Vec<StreamEntry>>, CommandError> {
    let mut args = Vec::new();
    if let Some(count) = count {
        args.push(arg("COUNT"));
        args.push(arg(count));
    }
    args.push(arg("STREAMS"));
    for (key, _) in streams {
        args.push(arg(key.as_str()));
    }
    for (_, id) in streams {
        args.push(arg(id.as_str()));
    }
    let reply = client.submit(build_argv("XREAD", &args)).await?;
    crate::resp::streams::decode_xread_response(&reply).map_err(CommandError::from)
}

pub async fn xrange(
    client: &Client,
    stream: &str,
    start: &str,
    end: &str,
    count: Option<i64>,
) -> Result<Vec<StreamEntry>, CommandError> {
    let mut args = vec![arg(stream), arg(start), arg(end)];
    if let Some(count) = count {
        args.push(arg("COUNT"));
        args.push(arg(count));
    }
    client.command("XRANGE", &args).await
}

pub async fn xinfo_stream(client: &Client, stream: &str) -> Result<StreamInfo, CommandError> {
    client.command("XINFO", &[arg("STREAM"), arg(stream)]).await
}

pub async fn xgroup_create(client: &Client, stream: &str, group: &str, id: &str) -> Result<(), CommandError> {
    let reply = client
        .submit(build_argv("XGROUP", &[arg("CREATE"), arg(stream), arg(group), arg(id)]))
        .await?;
    match reply {
        RespValue::SimpleString(s) if s == "OK" => Ok(()),
        other => Err(CommandError::Decode(crate::resp::DecodeError::TypeMismatch {
            expected_type: "simple string OK",
            got: crate::resp::decode::shape_of(&other),
        })),
    }
}

pub async fn xreadgroup(
    client: &Client,
    group: &str,
    consumer: &str,
    count: Option<i64>,
    streams: &[(String, String)],
) -> Result<HashMap<String, Vec<StreamEntry>>, CommandError> {
    let mut args = vec![arg("GROUP"), arg(group), arg(consumer)];
    if let Some(count) = count {
        args.push(arg("COUNT"));
        args.push(arg(count));
    }
    args.push(arg("STREAMS"));
    for (key, _) in streams {
        args.push(arg(key.as_str()));
    }
    for (_, id) in streams {
        args.push(arg(id.as_str()));
    }
    let reply = client.submit(build_argv("XREADGROUP", &args)).await?;
    crate::resp::streams::decode_xread_response(&reply).map_err(CommandError::from)
}

pub async fn xack(client: &Client, stream: &str, group: &str, ids: &[String]) -> Result<i64, CommandError> {
    let mut args = vec![arg(stream), arg(group)];
    args.extend(ids.iter().map(|id| arg(id.as_str())));
    client.command("XACK", &args).await
}

pub async fn xpending(client: &Client, stream: &str, group: &str) -> Result<Option<PendingSummary>, CommandError> {
    let reply = client.submit(build_argv("XPENDING", &[arg(stream), arg(group)])).await?;
    decode_pending_summary(&reply).map_err(CommandError::from)
}

/// `XPENDING key group start end count`: the extended form listing each
/// pending entry individually rather than summarizing them.
pub async fn xpending_extended(
    client: &Client,
    stream: &str,
    group: &str,
    start: &str,
    end: &str,
    count: i64,
) -> Result<Vec<PendingEntry>, CommandError> {
    client
        .command("XPENDING", &[arg(stream), arg(group), arg(start), arg(end), arg(count)])
        .await
}

/// `XCLAIM` with `min_idle_time` (milliseconds) against `ids`, returning the
/// claimed entries in the same `[id, fields]` shape `XRANGE` uses.
///
/// `retry_count`, if given, is appended as a single `RETRYCOUNT <n>` pair
/// applying to the whole call — `XCLAIM` has no per-id retry count option,
/// so unlike `ids` this is never repeated per entry.
pub async fn xclaim(
    client: &Client,
    stream: &str,
    group: &str,
    consumer: &str,
    min_idle_time: i64,
    ids: &[String],
    retry_count: Option<i64>,
) -> Result<Vec<StreamEntry>, CommandError> {
    let mut args = vec![arg(stream), arg(group), arg(consumer), arg(min_idle_time)];
    args.extend(ids.iter().map(|id| arg(id.as_str())));
    if let Some(retry_count) = retry_count {
        args.push(arg("RETRYCOUNT"));
        args.push(arg(retry_count));
    }
    let reply = client.submit(build_argv("XCLAIM", &args)).await?;
    Vec::<StreamEntry>::decode(&reply).map_err(CommandError::from)
}
