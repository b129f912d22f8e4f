//! Key/value and connection-housekeeping commands.

use crate::client::{arg, Client};
use crate::error::CommandError;

pub async fn ping(client: &Client) -> Result<String, CommandError> {
    client.command("PING", &[]).await
}

pub async fn get(client: &Client, key: &str) -> Result<Option<String>, CommandError> {
    use crate::resp::DecodeOptional;
    let reply = client.submit(crate::resp::encoder::build_argv("GET", &[arg(key)])).await?;
    String::decode_optional(&reply).map_err(CommandError::from)
}

pub async fn set(client: &Client, key: &str, value: &str) -> Result<bool, CommandError> {
    client.command("SET", &[arg(key), arg(value)]).await
}

pub async fn del(client: &Client, keys: &[String]) -> Result<i64, CommandError> {
    let args: Vec<_> = keys.iter().map(|k| arg(k.as_str())).collect();
    client.command("DEL", &args).await
}

pub async fn exists(client: &Client, keys: &[String]) -> Result<i64, CommandError> {
    let args: Vec<_> = keys.iter().map(|k| arg(k.as_str())).collect();
    client.command("EXISTS", &args).await
}

pub async fn expire(client: &Client, key: &str, seconds: i64) -> Result<bool, CommandError> {
    let reply = client.submit(crate::resp::encoder::build_argv("EXPIRE", &[arg(key), arg(seconds)])).await?;
    Ok(matches!(reply, crate::resp::RespValue::Integer(1)))
}

pub async fn incr(client: &Client, key: &str) -> Result<i64, CommandError> {
    client.command("INCR", &[arg(key)]).await
}
