//! The one Pub/Sub command that doesn't need a mode transition.
//!
//! `SUBSCRIBE`/`PSUBSCRIBE`/`UNSUBSCRIBE`/`PUNSUBSCRIBE` live on [`Client`]
//! directly (`spec.md` §4.5) since they change which pipeline interprets
//! inbound frames; `PUBLISH` is an ordinary request/response command a
//! publisher can send without ever entering Pub/Sub mode itself.

use crate::client::{arg, Client};
use crate::error::CommandError;

pub async fn publish(client: &Client, channel: &str, message: &str) -> Result<i64, CommandError> {
    client.command("PUBLISH", &[arg(channel), arg(message)]).await
}
