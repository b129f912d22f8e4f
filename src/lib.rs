//! A non-blocking RESP2 client library for Redis-compatible servers.
//!
//! Three layers, bottom to top:
//! - [`resp`]: the wire codec — [`resp::RespValue`], the streaming decoder
//!   and command encoder, and the typed decode layer built on top of them.
//! - [`pipeline`]: the FIFO command pipeline and Pub/Sub mode handler that
//!   share one connection's in-flight queue, plus the `select!`-driven
//!   connection loop that ties them to a transport.
//! - [`client`] and [`commands`]: a thin, typed convenience surface over
//!   the pipeline for callers who don't want to build argv by hand.

pub mod client;
pub mod commands;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod resp;
pub mod transport;

pub use client::Client;
pub use error::CommandError;
pub use resp::{Decode, DecodeError, DecodeOptional, ProtocolError, RespValue};
