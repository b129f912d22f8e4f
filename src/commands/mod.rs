//! Typed verb wrappers over [`crate::Client::command`].
//!
//! Deliberately not exhaustive of the Redis command set — this mirrors the
//! open-ended `command/` module the teacher ships
//! (`examples/yash-jain-1-muDB/src/command/mod.rs`), just client-side:
//! each wrapper renders its argv, submits it, and decodes the reply with
//! the typed layer in [`crate::resp::decode`]/[`crate::resp::streams`].
//! Anything not covered here is still reachable through
//! [`crate::Client::command`] directly.

pub mod pubsub;
pub mod strings;
pub mod streams;

pub use pubsub::publish;
pub use strings::{del, exists, expire, get, incr, ping, set};
pub use streams::{
    xack, xadd, xclaim, xgroup_create, xinfo_stream, xlen, xpending, xpending_extended, xrange, xread, xreadgroup,
};
