//! Command pipelining and Pub/Sub mode (`spec.md` §3–§5, components C5–C6)
//! plus the connection driver that ties them to a real transport.

pub mod command;
pub mod connection;
pub mod core;
pub mod pubsub;
pub mod queue;

pub use command::{Command, Completion};
pub use connection::{Connection, ConnectionHandle};
pub use core::{dispatch_to_queue, CommandPipeline, Outcome};
pub use pubsub::{Callback, PubSubOutcome, PubSubPipeline, SubscriptionId};
pub use queue::{transplant, InFlightQueue};
