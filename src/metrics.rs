//! The metrics sink consumed by the pipeline (`spec.md` §6).
//!
//! Exactly two named, process-global counters, incremented with atomic
//! increment per completed command — no crate pulls these in across the
//! example pack, so they're the "plain counters" the spec calls for,
//! implemented directly on `std::sync::atomic`.

use std::sync::atomic::{AtomicU64, Ordering};

static SUCCESSFUL_COMMANDS: AtomicU64 = AtomicU64::new(0);
static FAILED_COMMANDS: AtomicU64 = AtomicU64::new(0);

pub fn record_success() {
    SUCCESSFUL_COMMANDS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_failure() {
    FAILED_COMMANDS.fetch_add(1, Ordering::Relaxed);
}

/// A point-in-time read of both counters, mostly useful for tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub successful: u64,
    pub failed: u64,
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        successful: SUCCESSFUL_COMMANDS.load(Ordering::Relaxed),
        failed: FAILED_COMMANDS.load(Ordering::Relaxed),
    }
}
