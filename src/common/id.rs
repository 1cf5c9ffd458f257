//! Identifier generation.
//!
//! Execution and node-execution ids are produced by an injected
//! [`IdGenerator`] so that runs can be made fully deterministic in tests.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of unique identifiers for execution records.
pub trait IdGenerator: Send + Sync {
    /// Returns a new identifier. `prefix` names the kind of record, e.g. `exec`.
    fn next_id(
        &self,
        prefix: &str,
    ) -> String;
}

/// Random 21 character ids from nanoid.
#[derive(Debug, Clone, Default)]
pub struct NanoIdGenerator;

impl IdGenerator for NanoIdGenerator {
    fn next_id(
        &self,
        prefix: &str,
    ) -> String {
        format!("{}_{}", prefix, nanoid::nanoid!())
    }
}

/// Monotonic counter ids: `exec_1`, `nexec_2`, ...
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(
        &self,
        prefix: &str,
    ) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}_{}", prefix, n)
    }
}
