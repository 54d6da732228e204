//! Event ID generation.
//!
//! ID generation is an injected capability rather than an implicit global
//! call, so templates and editors can be exercised deterministically in
//! tests.

use std::cell::Cell;

use ulid::Ulid;

/// A source of unique event identifiers.
pub trait IdGenerator {
    /// Produce the next unique identifier.
    fn next_id(&self) -> String;
}

/// Production ID generator backed by ULIDs.
///
/// ULIDs are 26-character, time-ordered and collision-resistant, matching
/// the ID format the AgenticBilling API expects for CloudEvents ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UlidIds;

impl IdGenerator for UlidIds {
    fn next_id(&self) -> String {
        Ulid::new().to_string()
    }
}

/// Deterministic ID generator for tests and scripted runs.
///
/// Produces `"<prefix>-0"`, `"<prefix>-1"`, ... in call order.
#[derive(Debug, Default)]
pub struct SequenceIds {
    prefix: String,
    counter: Cell<u64>,
}

impl SequenceIds {
    /// Create a generator with the given prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Cell::new(0),
        }
    }
}

impl IdGenerator for SequenceIds {
    fn next_id(&self) -> String {
        let n = self.counter.get();
        self.counter.set(n + 1);
        format!("{}-{n}", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ulid_ids_are_unique_and_26_chars() {
        let ids = UlidIds;
        let a = ids.next_id();
        let b = ids.next_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 26);
    }

    #[test]
    fn sequence_ids_count_up() {
        let ids = SequenceIds::new("evt");
        assert_eq!(ids.next_id(), "evt-0");
        assert_eq!(ids.next_id(), "evt-1");
        assert_eq!(ids.next_id(), "evt-2");
    }
}
