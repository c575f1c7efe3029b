//! Entry id generators.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::foundation::EntryId;
use crate::ports::IdGenerator;

/// Random UUID v4 ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> EntryId {
        EntryId::random()
    }
}

/// Predictable ids (`entry-000001`, `entry-000002`, ...) for tests.
///
/// Zero padding keeps id order equal to creation order.
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
    fn next_id(&self) -> EntryId {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        EntryId::from_generated(format!("entry-{:06}", n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_ids_are_ordered() {
        let ids = SequentialIdGenerator::new();
        let first = ids.next_id();
        let second = ids.next_id();

        assert_eq!(first.as_str(), "entry-000001");
        assert!(first < second);
    }

    #[test]
    fn uuid_ids_are_unique() {
        assert_ne!(UuidIdGenerator.next_id(), UuidIdGenerator.next_id());
    }
}
