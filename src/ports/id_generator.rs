//! Entry id generation port.

use crate::domain::foundation::EntryId;

/// Supplies ids for entries created without a caller-chosen id.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> EntryId;
}
