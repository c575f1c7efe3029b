//! Entries adapter port.
//!
//! The storage-agnostic contract every entry backend implements. Contract
//! tests in `tests/entries_contract.rs` run unmodified against each backend.
//!
//! # Design
//!
//! - **Clock-stamped**: implementations stamp writes through an injected
//!   `Clock`, never ambient time
//! - **Soft deletes**: entries are never physically removed by normal
//!   operation
//! - **Materialised listings**: `list` returns a complete `Vec`

use async_trait::async_trait;

use crate::domain::entry::{
    Entry, EntryError, EntryFilter, EntryPatch, EntrySnapshot, MarkSyncedOutcome, NewEntry,
    PullOutcome,
};
use crate::domain::foundation::{AccountId, EntryId, Timestamp};

#[async_trait]
pub trait EntriesAdapter: Send + Sync {
    /// Create a new dirty entry.
    ///
    /// # Errors
    ///
    /// - `Validation` if adversity or belief is blank, or if a caller-supplied
    ///   id already exists (tombstones included)
    async fn create(&self, draft: NewEntry) -> Result<Entry, EntryError>;

    /// Merge a patch onto an existing entry.
    ///
    /// The patch's expected inputs, if any, are checked against the stored
    /// entry in the same atomic step as the write.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the id does not exist
    /// - `Validation` if a required field is set blank
    /// - `Deleted` / `InputsChanged` if the expected inputs no longer hold
    async fn update(&self, id: &EntryId, patch: EntryPatch) -> Result<Entry, EntryError>;

    /// Turn an entry into a dirty tombstone. Idempotent on tombstones.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the id does not exist
    async fn soft_delete(&self, id: &EntryId) -> Result<Entry, EntryError>;

    /// Find an entry by id, tombstones included.
    async fn get_by_id(&self, id: &EntryId) -> Result<Option<Entry>, EntryError>;

    /// List the entries matching `filter`, in the filter's order.
    async fn list(&self, filter: EntryFilter) -> Result<Vec<Entry>, EntryError>;

    /// Acknowledge that the state pushed at `synced_at` reached the remote.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the id does not exist
    async fn mark_synced(
        &self,
        id: &EntryId,
        synced_at: Timestamp,
    ) -> Result<MarkSyncedOutcome, EntryError>;

    /// Apply a version pulled from the remote.
    ///
    /// # Errors
    ///
    /// - `Validation` if the snapshot violates an entry invariant
    async fn apply_remote(&self, remote: EntrySnapshot) -> Result<PullOutcome, EntryError>;

    /// Assign every unclaimed entry to `account_id`. Returns how many changed.
    async fn claim_unowned(&self, account_id: &AccountId) -> Result<usize, EntryError> {
        let unclaimed = self.list(EntryFilter::unclaimed()).await?;
        for entry in &unclaimed {
            self.update(entry.id(), EntryPatch::new().account(Some(account_id.clone())))
                .await?;
        }
        Ok(unclaimed.len())
    }

    /// Count the entries matching `filter`.
    async fn count(&self, filter: EntryFilter) -> Result<usize, EntryError> {
        Ok(self.list(filter).await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_adapter_is_object_safe() {
        fn _accepts_dyn(_adapter: &dyn EntriesAdapter) {}
    }
}
