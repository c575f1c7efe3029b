//! In-memory entries adapter.
//!
//! Holds domain entries in a map. Each operation runs under a single write
//! lock, so the read-modify-write of an update is atomic with respect to
//! other callers.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entry::{
    Entry, EntryError, EntryFilter, EntryPatch, EntrySnapshot, MarkSyncedOutcome, NewEntry,
    PullOutcome,
};
use crate::domain::foundation::{EntryId, Timestamp, ValidationError};
use crate::ports::{Clock, EntriesAdapter, IdGenerator};

#[derive(Clone)]
pub struct InMemoryEntriesAdapter {
    entries: Arc<RwLock<HashMap<EntryId, Entry>>>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl InMemoryEntriesAdapter {
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            clock,
            ids,
        }
    }

    /// Remove every entry.
    pub async fn wipe(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl EntriesAdapter for InMemoryEntriesAdapter {
    async fn create(&self, draft: NewEntry) -> Result<Entry, EntryError> {
        draft.validate()?;

        let mut entries = self.entries.write().await;
        let id = match draft.id.clone() {
            Some(id) => id,
            None => self.ids.next_id(),
        };
        if entries.contains_key(&id) {
            return Err(ValidationError::already_exists("id", id.as_str()).into());
        }

        let entry = Entry::create(id, draft, self.clock.now())?;
        entries.insert(entry.id().clone(), entry.clone());
        tracing::debug!(entry_id = %entry.id(), "Created entry");
        Ok(entry)
    }

    async fn update(&self, id: &EntryId, patch: EntryPatch) -> Result<Entry, EntryError> {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(id).ok_or_else(|| EntryError::not_found(id))?;

        let mut updated = entry.clone();
        if updated.apply_patch(patch, self.clock.now())? {
            *entry = updated.clone();
            tracing::debug!(entry_id = %id, "Updated entry");
        }
        Ok(updated)
    }

    async fn soft_delete(&self, id: &EntryId) -> Result<Entry, EntryError> {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(id).ok_or_else(|| EntryError::not_found(id))?;

        let mut deleted = entry.clone();
        if deleted.soft_delete(self.clock.now())? {
            *entry = deleted.clone();
            tracing::debug!(entry_id = %id, "Soft-deleted entry");
        }
        Ok(deleted)
    }

    async fn get_by_id(&self, id: &EntryId) -> Result<Option<Entry>, EntryError> {
        Ok(self.entries.read().await.get(id).cloned())
    }

    async fn list(&self, filter: EntryFilter) -> Result<Vec<Entry>, EntryError> {
        let entries = self.entries.read().await;
        Ok(filter.apply(entries.values().cloned()))
    }

    async fn mark_synced(
        &self,
        id: &EntryId,
        synced_at: Timestamp,
    ) -> Result<MarkSyncedOutcome, EntryError> {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(id).ok_or_else(|| EntryError::not_found(id))?;

        let mut acked = entry.clone();
        let decision = acked.acknowledge_sync(synced_at)?;
        *entry = acked.clone();
        Ok(MarkSyncedOutcome::from_decision(acked, decision))
    }

    async fn apply_remote(&self, remote: EntrySnapshot) -> Result<PullOutcome, EntryError> {
        let remote = Entry::from_remote(remote)?;

        let mut entries = self.entries.write().await;
        let outcome = PullOutcome::resolve(entries.get(remote.id()).cloned(), remote);
        if outcome.needs_write() {
            let entry = outcome.entry();
            entries.insert(entry.id().clone(), entry.clone());
        }
        Ok(outcome)
    }
}
