//! Sync state machine for entries.
//!
//! An entry's `dirty_since` and `is_deleted` columns encode four states.
//! Modelling them explicitly makes the acknowledgment race a transition rule:
//! an acknowledgment may only clean an entry whose last mutation is not newer
//! than the acknowledged instant.
//!
//! ```text
//!            edit                     ack (fresh)
//!  Clean ──────────────▶ Dirty ───────────────────▶ Clean
//!    │                    │
//!    │ delete             │ delete
//!    ▼                    ▼
//!  DeletedDirty ◀─────────┘
//!    │      ▲
//!    │ ack  │ edit
//!    ▼      │
//!  DeletedSynced
//! ```

use serde::{Deserialize, Serialize};

use super::Entry;
use crate::domain::foundation::{StateMachine, Timestamp};

/// Sync status derived from `(is_deleted, dirty_since)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Live entry, nothing to push.
    Clean,
    /// Live entry with unacknowledged local changes.
    Dirty,
    /// Tombstone that still has to be pushed.
    DeletedDirty,
    /// Tombstone the remote has acknowledged.
    DeletedSynced,
}

/// Outcome of checking an acknowledgment against the last local mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckDecision {
    /// The acknowledgment covers every local change; move to the given state.
    Acknowledged(SyncState),
    /// Nothing was dirty.
    AlreadyClean,
    /// A local mutation happened after the acknowledged instant.
    Stale { last_mutation: Timestamp },
}

impl SyncState {
    /// Derives the state from the persisted columns.
    pub fn of(is_deleted: bool, dirty_since: Option<Timestamp>) -> Self {
        match (is_deleted, dirty_since.is_some()) {
            (false, false) => SyncState::Clean,
            (false, true) => SyncState::Dirty,
            (true, true) => SyncState::DeletedDirty,
            (true, false) => SyncState::DeletedSynced,
        }
    }

    pub fn is_dirty(&self) -> bool {
        matches!(self, SyncState::Dirty | SyncState::DeletedDirty)
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, SyncState::DeletedDirty | SyncState::DeletedSynced)
    }

    /// State after a local edit (tombstones stay tombstones).
    pub fn after_edit(&self) -> SyncState {
        if self.is_deleted() {
            SyncState::DeletedDirty
        } else {
            SyncState::Dirty
        }
    }

    /// State after a sync-originated write.
    pub fn after_ack(&self) -> SyncState {
        if self.is_deleted() {
            SyncState::DeletedSynced
        } else {
            SyncState::Clean
        }
    }

    /// Decides whether an acknowledgment at `synced_at` may clean the entry.
    ///
    /// `last_mutation` is the stamp of the newest unacknowledged local change
    /// (the entry's `dirty_since`).
    pub fn acknowledge(&self, last_mutation: Option<Timestamp>, synced_at: Timestamp) -> AckDecision {
        match last_mutation {
            None => AckDecision::AlreadyClean,
            Some(mutated) if mutated.is_after(&synced_at) => AckDecision::Stale {
                last_mutation: mutated,
            },
            Some(_) => AckDecision::Acknowledged(self.after_ack()),
        }
    }
}

impl StateMachine for SyncState {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SyncState::*;
        match self {
            Clean => vec![Clean, Dirty, DeletedDirty],
            Dirty => vec![Dirty, Clean, DeletedDirty],
            DeletedDirty => vec![DeletedDirty, DeletedSynced],
            DeletedSynced => vec![DeletedSynced, DeletedDirty],
        }
    }
}

/// Result of `mark_synced`.
///
/// A stale acknowledgment is not a failure: the caller should push again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkSyncedOutcome {
    /// `dirty_since` was cleared (or already clear).
    Acknowledged(Entry),
    /// The entry changed after `synced_at`; `dirty_since` is untouched.
    Stale {
        entry: Entry,
        last_mutation: Timestamp,
    },
}

impl MarkSyncedOutcome {
    /// Pairs an acknowledgment decision with the entry it was made on.
    pub fn from_decision(entry: Entry, decision: AckDecision) -> Self {
        match decision {
            AckDecision::Stale { last_mutation } => MarkSyncedOutcome::Stale {
                entry,
                last_mutation,
            },
            AckDecision::Acknowledged(_) | AckDecision::AlreadyClean => {
                MarkSyncedOutcome::Acknowledged(entry)
            }
        }
    }

    pub fn entry(&self) -> &Entry {
        match self {
            MarkSyncedOutcome::Acknowledged(entry) => entry,
            MarkSyncedOutcome::Stale { entry, .. } => entry,
        }
    }

    pub fn into_entry(self) -> Entry {
        match self {
            MarkSyncedOutcome::Acknowledged(entry) => entry,
            MarkSyncedOutcome::Stale { entry, .. } => entry,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, MarkSyncedOutcome::Stale { .. })
    }

    /// Converts a stale acknowledgment into `EntryError::StaleAcknowledgment`.
    pub fn into_result(self, synced_at: Timestamp) -> Result<Entry, super::EntryError> {
        match self {
            MarkSyncedOutcome::Acknowledged(entry) => Ok(entry),
            MarkSyncedOutcome::Stale {
                entry,
                last_mutation,
            } => Err(super::EntryError::StaleAcknowledgment {
                id: entry.id().clone(),
                synced_at,
                last_mutation,
            }),
        }
    }
}

/// Result of applying a remote (pulled) version of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    /// The entry did not exist locally and was inserted clean.
    Inserted(Entry),
    /// The remote version replaced the local one.
    Applied(Entry),
    /// The local version is newer (or an equally new dirty edit) and was kept.
    KeptLocal(Entry),
}

impl PullOutcome {
    /// Last-writer-wins resolution of a pulled version against the local one.
    ///
    /// The newer `updated_at` wins; on a tie a clean local copy yields but a
    /// dirty one is kept, so an unpushed edit is never silently lost.
    pub fn resolve(local: Option<Entry>, remote: Entry) -> Self {
        match local {
            None => PullOutcome::Inserted(remote),
            Some(local) if local.should_yield_to(&remote) => PullOutcome::Applied(remote),
            Some(local) => PullOutcome::KeptLocal(local),
        }
    }

    /// Whether the resolved entry has to be written back.
    pub fn needs_write(&self) -> bool {
        !matches!(self, PullOutcome::KeptLocal(_))
    }

    pub fn into_entry(self) -> Entry {
        match self {
            PullOutcome::Inserted(entry)
            | PullOutcome::Applied(entry)
            | PullOutcome::KeptLocal(entry) => entry,
        }
    }

    pub fn entry(&self) -> &Entry {
        match self {
            PullOutcome::Inserted(entry)
            | PullOutcome::Applied(entry)
            | PullOutcome::KeptLocal(entry) => entry,
        }
    }
}
