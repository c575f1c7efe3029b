//! Entry store error types.

use thiserror::Error;

use crate::domain::foundation::{EntryId, ErrorCode, Timestamp, ValidationError};

/// Errors surfaced by entry operations and every storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    /// Input failed validation (missing required text, duplicate id, ...).
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No entry with this id exists.
    #[error("Entry not found: {0}")]
    NotFound(EntryId),

    /// A stored row could not be decoded into a valid entry.
    #[error("Corrupt record '{id}': {reason}")]
    CorruptRecord { id: String, reason: String },

    /// A sync acknowledgment raced a newer local edit.
    #[error("Stale acknowledgment for entry {id}: synced at {synced_at}, last mutation at {last_mutation}")]
    StaleAcknowledgment {
        id: EntryId,
        synced_at: Timestamp,
        last_mutation: Timestamp,
    },

    /// The backing store failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A conditional write found the entry deleted.
    #[error("Entry is deleted: {0}")]
    Deleted(EntryId),

    /// A conditional write found the analysis inputs changed.
    #[error("Entry changed before the write: {0}")]
    InputsChanged(EntryId),
}

impl EntryError {
    pub fn not_found(id: &EntryId) -> Self {
        EntryError::NotFound(id.clone())
    }

    pub fn corrupt(id: impl Into<String>, reason: impl Into<String>) -> Self {
        EntryError::CorruptRecord {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        EntryError::Storage(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            EntryError::Validation(err) => match err {
                ValidationError::InvalidFormat { field, .. } if field == "state_transition" => {
                    ErrorCode::InvalidStateTransition
                }
                _ => ErrorCode::ValidationFailed,
            },
            EntryError::NotFound(_) => ErrorCode::EntryNotFound,
            EntryError::CorruptRecord { .. } => ErrorCode::CorruptRecord,
            EntryError::StaleAcknowledgment { .. } => ErrorCode::StaleAcknowledgment,
            EntryError::Storage(_) => ErrorCode::DatabaseError,
            EntryError::Deleted(_) => ErrorCode::EntryDeleted,
            EntryError::InputsChanged(_) => ErrorCode::EnrichmentSuperseded,
        }
    }

    /// Message suitable for blocking the originating UI action.
    pub fn user_message(&self) -> String {
        match self {
            EntryError::Validation(err) => match err {
                ValidationError::EmptyField { field } => format!("Please fill in the {} field.", field),
                other => other.to_string(),
            },
            EntryError::NotFound(_) | EntryError::Deleted(_) => {
                "This entry no longer exists.".to_string()
            }
            EntryError::InputsChanged(_) => "This entry changed and will be analyzed again.".to_string(),
            EntryError::StaleAcknowledgment { .. } => {
                "This entry changed while syncing and will sync again.".to_string()
            }
            EntryError::CorruptRecord { .. } | EntryError::Storage(_) => {
                "Your journal could not be read. Please try again.".to_string()
            }
        }
    }
}
