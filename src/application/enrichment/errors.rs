//! Enrichment errors.

use thiserror::Error;

use crate::domain::entry::EntryError;
use crate::domain::foundation::{EntryId, ErrorCode};
use crate::ports::AiServiceError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrichmentError {
    /// The AI attempt failed. `retry_count` is the entry's counter after the
    /// failure was recorded.
    #[error("{source} (failed attempts: {retry_count})")]
    AiService {
        source: AiServiceError,
        retry_count: u32,
    },

    #[error("Entry is deleted: {0}")]
    Deleted(EntryId),

    /// The entry's analysis inputs changed while the call was in flight.
    #[error("Entry changed during enrichment: {0}")]
    Superseded(EntryId),

    #[error(transparent)]
    Entry(EntryError),

    #[error("Enrichment queue is closed")]
    QueueClosed,
}

/// Failed write preconditions surface as their enrichment counterparts.
impl From<EntryError> for EnrichmentError {
    fn from(err: EntryError) -> Self {
        match err {
            EntryError::Deleted(id) => EnrichmentError::Deleted(id),
            EntryError::InputsChanged(id) => EnrichmentError::Superseded(id),
            other => EnrichmentError::Entry(other),
        }
    }
}

impl EnrichmentError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EnrichmentError::AiService { source, .. } => source.code(),
            EnrichmentError::Deleted(_) => ErrorCode::EntryDeleted,
            EnrichmentError::Superseded(_) => ErrorCode::EnrichmentSuperseded,
            EnrichmentError::Entry(err) => err.code(),
            EnrichmentError::QueueClosed => ErrorCode::InternalError,
        }
    }

    /// Whether another attempt could succeed without user action.
    pub fn is_retryable(&self) -> bool {
        match self {
            EnrichmentError::AiService { source, .. } => source.is_retryable(),
            EnrichmentError::Superseded(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> EntryId {
        EntryId::new("entry-1").unwrap()
    }

    #[test]
    fn codes_follow_the_cause() {
        let timeout = EnrichmentError::AiService {
            source: AiServiceError::Timeout,
            retry_count: 1,
        };
        assert_eq!(timeout.code(), ErrorCode::AIServiceError);
        assert_eq!(EnrichmentError::Deleted(id()).code(), ErrorCode::EntryDeleted);
        assert_eq!(
            EnrichmentError::Superseded(id()).code(),
            ErrorCode::EnrichmentSuperseded
        );
        assert_eq!(
            EnrichmentError::from(EntryError::not_found(&id())).code(),
            ErrorCode::EntryNotFound
        );
    }

    #[test]
    fn failed_write_preconditions_lift_to_enrichment_errors() {
        assert_eq!(
            EnrichmentError::from(EntryError::Deleted(id())),
            EnrichmentError::Deleted(id())
        );
        assert_eq!(
            EnrichmentError::from(EntryError::InputsChanged(id())),
            EnrichmentError::Superseded(id())
        );
    }

    #[test]
    fn rejected_requests_are_not_retryable() {
        let rejected = EnrichmentError::AiService {
            source: AiServiceError::Rejected("policy".to_string()),
            retry_count: 1,
        };
        assert!(!rejected.is_retryable());
        assert!(!EnrichmentError::Deleted(id()).is_retryable());
        assert!(EnrichmentError::Superseded(id()).is_retryable());
    }

    #[test]
    fn display_includes_the_attempt_count() {
        let err = EnrichmentError::AiService {
            source: AiServiceError::Timeout,
            retry_count: 3,
        };
        assert_eq!(err.to_string(), "AI service timed out (failed attempts: 3)");
    }
}
