//! Error types for the domain layer.

use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction and input validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("Field '{field}' value '{value}' already exists")]
    AlreadyExists { field: String, value: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a uniqueness violation error.
    pub fn already_exists(field: impl Into<String>, value: impl Into<String>) -> Self {
        ValidationError::AlreadyExists {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Returns the name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::EmptyField { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::AlreadyExists { field, .. } => field,
        }
    }
}

/// Error codes organized by category.
///
/// These are stable identifiers the UI layer maps to user-facing copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    EmptyField,
    InvalidFormat,
    AlreadyExists,

    // Not found errors
    EntryNotFound,

    // State errors
    InvalidStateTransition,
    StaleAcknowledgment,
    EntryDeleted,
    EnrichmentSuperseded,

    // AI errors
    AIServiceError,
    RateLimited,

    // Infrastructure errors
    CorruptRecord,
    DatabaseError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::EmptyField => "EMPTY_FIELD",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::AlreadyExists => "ALREADY_EXISTS",
            ErrorCode::EntryNotFound => "ENTRY_NOT_FOUND",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::StaleAcknowledgment => "STALE_ACKNOWLEDGMENT",
            ErrorCode::EntryDeleted => "ENTRY_DELETED",
            ErrorCode::EnrichmentSuperseded => "ENRICHMENT_SUPERSEDED",
            ErrorCode::AIServiceError => "AI_SERVICE_ERROR",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::CorruptRecord => "CORRUPT_RECORD",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

impl From<&ValidationError> for ErrorCode {
    fn from(err: &ValidationError) -> Self {
        match err {
            ValidationError::EmptyField { .. } => ErrorCode::EmptyField,
            ValidationError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            ValidationError::AlreadyExists { .. } => ErrorCode::AlreadyExists,
        }
    }
}
