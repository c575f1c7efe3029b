//! Belief AI service port.
//!
//! The opaque boundary to whatever produces belief analyses and disputes.
//! One call is one attempt: implementations never retry internally.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entry::{
    AnalyzeBeliefRequest, AnalyzeBeliefResult, DisputeBeliefRequest, DisputeBeliefResult,
};
use crate::domain::foundation::ErrorCode;

use super::AIError;

#[async_trait]
pub trait BeliefAiService: Send + Sync {
    /// Analyze a belief for thinking patterns.
    async fn analyze_belief(
        &self,
        request: AnalyzeBeliefRequest,
    ) -> Result<AnalyzeBeliefResult, AiServiceError>;

    /// Generate a dispute (counterpoints plus an alternative belief).
    async fn dispute_belief(
        &self,
        request: DisputeBeliefRequest,
    ) -> Result<DisputeBeliefResult, AiServiceError>;
}

/// Failure of a single AI attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AiServiceError {
    #[error("AI service rate limited; retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    #[error("AI service unavailable: {0}")]
    Unavailable(String),

    #[error("AI service timed out")]
    Timeout,

    /// The service answered but the answer is unusable.
    #[error("invalid AI response: {0}")]
    InvalidResponse(String),

    /// The service refused the request (content policy, bad input, auth).
    #[error("AI request rejected: {0}")]
    Rejected(String),
}

impl AiServiceError {
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse(reason.into())
    }

    /// Transient failures worth scheduling another attempt for.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AiServiceError::RateLimited { .. }
                | AiServiceError::Unavailable(_)
                | AiServiceError::Timeout
                | AiServiceError::InvalidResponse(_)
        )
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AiServiceError::RateLimited { .. } => ErrorCode::RateLimited,
            _ => ErrorCode::AIServiceError,
        }
    }
}

impl From<AIError> for AiServiceError {
    fn from(err: AIError) -> Self {
        match err {
            AIError::RateLimited { retry_after_secs } => {
                AiServiceError::RateLimited { retry_after_secs }
            }
            AIError::Unavailable { message } => AiServiceError::Unavailable(message),
            AIError::Network(message) => AiServiceError::Unavailable(message),
            AIError::Timeout { .. } => AiServiceError::Timeout,
            AIError::Parse(message) => AiServiceError::InvalidResponse(message),
            AIError::ContentFiltered { reason } => AiServiceError::Rejected(reason),
            AIError::InvalidRequest(message) => AiServiceError::Rejected(message),
            AIError::AuthenticationFailed => {
                AiServiceError::Rejected("authentication failed".to_string())
            }
        }
    }
}
