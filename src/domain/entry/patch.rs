//! Partial updates to an entry.

use crate::domain::foundation::{AccountId, ValidationError};

use super::{AnalyzeBeliefRequest, AnalyzeBeliefResult, DisputeBeliefResult};

/// A set of changes merged onto a stored entry by `update`.
///
/// Optional text fields use `Option<Option<String>>`: `None` leaves the field
/// alone, `Some(None)` clears it, `Some(Some(text))` sets it. Blank text is
/// treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    pub adversity: Option<String>,
    pub belief: Option<String>,
    pub consequence: Option<Option<String>>,
    pub dispute: Option<Option<String>>,
    pub energy: Option<Option<String>>,
    pub account_id: Option<Option<AccountId>>,
    /// Stores a successful analysis and resets the retry counter.
    pub ai_response: Option<AnalyzeBeliefResult>,
    /// Counts one failed analysis attempt (only while no analysis is stored).
    pub record_ai_failure: bool,
    /// Appends a generated dispute to the history.
    pub append_dispute: Option<DisputeBeliefResult>,
    /// The write originates from a sync acknowledgment: clear `dirty_since`
    /// instead of setting it.
    pub acknowledges_sync: bool,
    /// Precondition checked against the stored entry inside the same write:
    /// the entry must be live and its analysis inputs must equal these.
    pub expected_inputs: Option<AnalyzeBeliefRequest>,
}

impl EntryPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn adversity(mut self, text: impl Into<String>) -> Self {
        self.adversity = Some(text.into());
        self
    }

    pub fn belief(mut self, text: impl Into<String>) -> Self {
        self.belief = Some(text.into());
        self
    }

    pub fn consequence(mut self, text: Option<String>) -> Self {
        self.consequence = Some(text);
        self
    }

    pub fn dispute(mut self, text: Option<String>) -> Self {
        self.dispute = Some(text);
        self
    }

    pub fn energy(mut self, text: Option<String>) -> Self {
        self.energy = Some(text);
        self
    }

    pub fn account(mut self, account_id: Option<AccountId>) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn ai_response(mut self, result: AnalyzeBeliefResult) -> Self {
        self.ai_response = Some(result);
        self
    }

    pub fn ai_failure(mut self) -> Self {
        self.record_ai_failure = true;
        self
    }

    pub fn append_dispute(mut self, result: DisputeBeliefResult) -> Self {
        self.append_dispute = Some(result);
        self
    }

    pub fn acknowledging_sync(mut self) -> Self {
        self.acknowledges_sync = true;
        self
    }

    /// Only apply the patch if the entry still has these analysis inputs.
    pub fn expecting_inputs(mut self, inputs: AnalyzeBeliefRequest) -> Self {
        self.expected_inputs = Some(inputs);
        self
    }

    /// A failure record and nothing else.
    pub(crate) fn only_records_failure(&self) -> bool {
        self.record_ai_failure
            && self.adversity.is_none()
            && self.belief.is_none()
            && self.consequence.is_none()
            && self.dispute.is_none()
            && self.energy.is_none()
            && self.account_id.is_none()
            && self.ai_response.is_none()
            && self.append_dispute.is_none()
            && !self.acknowledges_sync
    }

    /// Rejects blank required fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.adversity.as_deref().is_some_and(is_blank) {
            return Err(ValidationError::empty_field("adversity"));
        }
        if self.belief.as_deref().is_some_and(is_blank) {
            return Err(ValidationError::empty_field("belief"));
        }
        Ok(())
    }
}

pub(crate) fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Blank optional text is stored as absent.
pub(crate) fn normalize_optional(text: Option<String>) -> Option<String> {
    text.filter(|t| !is_blank(t))
}
