//! AI enrichment value objects.
//!
//! These are the structured results of belief analysis and dispute
//! generation, plus the request shapes sent to the AI service. They are
//! stored on the entry (`ai_response`, `dispute_history`) and serialized to
//! camelCase JSON, the shape the mobile client and sync payloads use.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// A named thinking pattern detected in the belief.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingPatternFinding {
    /// Pattern name, e.g. "Labeling" or "Catastrophizing".
    pub label: String,
    /// Verbatim excerpt from the belief that exhibits the pattern.
    pub quote: String,
    /// Short explanation of why the excerpt matches.
    pub rationale: String,
}

impl ThinkingPatternFinding {
    pub fn new(
        label: impl Into<String>,
        quote: impl Into<String>,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            quote: quote.into(),
            rationale: rationale.into(),
        }
    }

    /// True when the quote appears verbatim in the given belief text.
    pub fn is_quoted_from(&self, belief: &str) -> bool {
        !self.quote.trim().is_empty() && belief.contains(self.quote.as_str())
    }
}

/// Result of analyzing a belief.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeBeliefResult {
    /// The belief restated in neutral terms.
    pub restated_belief: String,
    /// Detected thinking patterns, in the order the service reported them.
    #[serde(default)]
    pub thinking_patterns: Vec<ThinkingPatternFinding>,
    /// Educational summary shown under the analysis.
    pub summary: String,
}

impl AnalyzeBeliefResult {
    /// Drops findings whose quote is not verbatim in `belief`.
    ///
    /// Returns the dropped findings so callers can log them.
    pub fn retain_verbatim_findings(&mut self, belief: &str) -> Vec<ThinkingPatternFinding> {
        let (kept, dropped): (Vec<_>, Vec<_>) = std::mem::take(&mut self.thinking_patterns)
            .into_iter()
            .partition(|finding| finding.is_quoted_from(belief));
        self.thinking_patterns = kept;
        dropped
    }

    /// Labels of the detected patterns, in order.
    pub fn pattern_labels(&self) -> Vec<String> {
        self.thinking_patterns
            .iter()
            .map(|finding| finding.label.clone())
            .collect()
    }
}

/// Result of generating a dispute for a belief.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeBeliefResult {
    /// Acknowledgement of the user's feelings.
    pub acknowledgement: String,
    /// Ordered counterpoints to the belief.
    #[serde(default)]
    pub counterpoints: Vec<String>,
    /// One alternative, reframed belief.
    pub alternative_belief: String,
    /// Closing encouragement.
    pub encouragement: String,
}

/// One appended element of an entry's dispute history.
///
/// Fields are private; once a record is appended it is never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeRecord {
    generated_at: Timestamp,
    #[serde(flatten)]
    result: DisputeBeliefResult,
}

impl DisputeRecord {
    pub fn new(result: DisputeBeliefResult, generated_at: Timestamp) -> Self {
        Self {
            generated_at,
            result,
        }
    }

    pub fn generated_at(&self) -> &Timestamp {
        &self.generated_at
    }

    pub fn result(&self) -> &DisputeBeliefResult {
        &self.result
    }
}

/// The text an analysis is computed from.
///
/// Two entries with equal inputs get the same analysis; an entry whose
/// inputs change loses its stored analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeBeliefRequest {
    pub adversity: String,
    pub belief: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consequence: Option<String>,
}

/// Context sent when asking for a dispute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeBeliefRequest {
    #[serde(flatten)]
    pub inputs: AnalyzeBeliefRequest,
    /// Restated belief from a prior analysis, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restated_belief: Option<String>,
    /// Labels of previously detected thinking patterns.
    #[serde(default)]
    pub thinking_patterns: Vec<String>,
    /// Alternative beliefs already offered, so the service can avoid repeats.
    #[serde(default)]
    pub previous_alternatives: Vec<String>,
}
