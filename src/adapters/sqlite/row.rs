//! Row codec for the `entries` table.
//!
//! Shared by the pooled and detached modes so both store exactly the same
//! encoded form.

use crate::domain::entry::{Entry, EntryError, EntrySnapshot};
use crate::domain::foundation::{AccountId, EntryId, Timestamp};

/// One row of `entries`, as stored.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct EntryRow {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub adversity: String,
    pub belief: String,
    pub consequence: Option<String>,
    pub dispute: Option<String>,
    pub energy: Option<String>,
    /// `AnalyzeBeliefResult` as JSON.
    pub ai_response: Option<String>,
    pub ai_retry_count: i64,
    /// `Vec<DisputeRecord>` as a JSON array.
    pub dispute_history: String,
    pub dirty_since: Option<String>,
    pub is_deleted: bool,
    pub account_id: Option<String>,
}

impl EntryRow {
    pub fn encode(entry: &Entry) -> Result<Self, EntryError> {
        let ai_response = entry
            .ai_response()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| EntryError::storage(format!("Failed to encode ai_response: {}", e)))?;
        let dispute_history = serde_json::to_string(entry.dispute_history())
            .map_err(|e| EntryError::storage(format!("Failed to encode dispute_history: {}", e)))?;

        Ok(Self {
            id: entry.id().as_str().to_string(),
            created_at: entry.created_at().to_iso8601(),
            updated_at: entry.updated_at().to_iso8601(),
            adversity: entry.adversity().to_string(),
            belief: entry.belief().to_string(),
            consequence: entry.consequence().map(str::to_string),
            dispute: entry.dispute().map(str::to_string),
            energy: entry.energy().map(str::to_string),
            ai_response,
            ai_retry_count: i64::from(entry.ai_retry_count()),
            dispute_history,
            dirty_since: entry.dirty_since().map(Timestamp::to_iso8601),
            is_deleted: entry.is_deleted(),
            account_id: entry.account_id().map(|id| id.as_str().to_string()),
        })
    }

    /// Decodes and validates a stored row.
    ///
    /// # Errors
    ///
    /// - `CorruptRecord` for undecodable columns or violated invariants
    pub fn decode(self) -> Result<Entry, EntryError> {
        let id = self.id.clone();
        let corrupt = |reason: String| EntryError::corrupt(id.clone(), reason);

        let ai_retry_count = u32::try_from(self.ai_retry_count)
            .map_err(|_| corrupt(format!("ai_retry_count: {} out of range", self.ai_retry_count)))?;
        let ai_response = self
            .ai_response
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| corrupt(format!("ai_response: {}", e)))?;
        let dispute_history = serde_json::from_str(&self.dispute_history)
            .map_err(|e| corrupt(format!("dispute_history: {}", e)))?;

        let snapshot = EntrySnapshot {
            schema_version: EntrySnapshot::CURRENT_VERSION,
            id: EntryId::new(self.id.clone()).map_err(|e| corrupt(e.to_string()))?,
            created_at: parse_timestamp("created_at", &self.created_at).map_err(&corrupt)?,
            updated_at: parse_timestamp("updated_at", &self.updated_at).map_err(&corrupt)?,
            adversity: self.adversity,
            belief: self.belief,
            consequence: self.consequence,
            dispute: self.dispute,
            energy: self.energy,
            ai_response,
            ai_retry_count,
            dispute_history,
            dirty_since: self
                .dirty_since
                .as_deref()
                .map(|value| parse_timestamp("dirty_since", value))
                .transpose()
                .map_err(&corrupt)?,
            is_deleted: self.is_deleted,
            account_id: self
                .account_id
                .map(AccountId::new)
                .transpose()
                .map_err(|e| corrupt(e.to_string()))?,
        };

        Entry::from_snapshot(snapshot).map_err(|e| corrupt(e.to_string()))
    }
}

fn parse_timestamp(field: &str, value: &str) -> Result<Timestamp, String> {
    Timestamp::parse_iso8601(field, value).map_err(|e| e.to_string())
}
