//! Versioned JSON form of an entry.
//!
//! Sync payloads and exports carry entries as camelCase snapshots tagged with
//! `schemaVersion`. Older payloads are upcast one version step at a time
//! before they are deserialized into the canonical shape.
//!
//! # Versions
//!
//! - **1**: `analysis` holds the analysis, `counterBelief` a single
//!   alternative belief string. No retry counter, no history.
//! - **2**: `aiResponse`, `aiRetryCount`, `disputeHistory`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use thiserror::Error;

use crate::domain::foundation::{AccountId, EntryId, Timestamp, ValidationError};

use super::{AnalyzeBeliefResult, DisputeRecord, Entry};

/// Errors raised while reading a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Payload is not a JSON object.
    #[error("snapshot must be a JSON object")]
    NotAnObject,

    /// Required field is missing from a legacy payload.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// Field has the wrong JSON type.
    #[error("invalid field value: {0}")]
    InvalidValue(String),

    /// Payload was written by a newer schema than this build understands.
    #[error("unsupported schema version {found} (newest known is {supported})")]
    UnsupportedVersion { found: u64, supported: u64 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload parsed but violates an entry invariant.
    #[error("invalid entry: {0}")]
    Invalid(#[from] ValidationError),
}

fn current_version() -> u32 {
    EntrySnapshot::CURRENT_VERSION
}

/// Canonical serialized entry.
///
/// Deserializing always goes through [`EntrySnapshot::from_json`], so legacy
/// payloads are upcast and newer versions rejected on every read path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "JsonValue")]
pub struct EntrySnapshot {
    pub schema_version: u32,
    pub id: EntryId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub adversity: String,
    pub belief: String,
    pub consequence: Option<String>,
    pub dispute: Option<String>,
    pub energy: Option<String>,
    pub ai_response: Option<AnalyzeBeliefResult>,
    pub ai_retry_count: u32,
    pub dispute_history: Vec<DisputeRecord>,
    pub dirty_since: Option<Timestamp>,
    pub is_deleted: bool,
    pub account_id: Option<AccountId>,
}

/// Field layout of the current version, read after upcasting.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentSnapshot {
    #[serde(default = "current_version")]
    schema_version: u32,
    id: EntryId,
    created_at: Timestamp,
    updated_at: Timestamp,
    adversity: String,
    belief: String,
    #[serde(default)]
    consequence: Option<String>,
    #[serde(default)]
    dispute: Option<String>,
    #[serde(default)]
    energy: Option<String>,
    #[serde(default)]
    ai_response: Option<AnalyzeBeliefResult>,
    #[serde(default)]
    ai_retry_count: u32,
    #[serde(default)]
    dispute_history: Vec<DisputeRecord>,
    #[serde(default)]
    dirty_since: Option<Timestamp>,
    #[serde(default)]
    is_deleted: bool,
    #[serde(default)]
    account_id: Option<AccountId>,
}

impl From<CurrentSnapshot> for EntrySnapshot {
    fn from(raw: CurrentSnapshot) -> Self {
        EntrySnapshot {
            schema_version: raw.schema_version,
            id: raw.id,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            adversity: raw.adversity,
            belief: raw.belief,
            consequence: raw.consequence,
            dispute: raw.dispute,
            energy: raw.energy,
            ai_response: raw.ai_response,
            ai_retry_count: raw.ai_retry_count,
            dispute_history: raw.dispute_history,
            dirty_since: raw.dirty_since,
            is_deleted: raw.is_deleted,
            account_id: raw.account_id,
        }
    }
}

impl TryFrom<JsonValue> for EntrySnapshot {
    type Error = SnapshotError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        Self::from_json(value)
    }
}

impl EntrySnapshot {
    pub const CURRENT_VERSION: u32 = 2;

    /// Reads a snapshot of any known version.
    ///
    /// A payload without `schemaVersion` is treated as version 1.
    pub fn from_json(value: JsonValue) -> Result<Self, SnapshotError> {
        let JsonValue::Object(mut object) = value else {
            return Err(SnapshotError::NotAnObject);
        };

        let version = match object.get("schemaVersion") {
            None | Some(JsonValue::Null) => 1,
            Some(value) => value.as_u64().ok_or_else(|| {
                SnapshotError::InvalidValue("schemaVersion must be a positive integer".into())
            })?,
        };
        if version > u64::from(Self::CURRENT_VERSION) {
            return Err(SnapshotError::UnsupportedVersion {
                found: version,
                supported: u64::from(Self::CURRENT_VERSION),
            });
        }
        if version < 2 {
            upcast_v1_to_v2(&mut object)?;
        }

        let current: CurrentSnapshot = serde_json::from_value(JsonValue::Object(object))?;
        Ok(current.into())
    }

    /// Parses snapshot text of any known version.
    pub fn parse(text: &str) -> Result<Self, SnapshotError> {
        Self::from_json(serde_json::from_str(text)?)
    }

    /// Parses and validates in one step.
    pub fn parse_entry(text: &str) -> Result<Entry, SnapshotError> {
        Ok(Entry::from_snapshot(Self::parse(text)?)?)
    }
}

/// `analysis` becomes `aiResponse`; `counterBelief` becomes a one-element
/// `disputeHistory` stamped at `updatedAt`.
fn upcast_v1_to_v2(object: &mut Map<String, JsonValue>) -> Result<(), SnapshotError> {
    if let Some(analysis) = object.remove("analysis") {
        if !object.contains_key("aiResponse") {
            object.insert("aiResponse".to_string(), analysis);
        }
    }

    match object.remove("counterBelief") {
        None | Some(JsonValue::Null) => {}
        Some(JsonValue::String(text)) if text.trim().is_empty() => {}
        Some(JsonValue::String(text)) => {
            let generated_at = object
                .get("updatedAt")
                .cloned()
                .ok_or_else(|| SnapshotError::MissingField("updatedAt".into()))?;
            let history = object
                .entry("disputeHistory")
                .or_insert_with(|| JsonValue::Array(Vec::new()));
            let JsonValue::Array(records) = history else {
                return Err(SnapshotError::InvalidValue(
                    "disputeHistory must be an array".into(),
                ));
            };
            records.push(json!({
                "generatedAt": generated_at,
                "acknowledgement": "",
                "counterpoints": [],
                "alternativeBelief": text,
                "encouragement": "",
            }));
        }
        Some(_) => {
            return Err(SnapshotError::InvalidValue(
                "counterBelief must be a string".into(),
            ))
        }
    }

    object.insert("schemaVersion".to_string(), json!(2));
    Ok(())
}
