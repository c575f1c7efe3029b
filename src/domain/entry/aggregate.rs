//! Entry aggregate.
//!
//! An entry is one ABCDE journal record plus the metadata the offline-first
//! store needs: timestamps, sync state, AI enrichment, and ownership.
//!
//! Every mutation takes the current instant from the caller (the adapter's
//! injected clock) so the aggregate itself never reads ambient time.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AccountId, EntryId, StateMachine, Timestamp, ValidationError};

use super::patch::{is_blank, normalize_optional};
use super::{
    AckDecision, AnalyzeBeliefRequest, AnalyzeBeliefResult, DisputeBeliefRequest, DisputeRecord,
    EntryError, EntryPatch, EntrySnapshot, SyncState,
};

/// Input for creating an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEntry {
    /// Caller-supplied id; the adapter generates one when absent.
    pub id: Option<EntryId>,
    pub adversity: String,
    pub belief: String,
    pub consequence: Option<String>,
    pub dispute: Option<String>,
    pub energy: Option<String>,
    pub account_id: Option<AccountId>,
}

impl NewEntry {
    pub fn new(adversity: impl Into<String>, belief: impl Into<String>) -> Self {
        Self {
            adversity: adversity.into(),
            belief: belief.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: EntryId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_consequence(mut self, text: impl Into<String>) -> Self {
        self.consequence = Some(text.into());
        self
    }

    pub fn with_account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    /// Rejects blank required fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.adversity) {
            return Err(ValidationError::empty_field("adversity"));
        }
        if is_blank(&self.belief) {
            return Err(ValidationError::empty_field("belief"));
        }
        Ok(())
    }
}

/// Entry aggregate - one journal record.
///
/// # Invariants
///
/// - `created_at <= updated_at`, and `updated_at` never moves backwards
/// - `adversity` and `belief` are never blank
/// - `dirty_since`, when set, is the stamp of the last local mutation
/// - `ai_retry_count` is 0 whenever `ai_response` is set
/// - `dispute_history` is append-only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "EntrySnapshot", try_from = "EntrySnapshot")]
pub struct Entry {
    id: EntryId,
    created_at: Timestamp,
    updated_at: Timestamp,
    adversity: String,
    belief: String,
    consequence: Option<String>,
    dispute: Option<String>,
    energy: Option<String>,
    ai_response: Option<AnalyzeBeliefResult>,
    ai_retry_count: u32,
    dispute_history: Vec<DisputeRecord>,
    dirty_since: Option<Timestamp>,
    is_deleted: bool,
    account_id: Option<AccountId>,
}

impl Entry {
    /// Creates a new dirty entry stamped at `now`.
    ///
    /// # Errors
    ///
    /// - `Validation` if adversity or belief is blank
    pub fn create(id: EntryId, draft: NewEntry, now: Timestamp) -> Result<Self, EntryError> {
        draft.validate()?;

        Ok(Self {
            id,
            created_at: now,
            updated_at: now,
            adversity: draft.adversity,
            belief: draft.belief,
            consequence: normalize_optional(draft.consequence),
            dispute: normalize_optional(draft.dispute),
            energy: normalize_optional(draft.energy),
            ai_response: None,
            ai_retry_count: 0,
            dispute_history: Vec::new(),
            dirty_since: Some(now),
            is_deleted: false,
            account_id: draft.account_id,
        })
    }

    /// Rebuilds an entry from its snapshot, checking every invariant.
    pub fn from_snapshot(snapshot: EntrySnapshot) -> Result<Self, ValidationError> {
        if is_blank(&snapshot.adversity) {
            return Err(ValidationError::empty_field("adversity"));
        }
        if is_blank(&snapshot.belief) {
            return Err(ValidationError::empty_field("belief"));
        }
        let stamps = [
            ("created_at", Some(&snapshot.created_at)),
            ("updated_at", Some(&snapshot.updated_at)),
            ("dirty_since", snapshot.dirty_since.as_ref()),
        ];
        for (field, stamp) in stamps {
            if stamp.is_some_and(|stamp| !stamp.has_fixed_width()) {
                return Err(ValidationError::invalid_format(
                    field,
                    "year must be between 0000 and 9999",
                ));
            }
        }
        if snapshot.updated_at.is_before(&snapshot.created_at) {
            return Err(ValidationError::invalid_format(
                "updated_at",
                "must not be before created_at",
            ));
        }
        if let Some(dirty_since) = snapshot.dirty_since {
            if dirty_since.is_after(&snapshot.updated_at) {
                return Err(ValidationError::invalid_format(
                    "dirty_since",
                    "must not be after updated_at",
                ));
            }
        }
        if snapshot.ai_response.is_some() && snapshot.ai_retry_count > 0 {
            return Err(ValidationError::invalid_format(
                "ai_retry_count",
                "must be 0 once ai_response is set",
            ));
        }

        Ok(Self {
            id: snapshot.id,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            adversity: snapshot.adversity,
            belief: snapshot.belief,
            consequence: normalize_optional(snapshot.consequence),
            dispute: normalize_optional(snapshot.dispute),
            energy: normalize_optional(snapshot.energy),
            ai_response: snapshot.ai_response,
            ai_retry_count: snapshot.ai_retry_count,
            dispute_history: snapshot.dispute_history,
            dirty_since: snapshot.dirty_since,
            is_deleted: snapshot.is_deleted,
            account_id: snapshot.account_id,
        })
    }

    /// Rebuilds a remote version: the server copy is by definition synced.
    pub fn from_remote(mut snapshot: EntrySnapshot) -> Result<Self, ValidationError> {
        snapshot.dirty_since = None;
        Self::from_snapshot(snapshot)
    }

    /// Captures the entry as a versioned snapshot.
    pub fn to_snapshot(&self) -> EntrySnapshot {
        EntrySnapshot::from(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &EntryId {
        &self.id
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    pub fn adversity(&self) -> &str {
        &self.adversity
    }

    pub fn belief(&self) -> &str {
        &self.belief
    }

    pub fn consequence(&self) -> Option<&str> {
        self.consequence.as_deref()
    }

    pub fn dispute(&self) -> Option<&str> {
        self.dispute.as_deref()
    }

    pub fn energy(&self) -> Option<&str> {
        self.energy.as_deref()
    }

    pub fn ai_response(&self) -> Option<&AnalyzeBeliefResult> {
        self.ai_response.as_ref()
    }

    pub fn ai_retry_count(&self) -> u32 {
        self.ai_retry_count
    }

    pub fn dispute_history(&self) -> &[DisputeRecord] {
        &self.dispute_history
    }

    pub fn dirty_since(&self) -> Option<&Timestamp> {
        self.dirty_since.as_ref()
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    pub fn account_id(&self) -> Option<&AccountId> {
        self.account_id.as_ref()
    }

    pub fn sync_state(&self) -> SyncState {
        SyncState::of(self.is_deleted, self.dirty_since)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty_since.is_some()
    }

    /// Live entry still waiting for a successful analysis.
    pub fn needs_analysis(&self) -> bool {
        !self.is_deleted && self.ai_response.is_none()
    }

    /// The text an analysis of this entry is computed from.
    pub fn analysis_request(&self) -> AnalyzeBeliefRequest {
        AnalyzeBeliefRequest {
            adversity: self.adversity.clone(),
            belief: self.belief.clone(),
            consequence: self.consequence.clone(),
        }
    }

    /// Context for dispute generation, enriched by any stored analysis.
    pub fn dispute_request(&self) -> DisputeBeliefRequest {
        DisputeBeliefRequest {
            inputs: self.analysis_request(),
            restated_belief: self
                .ai_response
                .as_ref()
                .map(|analysis| analysis.restated_belief.clone()),
            thinking_patterns: self
                .ai_response
                .as_ref()
                .map(AnalyzeBeliefResult::pattern_labels)
                .unwrap_or_default(),
            previous_alternatives: self
                .dispute_history
                .iter()
                .map(|record| record.result().alternative_belief.clone())
                .collect(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Merges a patch stamped at `now`.
    ///
    /// Changing an analysis input discards the stored analysis and resets the
    /// retry counter. The entry becomes dirty unless the patch acknowledges a
    /// sync.
    ///
    /// Returns `false`, leaving the entry untouched, when the patch only
    /// records an AI failure and an analysis is already stored.
    ///
    /// # Errors
    ///
    /// - `Validation` if a required field is set blank
    /// - `Deleted` / `InputsChanged` if the patch's expected inputs no longer hold
    pub fn apply_patch(&mut self, patch: EntryPatch, now: Timestamp) -> Result<bool, EntryError> {
        patch.validate()?;
        if let Some(expected) = &patch.expected_inputs {
            if self.is_deleted {
                return Err(EntryError::Deleted(self.id.clone()));
            }
            if self.analysis_request() != *expected {
                return Err(EntryError::InputsChanged(self.id.clone()));
            }
        }
        if patch.only_records_failure() && self.ai_response.is_some() {
            return Ok(false);
        }

        let target = if patch.acknowledges_sync {
            self.sync_state().after_ack()
        } else {
            self.sync_state().after_edit()
        };
        self.sync_state().transition_to(target)?;

        let stamp = self.next_stamp(now);
        let inputs_before = self.analysis_request();

        if let Some(adversity) = patch.adversity {
            self.adversity = adversity;
        }
        if let Some(belief) = patch.belief {
            self.belief = belief;
        }
        if let Some(consequence) = patch.consequence {
            self.consequence = normalize_optional(consequence);
        }
        if let Some(dispute) = patch.dispute {
            self.dispute = normalize_optional(dispute);
        }
        if let Some(energy) = patch.energy {
            self.energy = normalize_optional(energy);
        }
        if let Some(account_id) = patch.account_id {
            self.account_id = account_id;
        }

        if self.analysis_request() != inputs_before {
            self.ai_response = None;
            self.ai_retry_count = 0;
        }
        if let Some(result) = patch.ai_response {
            self.ai_response = Some(result);
            self.ai_retry_count = 0;
        }
        if patch.record_ai_failure && self.ai_response.is_none() {
            self.ai_retry_count = self.ai_retry_count.saturating_add(1);
        }
        if let Some(result) = patch.append_dispute {
            self.dispute_history.push(DisputeRecord::new(result, stamp));
        }

        self.updated_at = stamp;
        self.dirty_since = if patch.acknowledges_sync {
            None
        } else {
            Some(stamp)
        };
        Ok(true)
    }

    /// Turns the entry into a dirty tombstone.
    ///
    /// Returns `false` (and changes nothing) if it already is one.
    pub fn soft_delete(&mut self, now: Timestamp) -> Result<bool, EntryError> {
        if self.is_deleted {
            return Ok(false);
        }
        self.sync_state().transition_to(SyncState::DeletedDirty)?;

        let stamp = self.next_stamp(now);
        self.is_deleted = true;
        self.updated_at = stamp;
        self.dirty_since = Some(stamp);
        Ok(true)
    }

    /// Applies a sync acknowledgment for the state pushed at `synced_at`.
    ///
    /// Does not touch `updated_at`: an acknowledgment is not a content change.
    pub fn acknowledge_sync(&mut self, synced_at: Timestamp) -> Result<AckDecision, EntryError> {
        let decision = self.sync_state().acknowledge(self.dirty_since, synced_at);
        if let AckDecision::Acknowledged(target) = decision {
            self.sync_state().transition_to(target)?;
            self.dirty_since = None;
        }
        Ok(decision)
    }

    /// Whether a remote version should replace this local one.
    ///
    /// The newer `updated_at` wins; on a tie, a dirty local edit is kept.
    pub fn should_yield_to(&self, remote: &Entry) -> bool {
        if remote.updated_at.is_after(&self.updated_at) {
            return true;
        }
        remote.updated_at == self.updated_at && !self.is_dirty()
    }

    /// `updated_at` never moves backwards, even if the clock does.
    fn next_stamp(&self, now: Timestamp) -> Timestamp {
        if now.is_before(&self.updated_at) {
            self.updated_at
        } else {
            now
        }
    }
}

impl TryFrom<EntrySnapshot> for Entry {
    type Error = ValidationError;

    fn try_from(snapshot: EntrySnapshot) -> Result<Self, Self::Error> {
        Entry::from_snapshot(snapshot)
    }
}

impl From<Entry> for EntrySnapshot {
    fn from(entry: Entry) -> Self {
        EntrySnapshot {
            schema_version: EntrySnapshot::CURRENT_VERSION,
            id: entry.id,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
            adversity: entry.adversity,
            belief: entry.belief,
            consequence: entry.consequence,
            dispute: entry.dispute,
            energy: entry.energy,
            ai_response: entry.ai_response,
            ai_retry_count: entry.ai_retry_count,
            dispute_history: entry.dispute_history,
            dirty_since: entry.dirty_since,
            is_deleted: entry.is_deleted,
            account_id: entry.account_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entry::{DisputeBeliefResult, ThinkingPatternFinding};

    fn t(secs: i64) -> Timestamp {
        Timestamp::from_unix_nanos(1_700_000_000_000_000_000).plus_secs(secs)
    }

    fn entry_at(secs: i64) -> Entry {
        Entry::create(
            EntryId::new("entry-1").unwrap(),
            NewEntry::new("Lost my job", "I'm worthless"),
            t(secs),
        )
        .unwrap()
    }

    fn analysis() -> AnalyzeBeliefResult {
        AnalyzeBeliefResult {
            restated_belief: "Losing my job means I have no worth".to_string(),
            thinking_patterns: vec![ThinkingPatternFinding::new(
                "Labeling",
                "worthless",
                "A global label drawn from one event",
            )],
            summary: "Labels turn an event into an identity.".to_string(),
        }
    }

    fn dispute(alternative: &str) -> DisputeBeliefResult {
        DisputeBeliefResult {
            acknowledgement: "That is a hard loss.".to_string(),
            counterpoints: vec!["Jobs end for many reasons.".to_string()],
            alternative_belief: alternative.to_string(),
            encouragement: "One step at a time.".to_string(),
        }
    }

    #[test]
    fn create_stamps_all_timestamps_and_starts_dirty() {
        let entry = entry_at(0);

        assert_eq!(entry.created_at(), &t(0));
        assert_eq!(entry.updated_at(), &t(0));
        assert_eq!(entry.dirty_since(), Some(&t(0)));
        assert!(!entry.is_deleted());
        assert!(entry.ai_response().is_none());
        assert_eq!(entry.ai_retry_count(), 0);
        assert!(entry.dispute_history().is_empty());
        assert_eq!(entry.sync_state(), SyncState::Dirty);
    }

    #[test]
    fn create_rejects_blank_belief() {
        let result = Entry::create(
            EntryId::new("entry-1").unwrap(),
            NewEntry::new("Lost my job", " "),
            t(0),
        );
        assert_eq!(
            result.unwrap_err(),
            EntryError::Validation(ValidationError::empty_field("belief"))
        );
    }

    #[test]
    fn create_treats_blank_optional_text_as_absent() {
        let entry = Entry::create(
            EntryId::new("entry-1").unwrap(),
            NewEntry::new("Lost my job", "I'm worthless").with_consequence("  "),
            t(0),
        )
        .unwrap();
        assert_eq!(entry.consequence(), None);
    }

    #[test]
    fn patch_updates_fields_and_marks_dirty() {
        let mut entry = entry_at(0);
        entry
            .apply_patch(
                EntryPatch::new().consequence(Some("Stayed in bed".to_string())),
                t(1),
            )
            .unwrap();

        assert_eq!(entry.consequence(), Some("Stayed in bed"));
        assert_eq!(entry.updated_at(), &t(1));
        assert_eq!(entry.dirty_since(), Some(&t(1)));
        assert_eq!(entry.adversity(), "Lost my job");
        assert_eq!(entry.created_at(), &t(0));
    }

    #[test]
    fn patch_never_moves_updated_at_backwards() {
        let mut entry = entry_at(10);
        entry.apply_patch(EntryPatch::new().energy(Some("calmer".into())), t(5)).unwrap();

        assert_eq!(entry.updated_at(), &t(10));
        assert_eq!(entry.dirty_since(), Some(&t(10)));
    }

    #[test]
    fn acknowledging_patch_clears_dirty() {
        let mut entry = entry_at(0);
        entry
            .apply_patch(EntryPatch::new().acknowledging_sync(), t(1))
            .unwrap();

        assert_eq!(entry.dirty_since(), None);
        assert_eq!(entry.updated_at(), &t(1));
    }

    #[test]
    fn storing_analysis_resets_retry_count() {
        let mut entry = entry_at(0);
        entry.apply_patch(EntryPatch::new().ai_failure(), t(1)).unwrap();
        entry.apply_patch(EntryPatch::new().ai_failure(), t(2)).unwrap();
        assert_eq!(entry.ai_retry_count(), 2);

        entry.apply_patch(EntryPatch::new().ai_response(analysis()), t(3)).unwrap();
        assert_eq!(entry.ai_retry_count(), 0);
        assert_eq!(entry.ai_response(), Some(&analysis()));
        assert_eq!(entry.dirty_since(), Some(&t(3)));
    }

    #[test]
    fn failures_do_not_count_once_analysis_is_stored() {
        let mut entry = entry_at(0);
        entry.apply_patch(EntryPatch::new().ai_response(analysis()), t(1)).unwrap();
        let changed = entry.apply_patch(EntryPatch::new().ai_failure(), t(2)).unwrap();

        assert!(!changed);
        assert_eq!(entry.ai_retry_count(), 0);
        assert!(entry.ai_response().is_some());
        assert_eq!(entry.updated_at(), &t(1));
    }

    #[test]
    fn expected_inputs_guard_the_write() {
        let mut entry = entry_at(0);
        let asked = entry.analysis_request();
        entry.apply_patch(EntryPatch::new().belief("Things will improve"), t(1)).unwrap();
        let edited = entry.clone();

        let err = entry
            .apply_patch(EntryPatch::new().expecting_inputs(asked).ai_response(analysis()), t(2))
            .unwrap_err();
        assert!(matches!(err, EntryError::InputsChanged(_)));
        assert_eq!(entry, edited);

        let current = entry.analysis_request();
        entry
            .apply_patch(EntryPatch::new().expecting_inputs(current).ai_response(analysis()), t(3))
            .unwrap();
        assert_eq!(entry.ai_response(), Some(&analysis()));
    }

    #[test]
    fn expected_inputs_refuse_tombstones() {
        let mut entry = entry_at(0);
        let asked = entry.analysis_request();
        entry.soft_delete(t(1)).unwrap();

        let err = entry
            .apply_patch(EntryPatch::new().expecting_inputs(asked).ai_failure(), t(2))
            .unwrap_err();
        assert!(matches!(err, EntryError::Deleted(_)));
        assert_eq!(entry.ai_retry_count(), 0);
    }

    #[test]
    fn editing_belief_discards_stale_analysis() {
        let mut entry = entry_at(0);
        entry.apply_patch(EntryPatch::new().ai_response(analysis()), t(1)).unwrap();
        entry.apply_patch(EntryPatch::new().belief("I'll never work again"), t(2)).unwrap();

        assert!(entry.ai_response().is_none());
        assert!(entry.needs_analysis());
    }

    #[test]
    fn editing_non_input_field_keeps_analysis() {
        let mut entry = entry_at(0);
        entry.apply_patch(EntryPatch::new().ai_response(analysis()), t(1)).unwrap();
        entry.apply_patch(EntryPatch::new().energy(Some("Hopeful".into())), t(2)).unwrap();

        assert!(entry.ai_response().is_some());
    }

    #[test]
    fn rewriting_same_belief_keeps_analysis() {
        let mut entry = entry_at(0);
        entry.apply_patch(EntryPatch::new().ai_response(analysis()), t(1)).unwrap();
        entry.apply_patch(EntryPatch::new().belief("I'm worthless"), t(2)).unwrap();

        assert!(entry.ai_response().is_some());
    }

    #[test]
    fn disputes_append_in_order_and_are_stamped() {
        let mut entry = entry_at(0);
        entry.apply_patch(EntryPatch::new().append_dispute(dispute("first")), t(1)).unwrap();
        let first = entry.dispute_history()[0].clone();
        entry.apply_patch(EntryPatch::new().append_dispute(dispute("second")), t(2)).unwrap();

        assert_eq!(entry.dispute_history().len(), 2);
        assert_eq!(entry.dispute_history()[0], first);
        assert_eq!(entry.dispute_history()[1].generated_at(), &t(2));
        assert_eq!(
            entry.dispute_request().previous_alternatives,
            vec!["first".to_string(), "second".to_string()]
        );
    }

    #[test]
    fn soft_delete_is_idempotent() {
        let mut entry = entry_at(0);
        assert!(entry.soft_delete(t(1)).unwrap());
        let after_first = entry.clone();

        assert!(!entry.soft_delete(t(2)).unwrap());
        assert_eq!(entry, after_first);
        assert_eq!(entry.sync_state(), SyncState::DeletedDirty);
        assert_eq!(entry.dirty_since(), Some(&t(1)));
    }

    #[test]
    fn editing_tombstone_keeps_it_deleted() {
        let mut entry = entry_at(0);
        entry.soft_delete(t(1)).unwrap();
        entry.acknowledge_sync(t(1)).unwrap();
        assert_eq!(entry.sync_state(), SyncState::DeletedSynced);

        entry.apply_patch(EntryPatch::new().energy(Some("x".into())), t(2)).unwrap();
        assert_eq!(entry.sync_state(), SyncState::DeletedDirty);
    }

    #[test]
    fn acknowledgment_covers_only_older_mutations() {
        let mut entry = entry_at(0);
        entry.apply_patch(EntryPatch::new().energy(Some("ok".into())), t(2)).unwrap();

        let stale = entry.acknowledge_sync(t(1)).unwrap();
        assert_eq!(stale, AckDecision::Stale { last_mutation: t(2) });
        assert_eq!(entry.dirty_since(), Some(&t(2)));

        let fresh = entry.acknowledge_sync(t(2)).unwrap();
        assert_eq!(fresh, AckDecision::Acknowledged(SyncState::Clean));
        assert_eq!(entry.dirty_since(), None);
        assert_eq!(entry.updated_at(), &t(2));
    }

    #[test]
    fn remote_wins_only_when_newer_or_tied_and_clean() {
        let mut local = entry_at(0);
        let newer = Entry::from_remote(
            EntrySnapshot { updated_at: t(5), ..local.to_snapshot() },
        )
        .unwrap();
        let tied = Entry::from_remote(local.to_snapshot()).unwrap();

        assert!(local.should_yield_to(&newer));
        assert!(!local.should_yield_to(&tied), "dirty local edit wins ties");

        local.acknowledge_sync(t(0)).unwrap();
        assert!(local.should_yield_to(&tied));
    }

    #[test]
    fn from_snapshot_rejects_retry_count_with_response() {
        let mut snapshot = entry_at(0).to_snapshot();
        snapshot.ai_response = Some(analysis());
        snapshot.ai_retry_count = 3;

        let err = Entry::from_snapshot(snapshot).unwrap_err();
        assert_eq!(err.field(), "ai_retry_count");
    }

    #[test]
    fn from_snapshot_rejects_time_travel() {
        let mut snapshot = entry_at(10).to_snapshot();
        snapshot.updated_at = t(5);
        assert_eq!(Entry::from_snapshot(snapshot).unwrap_err().field(), "updated_at");
    }

    #[test]
    fn from_remote_rejects_years_outside_four_digits() {
        let far = Timestamp::from_datetime(
            chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 10_000, 1, 1, 0, 0, 0).unwrap(),
        );
        let snapshot = EntrySnapshot {
            updated_at: far,
            ..entry_at(0).to_snapshot()
        };

        assert_eq!(Entry::from_remote(snapshot).unwrap_err().field(), "updated_at");
    }

    #[test]
    fn entry_serializes_through_snapshot() {
        let entry = entry_at(0);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["schemaVersion"], 2);
        assert_eq!(json["belief"], "I'm worthless");

        let back: Entry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Energy(String),
            Belief(String),
            AiFailure,
            Analysis,
            Delete,
            Ack(i64),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                "[a-z]{1,8}".prop_map(Op::Energy),
                "[a-z]{1,8}".prop_map(Op::Belief),
                Just(Op::AiFailure),
                Just(Op::Analysis),
                Just(Op::Delete),
                (-5i64..5).prop_map(Op::Ack),
            ]
        }

        proptest! {
            #[test]
            fn updated_at_is_non_decreasing(
                steps in proptest::collection::vec((op(), -60i64..60), 1..40)
            ) {
                let mut entry = entry_at(0);
                let mut clock = 0i64;

                for (op, jump) in steps {
                    clock += jump;
                    let before = *entry.updated_at();
                    let now = t(clock);
                    match op {
                        Op::Energy(text) => {
                            entry.apply_patch(EntryPatch::new().energy(Some(text)), now).unwrap();
                        }
                        Op::Belief(text) => {
                            entry.apply_patch(EntryPatch::new().belief(text), now).unwrap();
                        }
                        Op::AiFailure => {
                            entry.apply_patch(EntryPatch::new().ai_failure(), now).unwrap();
                        }
                        Op::Analysis => {
                            entry.apply_patch(EntryPatch::new().ai_response(analysis()), now).unwrap();
                        }
                        Op::Delete => {
                            entry.soft_delete(now).unwrap();
                        }
                        Op::Ack(offset) => {
                            entry.acknowledge_sync(before.plus_secs(offset)).unwrap();
                        }
                    }

                    prop_assert!(*entry.updated_at() >= before);
                    if let Some(dirty_since) = entry.dirty_since() {
                        prop_assert!(dirty_since <= entry.updated_at());
                    }
                    prop_assert!(entry.created_at() <= entry.updated_at());
                }
            }
        }
    }
}
