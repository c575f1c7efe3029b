//! EnrichmentCoordinator - Runs one AI attempt for an entry and records it.
//!
//! The coordinator never retries. Each call makes at most one AI request and
//! at most one store write, so a dropped future leaves the entry either
//! untouched or fully updated.

use std::sync::Arc;

use crate::domain::entry::{
    AnalyzeBeliefRequest, AnalyzeBeliefResult, DisputeBeliefResult, Entry, EntryPatch,
};
use crate::domain::foundation::EntryId;
use crate::ports::{AiServiceError, BeliefAiService, EntriesAdapter};

use super::EnrichmentError;

#[derive(Clone)]
pub struct EnrichmentCoordinator {
    entries: Arc<dyn EntriesAdapter>,
    ai: Arc<dyn BeliefAiService>,
}

impl EnrichmentCoordinator {
    pub fn new(entries: Arc<dyn EntriesAdapter>, ai: Arc<dyn BeliefAiService>) -> Self {
        Self { entries, ai }
    }

    /// Analyze the entry's belief and store the result.
    ///
    /// # Errors
    ///
    /// - `Deleted` for tombstones (no AI call is made)
    /// - `AiService` when the attempt fails; the failure is counted if the
    ///   entry has no analysis yet
    /// - `Superseded` when the analysis inputs changed during the call
    pub async fn analyze_belief(
        &self,
        entry: &Entry,
    ) -> Result<AnalyzeBeliefResult, EnrichmentError> {
        refuse_tombstone(entry)?;
        let request = entry.analysis_request();

        let outcome = self.ai.analyze_belief(request.clone()).await;
        let result = match outcome {
            Ok(result) => result,
            Err(source) => return Err(self.record_failure(entry.id(), request, source).await),
        };

        let patch = EntryPatch::new()
            .expecting_inputs(request)
            .ai_response(result.clone());
        self.store(entry.id(), patch).await?;

        tracing::info!(
            entry_id = %entry.id(),
            patterns = result.thinking_patterns.len(),
            "Stored belief analysis"
        );
        Ok(result)
    }

    /// Generate a dispute and append it to the entry's history.
    ///
    /// # Errors
    ///
    /// Same as [`analyze_belief`](Self::analyze_belief).
    pub async fn dispute_belief(
        &self,
        entry: &Entry,
    ) -> Result<DisputeBeliefResult, EnrichmentError> {
        refuse_tombstone(entry)?;
        let request = entry.dispute_request();
        let inputs = request.inputs.clone();

        let outcome = self.ai.dispute_belief(request).await;
        let result = match outcome {
            Ok(result) => result,
            Err(source) => return Err(self.record_failure(entry.id(), inputs, source).await),
        };

        let patch = EntryPatch::new()
            .expecting_inputs(inputs)
            .append_dispute(result.clone());
        self.store(entry.id(), patch).await?;

        tracing::info!(
            entry_id = %entry.id(),
            counterpoints = result.counterpoints.len(),
            "Stored belief dispute"
        );
        Ok(result)
    }

    /// Writes an AI result. The adapter checks the patch's expected inputs
    /// atomically with the write.
    async fn store(&self, id: &EntryId, patch: EntryPatch) -> Result<Entry, EnrichmentError> {
        self.entries.update(id, patch).await.map_err(|err| {
            let err = EnrichmentError::from(err);
            if matches!(err, EnrichmentError::Superseded(_)) {
                tracing::warn!(entry_id = %id, "Discarding AI result for edited entry");
            }
            err
        })
    }

    /// Counts a failed attempt when the entry still lacks an analysis and
    /// still has the inputs that were sent.
    ///
    /// Storage errors take precedence over the AI failure.
    async fn record_failure(
        &self,
        id: &EntryId,
        request: AnalyzeBeliefRequest,
        source: AiServiceError,
    ) -> EnrichmentError {
        let patch = EntryPatch::new().expecting_inputs(request).ai_failure();
        let retry_count = match self.entries.update(id, patch).await.map_err(EnrichmentError::from) {
            Ok(current) => current.ai_retry_count(),
            Err(EnrichmentError::Superseded(_)) | Err(EnrichmentError::Deleted(_)) => {
                tracing::warn!(entry_id = %id, error = %source, "AI attempt failed for stale entry");
                return EnrichmentError::AiService {
                    source,
                    retry_count: 0,
                };
            }
            Err(err) => return err,
        };

        tracing::warn!(
            entry_id = %id,
            retry_count,
            retryable = source.is_retryable(),
            error = %source,
            "AI attempt failed"
        );
        EnrichmentError::AiService {
            source,
            retry_count,
        }
    }
}

fn refuse_tombstone(entry: &Entry) -> Result<(), EnrichmentError> {
    if entry.is_deleted() {
        return Err(EnrichmentError::Deleted(entry.id().clone()));
    }
    Ok(())
}
