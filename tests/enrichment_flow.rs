//! Integration tests for AI enrichment.
//!
//! These tests verify the end-to-end flow:
//! 1. An entry is created through an `EntriesAdapter`
//! 2. The coordinator (directly or via the worker) asks the AI service
//! 3. Failures are counted on the entry, successes stored, retries scheduled
//!
//! Uses the scripted `MockBeliefService` and `MockAIProvider`, so no network
//! is involved.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use abcde_journal::adapters::ai::{LlmBeliefService, MockAIProvider, MockBeliefService};
use abcde_journal::adapters::{
    AdapterFactory, AdapterKind, ManualClock, SequentialIdGenerator, SqlEntriesAdapter,
    SystemClock, UuidIdGenerator,
};
use abcde_journal::application::{
    enqueue_pending, EnrichmentCoordinator, EnrichmentError, EnrichmentWorker,
};
use abcde_journal::config::{AiConfig, DatabaseConfig, EnrichmentConfig};
use abcde_journal::domain::entry::{
    AnalyzeBeliefResult, DisputeBeliefResult, EntryFilter, EntryPatch, NewEntry,
    ThinkingPatternFinding,
};
use abcde_journal::ports::{AIError, AiServiceError, EntriesAdapter};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn analysis() -> AnalyzeBeliefResult {
    AnalyzeBeliefResult {
        restated_belief: "Losing this job proves I have no worth".to_string(),
        thinking_patterns: vec![ThinkingPatternFinding::new(
            "Labeling",
            "worthless",
            "Defines the whole self by one event",
        )],
        summary: "Labeling swaps a situation for an identity.".to_string(),
    }
}

fn dispute(alternative: &str) -> DisputeBeliefResult {
    DisputeBeliefResult {
        acknowledgement: "Losing a job is hard.".to_string(),
        counterpoints: vec![
            "The company cut a whole department.".to_string(),
            "Your last review praised your work.".to_string(),
        ],
        alternative_belief: alternative.to_string(),
        encouragement: "This is a chapter, not the story.".to_string(),
    }
}

fn lost_job() -> NewEntry {
    NewEntry::new("Lost my job", "I'm worthless")
}

// =============================================================================
// Coordinator
// =============================================================================

#[tokio::test]
async fn retry_count_climbs_then_resets_on_every_backend() {
    for kind in AdapterKind::ALL {
        let fixture = AdapterFactory::build(kind).await.unwrap();
        let ai = MockBeliefService::new()
            .with_analysis_error(AiServiceError::Timeout)
            .with_analysis_error(AiServiceError::Unavailable("offline".to_string()))
            .with_analysis(analysis());
        let coordinator = EnrichmentCoordinator::new(fixture.adapter.clone(), Arc::new(ai));
        let created = fixture.adapter.create(lost_job()).await.unwrap();

        let mut counts = vec![created.ai_retry_count()];
        for attempt in 0..3 {
            fixture.clock.advance_secs(1);
            let current = fixture.adapter.get_by_id(created.id()).await.unwrap().unwrap();
            let outcome = coordinator.analyze_belief(&current).await;

            let stored = fixture.adapter.get_by_id(created.id()).await.unwrap().unwrap();
            counts.push(stored.ai_retry_count());
            assert_eq!(stored.ai_response().is_some(), attempt == 2, "{}", kind);
            assert_eq!(outcome.is_ok(), attempt == 2, "{}", kind);
            assert_eq!(stored.adversity(), "Lost my job");
            assert_eq!(stored.belief(), "I'm worthless");
        }

        assert_eq!(counts, vec![0, 1, 2, 0], "{}", kind);
    }
}

#[tokio::test]
async fn disputes_accumulate_without_rewriting_history() {
    let fixture = AdapterFactory::build(AdapterKind::Sqlite).await.unwrap();
    let ai = MockBeliefService::new()
        .with_dispute(dispute("I lost a job, not my skills"))
        .with_dispute(dispute("I can find work that fits better"));
    let coordinator = EnrichmentCoordinator::new(fixture.adapter.clone(), Arc::new(ai.clone()));
    let created = fixture.adapter.create(lost_job()).await.unwrap();

    coordinator.dispute_belief(&created).await.unwrap();
    let after_first = fixture.adapter.get_by_id(created.id()).await.unwrap().unwrap();
    fixture.clock.advance_secs(1);
    coordinator.dispute_belief(&after_first).await.unwrap();
    let after_second = fixture.adapter.get_by_id(created.id()).await.unwrap().unwrap();

    assert_eq!(after_second.dispute_history().len(), 2);
    assert_eq!(after_second.dispute_history()[0], after_first.dispute_history()[0]);
    assert_eq!(
        ai.dispute_calls()[1].previous_alternatives,
        vec!["I lost a job, not my skills".to_string()]
    );
}

#[tokio::test]
async fn deleted_entries_are_never_sent() {
    let fixture = AdapterFactory::build(AdapterKind::Detached).await.unwrap();
    let ai = MockBeliefService::new().answering_by_default();
    let coordinator = EnrichmentCoordinator::new(fixture.adapter.clone(), Arc::new(ai.clone()));
    let created = fixture.adapter.create(lost_job()).await.unwrap();
    let deleted = fixture.adapter.soft_delete(created.id()).await.unwrap();

    let err = coordinator.analyze_belief(&deleted).await.unwrap_err();

    assert_eq!(err, EnrichmentError::Deleted(created.id().clone()));
    assert_eq!(ai.analyze_call_count(), 0);
}

#[tokio::test]
async fn stale_entry_snapshot_is_refused_once_deleted() {
    let fixture = AdapterFactory::build(AdapterKind::Memory).await.unwrap();
    let ai = MockBeliefService::new().with_analysis(analysis());
    let coordinator = EnrichmentCoordinator::new(fixture.adapter.clone(), Arc::new(ai));
    let created = fixture.adapter.create(lost_job()).await.unwrap();
    fixture.adapter.soft_delete(created.id()).await.unwrap();

    let err = coordinator.analyze_belief(&created).await.unwrap_err();

    assert_eq!(err, EnrichmentError::Deleted(created.id().clone()));
    let stored = fixture.adapter.get_by_id(created.id()).await.unwrap().unwrap();
    assert!(stored.ai_response().is_none());
}

#[tokio::test(start_paused = true)]
async fn edits_during_a_call_supersede_the_result() {
    let fixture = AdapterFactory::build(AdapterKind::Detached).await.unwrap();
    let ai = MockBeliefService::new()
        .with_analysis(analysis())
        .with_delay(Duration::from_secs(2));
    let coordinator = EnrichmentCoordinator::new(fixture.adapter.clone(), Arc::new(ai));
    let created = fixture.adapter.create(lost_job()).await.unwrap();

    let (outcome, _) = tokio::join!(coordinator.analyze_belief(&created), async {
        fixture
            .adapter
            .update(created.id(), EntryPatch::new().adversity("Was laid off"))
            .await
            .unwrap()
    });

    assert_eq!(outcome.unwrap_err(), EnrichmentError::Superseded(created.id().clone()));
    let stored = fixture.adapter.get_by_id(created.id()).await.unwrap().unwrap();
    assert!(stored.ai_response().is_none());
    assert_eq!(stored.ai_retry_count(), 0);
}

#[tokio::test]
async fn llm_backed_service_stores_parsed_analysis() {
    let fixture = AdapterFactory::build(AdapterKind::Memory).await.unwrap();
    let provider = MockAIProvider::new().with_response(
        "```json\n{\"restatedBelief\": \"I have no value without this job\", \
         \"thinkingPatterns\": [{\"label\": \"Labeling\", \"quote\": \"worthless\", \
         \"rationale\": \"A global label\"}, {\"label\": \"Mind reading\", \
         \"quote\": \"they all laughed\", \"rationale\": \"Not in the belief\"}], \
         \"summary\": \"Labels hide the facts.\"}\n```",
    );
    let service = LlmBeliefService::new(Arc::new(provider), &AiConfig::default());
    let coordinator = EnrichmentCoordinator::new(fixture.adapter.clone(), Arc::new(service));
    let created = fixture.adapter.create(lost_job()).await.unwrap();

    let result = coordinator.analyze_belief(&created).await.unwrap();

    assert_eq!(result.pattern_labels(), vec!["Labeling".to_string()]);
    let stored = fixture.adapter.get_by_id(created.id()).await.unwrap().unwrap();
    assert_eq!(stored.ai_response(), Some(&result));
}

#[tokio::test]
async fn provider_errors_are_counted_as_failed_attempts() {
    let fixture = AdapterFactory::build(AdapterKind::Memory).await.unwrap();
    let provider = MockAIProvider::new().with_error(AIError::rate_limited(20));
    let service = LlmBeliefService::new(Arc::new(provider), &AiConfig::default());
    let coordinator = EnrichmentCoordinator::new(fixture.adapter.clone(), Arc::new(service));
    let created = fixture.adapter.create(lost_job()).await.unwrap();

    let err = coordinator.analyze_belief(&created).await.unwrap_err();

    assert_eq!(
        err,
        EnrichmentError::AiService {
            source: AiServiceError::RateLimited { retry_after_secs: 20 },
            retry_count: 1,
        }
    );
    assert!(err.is_retryable());
}

// =============================================================================
// Worker
// =============================================================================

fn worker_config(max_attempts: u32) -> EnrichmentConfig {
    EnrichmentConfig {
        queue_capacity: 8,
        base_delay_ms: 1_000,
        max_delay_ms: 10_000,
        max_attempts,
    }
}

#[tokio::test(start_paused = true)]
async fn worker_enriches_the_backlog_and_retries_failures() {
    let fixture = AdapterFactory::build(AdapterKind::Detached).await.unwrap();
    let first = fixture.adapter.create(lost_job()).await.unwrap();
    let second = fixture
        .adapter
        .create(NewEntry::new("Missed the bus", "Nothing ever works out"))
        .await
        .unwrap();
    let ai = MockBeliefService::new()
        .with_analysis_error(AiServiceError::Timeout)
        .answering_by_default();
    let (worker, queue) =
        EnrichmentWorker::new(fixture.adapter.clone(), Arc::new(ai.clone()), &worker_config(3));
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    assert_eq!(enqueue_pending(fixture.adapter.as_ref(), &queue).await.unwrap(), 2);
    drop(queue);
    let report = worker.run(shutdown_rx).await;

    assert_eq!(report.analysed, 2);
    assert_eq!(report.retried, 1);
    assert_eq!(ai.analyze_call_count(), 3);
    for id in [first.id(), second.id()] {
        let stored = fixture.adapter.get_by_id(id).await.unwrap().unwrap();
        assert!(stored.ai_response().is_some());
        assert_eq!(stored.ai_retry_count(), 0);
    }
    assert!(fixture
        .adapter
        .list(EntryFilter::pending_enrichment())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test(start_paused = true)]
async fn worker_stops_retrying_after_max_attempts() {
    let fixture = AdapterFactory::build(AdapterKind::Memory).await.unwrap();
    let created = fixture.adapter.create(lost_job()).await.unwrap();
    let ai = MockBeliefService::new();
    let (worker, queue) =
        EnrichmentWorker::new(fixture.adapter.clone(), Arc::new(ai.clone()), &worker_config(3));
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    queue.enqueue(created.id().clone()).await.unwrap();
    drop(queue);
    let report = worker.run(shutdown_rx).await;

    assert_eq!(ai.analyze_call_count(), 3);
    assert_eq!(report.retried, 2);
    assert_eq!(report.gave_up, 1);
    let stored = fixture.adapter.get_by_id(created.id()).await.unwrap().unwrap();
    assert_eq!(stored.ai_retry_count(), 3);
    assert!(stored.ai_response().is_none());
}

#[tokio::test(start_paused = true)]
async fn duplicate_ids_are_not_retried_twice() {
    let fixture = AdapterFactory::build(AdapterKind::Memory).await.unwrap();
    let created = fixture.adapter.create(lost_job()).await.unwrap();
    let ai = MockBeliefService::new()
        .with_analysis_error(AiServiceError::Timeout)
        .answering_by_default();
    let (worker, queue) =
        EnrichmentWorker::new(fixture.adapter.clone(), Arc::new(ai.clone()), &worker_config(3));
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    queue.enqueue(created.id().clone()).await.unwrap();
    queue.enqueue(created.id().clone()).await.unwrap();
    drop(queue);
    let report = worker.run(shutdown_rx).await;

    assert_eq!(ai.analyze_call_count(), 2);
    assert_eq!(report.analysed, 1);
    assert_eq!(report.skipped, 1);
}

// =============================================================================
// File-backed store
// =============================================================================

#[tokio::test]
async fn file_store_survives_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig::file(dir.path().join("journal.db"));

    let created = {
        let store = AdapterFactory::open(
            &config,
            Arc::new(ManualClock::new()),
            Arc::new(SequentialIdGenerator::new()),
        )
        .await
        .unwrap();
        let created = store.create(lost_job()).await.unwrap();
        store
            .update(created.id(), EntryPatch::new().ai_response(analysis()))
            .await
            .unwrap()
    };

    let reopened = AdapterFactory::open(&config, Arc::new(SystemClock), Arc::new(UuidIdGenerator))
        .await
        .unwrap();

    assert_eq!(reopened.get_by_id(created.id()).await.unwrap(), Some(created));
    assert_eq!(reopened.count(EntryFilter::all()).await.unwrap(), 1);
}

async fn open_file_store(dir: &tempfile::TempDir) -> SqlEntriesAdapter {
    AdapterFactory::open(
        &DatabaseConfig::file(dir.path().join("journal.db")),
        Arc::new(SystemClock),
        Arc::new(UuidIdGenerator),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn file_store_interleaves_writes_to_different_entries() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_file_store(&dir).await;
    let a = store.create(lost_job()).await.unwrap();
    let b = store.create(lost_job()).await.unwrap();

    for round in 0..50 {
        let (failed, edited) = tokio::join!(
            store.update(a.id(), EntryPatch::new().ai_failure()),
            store.update(b.id(), EntryPatch::new().energy(Some(format!("round {}", round)))),
        );
        failed.unwrap();
        edited.unwrap();
    }

    let a = store.get_by_id(a.id()).await.unwrap().unwrap();
    let b = store.get_by_id(b.id()).await.unwrap().unwrap();
    assert_eq!(a.ai_retry_count(), 50);
    assert_eq!(b.energy(), Some("round 49"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn file_store_accepts_parallel_writers() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_file_store(&dir).await;
    let mut ids = Vec::new();
    for _ in 0..16 {
        ids.push(store.create(lost_job()).await.unwrap().id().clone());
    }

    for round in 0..10 {
        let writers: Vec<_> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let store = store.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    let patch = if i % 2 == 0 {
                        EntryPatch::new().ai_failure()
                    } else {
                        EntryPatch::new().energy(Some(format!("round {}", round)))
                    };
                    store.update(&id, patch).await
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }
    }

    for (i, id) in ids.iter().enumerate() {
        let entry = store.get_by_id(id).await.unwrap().unwrap();
        if i % 2 == 0 {
            assert_eq!(entry.ai_retry_count(), 10);
        } else {
            assert_eq!(entry.energy(), Some("round 9"));
        }
    }
    assert_eq!(store.count(EntryFilter::dirty()).await.unwrap(), 16);
}
