//! EnrichmentWorker - Background analysis of pending entries.
//!
//! Entry ids arrive through an [`EnrichmentQueue`]. For each live entry that
//! still lacks an analysis the worker makes one attempt through the
//! [`EnrichmentCoordinator`] and, on a transient failure, schedules the next
//! attempt with the [`RetryPolicy`].
//!
//! ## Shutdown
//!
//! The worker stops when the shutdown signal flips to `true` (or its sender
//! is dropped), or once every queue handle is dropped and no retries remain.
//! Pending retries are abandoned on shutdown; `enqueue_pending` picks them up
//! again on the next start.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant};

use crate::config::EnrichmentConfig;
use crate::domain::entry::EntryFilter;
use crate::domain::foundation::EntryId;
use crate::ports::{AiServiceError, BeliefAiService, EntriesAdapter};

use super::{EnrichmentCoordinator, EnrichmentError, RetryPolicy};

/// Sending half of the worker's inbox.
#[derive(Debug, Clone)]
pub struct EnrichmentQueue {
    sender: mpsc::Sender<EntryId>,
}

impl EnrichmentQueue {
    /// Queue an entry for analysis. Waits while the queue is full.
    pub async fn enqueue(&self, id: EntryId) -> Result<(), EnrichmentError> {
        self.sender
            .send(id)
            .await
            .map_err(|_| EnrichmentError::QueueClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Queue every live entry still waiting for an analysis.
///
/// Run on startup and after reconnecting. Blocks once the queue is full, so
/// the worker should already be running for large backlogs.
pub async fn enqueue_pending(
    entries: &dyn EntriesAdapter,
    queue: &EnrichmentQueue,
) -> Result<usize, EnrichmentError> {
    let pending = entries.list(EntryFilter::pending_enrichment()).await?;
    let count = pending.len();
    for entry in pending {
        queue.enqueue(entry.id().clone()).await?;
    }

    tracing::info!(count, "Queued entries pending enrichment");
    Ok(count)
}

/// What one job did with its entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Analysed,
    /// Missing, deleted, already analysed, or already scheduled.
    Skipped,
    /// Inputs changed mid-call; the entry runs again immediately.
    Superseded,
    RetryScheduled { retry_count: u32, delay: Duration },
    GaveUp { retry_count: u32 },
}

/// Totals over a worker's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub analysed: usize,
    pub retried: usize,
    pub gave_up: usize,
    pub skipped: usize,
    pub superseded: usize,
    /// Jobs that hit a storage error.
    pub failed: usize,
}

impl EnrichmentReport {
    fn record(&mut self, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Analysed => self.analysed += 1,
            JobOutcome::Skipped => self.skipped += 1,
            JobOutcome::Superseded => self.superseded += 1,
            JobOutcome::RetryScheduled { .. } => self.retried += 1,
            JobOutcome::GaveUp { .. } => self.gave_up += 1,
        }
    }
}

enum Wake {
    Signal,
    Shutdown,
    Received(EntryId),
    InboxClosed,
    RetryDue,
}

pub struct EnrichmentWorker {
    inbox: mpsc::Receiver<EntryId>,
    entries: Arc<dyn EntriesAdapter>,
    coordinator: EnrichmentCoordinator,
    policy: RetryPolicy,
    retries: BinaryHeap<Reverse<(Instant, EntryId)>>,
    scheduled: HashSet<EntryId>,
    report: EnrichmentReport,
}

impl EnrichmentWorker {
    /// Create a worker and the queue that feeds it.
    pub fn new(
        entries: Arc<dyn EntriesAdapter>,
        ai: Arc<dyn BeliefAiService>,
        config: &EnrichmentConfig,
    ) -> (Self, EnrichmentQueue) {
        let (sender, inbox) = mpsc::channel(config.queue_capacity.max(1));
        let worker = Self {
            inbox,
            coordinator: EnrichmentCoordinator::new(entries.clone(), ai),
            entries,
            policy: RetryPolicy::from_config(config),
            retries: BinaryHeap::new(),
            scheduled: HashSet::new(),
            report: EnrichmentReport::default(),
        };
        (worker, EnrichmentQueue { sender })
    }

    /// Run until shutdown, returning the totals.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> EnrichmentReport {
        let mut inbox_open = true;

        loop {
            if *shutdown.borrow() || (!inbox_open && self.retries.is_empty()) {
                break;
            }
            let next_retry = self.retries.peek().map(|Reverse((at, _))| *at);

            let wake = tokio::select! {
                changed = shutdown.changed() => match changed {
                    Ok(()) => Wake::Signal,
                    Err(_) => Wake::Shutdown,
                },
                received = self.inbox.recv(), if inbox_open => match received {
                    Some(id) => Wake::Received(id),
                    None => Wake::InboxClosed,
                },
                _ = time::sleep_until(next_retry.unwrap_or_else(Instant::now)), if next_retry.is_some() => {
                    Wake::RetryDue
                }
            };

            match wake {
                Wake::Signal => continue,
                Wake::Shutdown => break,
                Wake::InboxClosed => inbox_open = false,
                Wake::Received(id) => {
                    if self.scheduled.contains(&id) {
                        tracing::debug!(entry_id = %id, "Entry already scheduled");
                        self.report.record(&JobOutcome::Skipped);
                    } else {
                        self.handle(id).await;
                    }
                }
                Wake::RetryDue => {
                    if let Some(Reverse((_, id))) = self.retries.pop() {
                        self.scheduled.remove(&id);
                        self.handle(id).await;
                    }
                }
            }
        }

        tracing::info!(
            analysed = self.report.analysed,
            retried = self.report.retried,
            gave_up = self.report.gave_up,
            pending_retries = self.retries.len(),
            "Enrichment worker stopped"
        );
        self.report
    }

    /// Make one attempt for `id` without scheduling anything.
    pub async fn process(&self, id: &EntryId) -> Result<JobOutcome, EnrichmentError> {
        let entry = match self.entries.get_by_id(id).await? {
            Some(entry) if entry.needs_analysis() => entry,
            _ => return Ok(JobOutcome::Skipped),
        };
        if self.policy.delay_for(entry.ai_retry_count()).is_none() {
            return Ok(JobOutcome::GaveUp {
                retry_count: entry.ai_retry_count(),
            });
        }

        match self.coordinator.analyze_belief(&entry).await {
            Ok(_) => Ok(JobOutcome::Analysed),
            Err(EnrichmentError::Deleted(_)) => Ok(JobOutcome::Skipped),
            Err(EnrichmentError::Superseded(_)) => Ok(JobOutcome::Superseded),
            Err(EnrichmentError::AiService {
                source,
                retry_count,
            }) => Ok(self.after_failure(id, &source, retry_count)),
            Err(err) => Err(err),
        }
    }

    fn after_failure(&self, id: &EntryId, source: &AiServiceError, retry_count: u32) -> JobOutcome {
        let delay = if source.is_retryable() {
            self.policy.delay_for(retry_count)
        } else {
            None
        };

        match delay {
            Some(delay) => {
                let delay = match source {
                    AiServiceError::RateLimited { retry_after_secs } => {
                        delay.max(Duration::from_secs(u64::from(*retry_after_secs)))
                    }
                    _ => delay,
                };
                JobOutcome::RetryScheduled { retry_count, delay }
            }
            None => {
                tracing::warn!(entry_id = %id, retry_count, error = %source, "Giving up on enrichment");
                JobOutcome::GaveUp { retry_count }
            }
        }
    }

    async fn handle(&mut self, id: EntryId) {
        match self.process(&id).await {
            Ok(outcome) => {
                match &outcome {
                    JobOutcome::RetryScheduled { delay, .. } => self.schedule(id, *delay),
                    JobOutcome::Superseded => self.schedule(id, Duration::ZERO),
                    _ => {}
                }
                self.report.record(&outcome);
            }
            Err(err) => {
                tracing::error!(entry_id = %id, error = %err, "Enrichment job failed");
                self.report.failed += 1;
            }
        }
    }

    fn schedule(&mut self, id: EntryId, delay: Duration) {
        if self.scheduled.insert(id.clone()) {
            self.retries.push(Reverse((Instant::now() + delay, id)));
        }
    }
}
