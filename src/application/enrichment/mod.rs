//! AI enrichment of journal entries.
//!
//! - `EnrichmentCoordinator` - One analysis or dispute attempt, recorded on the entry
//! - `RetryPolicy` - Backoff between failed attempts
//! - `EnrichmentWorker` / `EnrichmentQueue` - Background analysis with retries

mod coordinator;
mod errors;
mod retry_policy;
mod worker;

pub use coordinator::EnrichmentCoordinator;
pub use errors::EnrichmentError;
pub use retry_policy::RetryPolicy;
pub use worker::{enqueue_pending, EnrichmentQueue, EnrichmentReport, EnrichmentWorker, JobOutcome};
