//! Application layer - Use cases that coordinate ports.
//!
//! Entry CRUD goes straight through `EntriesAdapter`; this layer adds the
//! flows that span several ports, such as AI enrichment.

pub mod enrichment;

pub use enrichment::{
    enqueue_pending, EnrichmentCoordinator, EnrichmentError, EnrichmentQueue, EnrichmentReport,
    EnrichmentWorker, JobOutcome, RetryPolicy,
};
