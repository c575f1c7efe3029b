//! Entry module - the ABCDE journal record and its sync metadata.
//!
//! # Module Structure
//!
//! - `aggregate` - Entry aggregate and creation input
//! - `patch` - Partial updates merged by `update`
//! - `sync_state` - Dirty/tombstone state machine and sync outcomes
//! - `enrichment` - AI analysis and dispute value objects
//! - `filter` - Listing filters shared by every backend
//! - `snapshot` - Versioned JSON form with legacy upcasting
//! - `errors` - Entry-specific errors

mod aggregate;
mod enrichment;
mod errors;
mod filter;
mod patch;
mod snapshot;
mod sync_state;

pub use aggregate::{Entry, NewEntry};
pub use enrichment::{
    AnalyzeBeliefRequest, AnalyzeBeliefResult, DisputeBeliefRequest, DisputeBeliefResult,
    DisputeRecord, ThinkingPatternFinding,
};
pub use errors::EntryError;
pub use filter::{AccountFilter, DeletedFilter, EntryFilter, SortOrder};
pub use patch::EntryPatch;
pub use snapshot::{EntrySnapshot, SnapshotError};
pub use sync_state::{AckDecision, MarkSyncedOutcome, PullOutcome, SyncState};
