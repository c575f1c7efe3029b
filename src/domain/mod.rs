//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `entry` - Journal entry aggregate, sync state, AI enrichment values

pub mod entry;
pub mod foundation;
