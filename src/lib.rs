//! ABCDE Journal - Offline-first journal entry store
//!
//! Entries follow the ABCDE model (Adversity, Belief, Consequence, Dispute,
//! Energy). They are written locally first, tracked for sync with a remote
//! copy, and enriched by an AI service that analyses the belief for thinking
//! patterns and proposes disputes.
//!
//! - `domain` - The `Entry` aggregate, patches, filters, sync state, snapshots
//! - `ports` - Storage, AI, clock, and id contracts
//! - `adapters` - In-memory and SQLite stores, AI services, test factory
//! - `application` - Enrichment coordinator and retry worker

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
