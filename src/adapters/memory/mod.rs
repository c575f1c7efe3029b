//! In-memory adapters, for tests and development.

mod entries_adapter;

pub use entries_adapter::InMemoryEntriesAdapter;
