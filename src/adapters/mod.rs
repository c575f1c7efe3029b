//! Adapters - Implementations of port interfaces.
//!
//! - `memory` - In-memory entries adapter
//! - `sqlite` - Embedded SQLite entries adapter (pooled or detached)
//! - `ai` - Belief AI service and completion provider implementations
//! - `factory` - Builds backends for tests and bootstrap

pub mod ai;
mod clock;
mod factory;
mod ids;
pub mod memory;
pub mod sqlite;

pub use clock::{ManualClock, SystemClock};
pub use factory::{AdapterFactory, AdapterFixture, AdapterKind};
pub use ids::{SequentialIdGenerator, UuidIdGenerator};
pub use memory::InMemoryEntriesAdapter;
pub use sqlite::SqlEntriesAdapter;
