//! Adapter factory.
//!
//! Builds entry backends for tests and bootstrap. Each fixture owns its own
//! clock and id generator so parallel tests never share state.

use std::fmt;
use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::domain::entry::EntryError;
use crate::ports::{Clock, EntriesAdapter, IdGenerator};

use super::memory::InMemoryEntriesAdapter;
use super::sqlite::{self, SqlEntriesAdapter};
use super::{ManualClock, SequentialIdGenerator};

/// Which backend to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    /// `InMemoryEntriesAdapter`
    Memory,
    /// `SqlEntriesAdapter` without a database
    Detached,
    /// `SqlEntriesAdapter` over a migrated `sqlite::memory:` pool
    Sqlite,
}

impl AdapterKind {
    pub const ALL: [AdapterKind; 3] = [AdapterKind::Memory, AdapterKind::Detached, AdapterKind::Sqlite];
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdapterKind::Memory => "memory",
            AdapterKind::Detached => "detached",
            AdapterKind::Sqlite => "sqlite",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone)]
enum Concrete {
    Memory(InMemoryEntriesAdapter),
    Sql(SqlEntriesAdapter),
}

/// A freshly built backend plus the controls a test needs.
pub struct AdapterFixture {
    pub kind: AdapterKind,
    pub adapter: Arc<dyn EntriesAdapter>,
    pub clock: Arc<ManualClock>,
    pub ids: Arc<SequentialIdGenerator>,
    concrete: Concrete,
}

impl AdapterFixture {
    /// Remove every entry, keeping the schema. Safe to call repeatedly.
    pub async fn cleanup(&self) -> Result<(), EntryError> {
        match &self.concrete {
            Concrete::Memory(adapter) => {
                adapter.wipe().await;
                Ok(())
            }
            Concrete::Sql(adapter) => adapter.wipe().await,
        }
    }
}

pub struct AdapterFactory;

impl AdapterFactory {
    /// Build a backend of `kind` with a fresh manual clock and sequential ids.
    pub async fn build(kind: AdapterKind) -> Result<AdapterFixture, EntryError> {
        let clock = Arc::new(ManualClock::new());
        let ids = Arc::new(SequentialIdGenerator::new());
        let (clock_port, ids_port): (Arc<dyn Clock>, Arc<dyn IdGenerator>) =
            (clock.clone(), ids.clone());

        let concrete = match kind {
            AdapterKind::Memory => {
                Concrete::Memory(InMemoryEntriesAdapter::new(clock_port, ids_port))
            }
            AdapterKind::Detached => Concrete::Sql(SqlEntriesAdapter::new(None, clock_port, ids_port)),
            AdapterKind::Sqlite => {
                let pool = sqlite::connect(&DatabaseConfig::in_memory()).await?;
                sqlite::migrate(&pool).await?;
                Concrete::Sql(SqlEntriesAdapter::new(Some(pool), clock_port, ids_port))
            }
        };

        let adapter: Arc<dyn EntriesAdapter> = match &concrete {
            Concrete::Memory(adapter) => Arc::new(adapter.clone()),
            Concrete::Sql(adapter) => Arc::new(adapter.clone()),
        };

        Ok(AdapterFixture {
            kind,
            adapter,
            clock,
            ids,
            concrete,
        })
    }

    /// Open a persisted SQLite backend described by `config`.
    pub async fn open(
        config: &DatabaseConfig,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<SqlEntriesAdapter, EntryError> {
        let pool = sqlite::connect(config).await?;
        if config.run_migrations {
            sqlite::migrate(&pool).await?;
        }
        Ok(SqlEntriesAdapter::new(Some(pool), clock, ids))
    }
}
