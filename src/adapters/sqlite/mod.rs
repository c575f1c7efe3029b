//! Embedded SQLite adapters.
//!
//! The schema lives in `migrations/` and is embedded at compile time.

mod entries_adapter;
mod row;

pub use entries_adapter::SqlEntriesAdapter;
pub use row::EntryRow;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::config::DatabaseConfig;
use crate::domain::entry::EntryError;

/// Open a connection pool for `config`.
///
/// File databases are created if missing and run in WAL mode. In-memory
/// databases are private to one connection, so their pool is pinned to a
/// single connection that is never closed for idleness or age.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, EntryError> {
    let mut options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|e| EntryError::storage(format!("Invalid database URL: {}", e)))?
        .create_if_missing(true)
        .foreign_keys(true);
    if !config.is_in_memory() {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool_options = SqlitePoolOptions::new().acquire_timeout(config.acquire_timeout());
    let pool_options = if config.is_in_memory() {
        pool_options
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        pool_options.max_connections(config.max_connections)
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .map_err(|e| EntryError::storage(format!("Failed to open database: {}", e)))?;

    tracing::info!(url = %config.url, in_memory = config.is_in_memory(), "Opened journal database");
    Ok(pool)
}

/// Apply the embedded migrations.
pub async fn migrate(pool: &SqlitePool) -> Result<(), EntryError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| EntryError::storage(format!("Failed to run migrations: {}", e)))?;
    Ok(())
}
