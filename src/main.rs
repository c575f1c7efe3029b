//! Opens the journal store and reports its sync and enrichment backlog.

use std::process::ExitCode;
use std::sync::Arc;

use abcde_journal::adapters::{AdapterFactory, SystemClock, UuidIdGenerator};
use abcde_journal::config::AppConfig;
use abcde_journal::domain::entry::EntryFilter;
use abcde_journal::ports::EntriesAdapter;
use abcde_journal::telemetry;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }
    if let Err(e) = telemetry::init_tracing(&config.logging) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match report(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, code = %e.code(), "Journal store unavailable");
            ExitCode::FAILURE
        }
    }
}

async fn report(config: &AppConfig) -> Result<(), abcde_journal::domain::entry::EntryError> {
    let store = AdapterFactory::open(
        &config.database,
        Arc::new(SystemClock),
        Arc::new(UuidIdGenerator),
    )
    .await?;

    let total = store.count(EntryFilter::all()).await?;
    let dirty = store.count(EntryFilter::dirty()).await?;
    let pending = store.count(EntryFilter::pending_enrichment()).await?;

    tracing::info!(
        url = %config.database.url,
        total,
        dirty,
        pending_enrichment = pending,
        "Journal store ready"
    );
    Ok(())
}
