//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `ABCDE_JOURNAL` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use abcde_journal::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Journal database at {}", config.database.url);
//! ```

mod ai;
mod database;
mod enrichment;
mod error;
mod logging;

pub use ai::AiConfig;
pub use database::DatabaseConfig;
pub use enrichment::EnrichmentConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a working
/// file-backed store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Embedded SQLite database
    #[serde(default)]
    pub database: DatabaseConfig,

    /// AI request settings
    #[serde(default)]
    pub ai: AiConfig,

    /// Enrichment queue and retry backoff
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Log filter and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `ABCDE_JOURNAL` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `ABCDE_JOURNAL__DATABASE__URL=sqlite::memory:` -> `database.url`
    /// - `ABCDE_JOURNAL__ENRICHMENT__MAX_ATTEMPTS=3` -> `enrichment.max_attempts`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ABCDE_JOURNAL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()?;
        self.ai.validate()?;
        self.enrichment.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
