//! Enrichment worker configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Queue sizing and retry backoff for the enrichment worker
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    /// Bounded queue capacity (entry ids waiting for analysis)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Upper bound on any retry delay, in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Give up once an entry has failed this many times
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl EnrichmentConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Validate enrichment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.queue_capacity == 0 {
            return Err(ValidationError::InvalidValue("enrichment.queue_capacity"));
        }
        if self.max_attempts == 0 {
            return Err(ValidationError::InvalidValue("enrichment.max_attempts"));
        }
        if self.base_delay_ms == 0 {
            return Err(ValidationError::InvalidTimeout("enrichment.base_delay_ms"));
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(ValidationError::InvalidBackoff);
        }
        Ok(())
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_queue_capacity() -> usize {
    256
}

fn default_base_delay() -> u64 {
    2_000
}

fn default_max_delay() -> u64 {
    300_000
}

fn default_max_attempts() -> u32 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enrichment_defaults() {
        let config = EnrichmentConfig::default();
        assert_eq!(config.base_delay(), Duration::from_secs(2));
        assert_eq!(config.max_delay(), Duration::from_secs(300));
        assert_eq!(config.max_attempts, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_base_delay_above_max_rejected() {
        let config = EnrichmentConfig {
            base_delay_ms: 10_000,
            max_delay_ms: 1_000,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidBackoff));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = EnrichmentConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
