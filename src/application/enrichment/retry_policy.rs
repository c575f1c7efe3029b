//! Exponential backoff for failed enrichment attempts.

use std::time::Duration;

use crate::config::EnrichmentConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    base_delay: Duration,
    max_delay: Duration,
    max_attempts: u32,
}

impl RetryPolicy {
    pub fn new(base_delay: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_delay,
            max_attempts,
        }
    }

    pub fn from_config(config: &EnrichmentConfig) -> Self {
        Self::new(config.base_delay(), config.max_delay(), config.max_attempts)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// How long to wait before the next attempt, given the number of failed
    /// attempts so far. `None` once the entry has used up its attempts.
    ///
    /// `base * 2^(failures - 1)`, capped at `max_delay`. No failures means
    /// no wait.
    pub fn delay_for(&self, failures: u32) -> Option<Duration> {
        if failures >= self.max_attempts {
            return None;
        }
        if failures == 0 {
            return Some(Duration::ZERO);
        }

        let factor = 1u32.checked_shl(failures - 1).unwrap_or(u32::MAX);
        let delay = self
            .base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay);
        Some(delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&EnrichmentConfig::default())
    }
}
