//! Clock adapters.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::domain::foundation::Timestamp;
use crate::ports::Clock;

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Deterministic clock for tests.
///
/// Time only moves when told to, or by a fixed step after every reading when
/// built with `with_auto_advance`.
#[derive(Debug)]
pub struct ManualClock {
    nanos: AtomicI64,
    step_nanos: i64,
}

impl ManualClock {
    /// Starts at 2024-01-01T00:00:00Z.
    pub fn new() -> Self {
        Self::starting_at(Timestamp::from_unix_nanos(1_704_067_200_000_000_000))
    }

    pub fn starting_at(start: Timestamp) -> Self {
        Self {
            nanos: AtomicI64::new(start.as_unix_nanos()),
            step_nanos: 0,
        }
    }

    /// Advance by `step_millis` after every `now()`.
    pub fn with_auto_advance(mut self, step_millis: i64) -> Self {
        self.step_nanos = step_millis.saturating_mul(1_000_000);
        self
    }

    pub fn set(&self, at: Timestamp) {
        self.nanos.store(at.as_unix_nanos(), Ordering::SeqCst);
    }

    pub fn advance_millis(&self, millis: i64) {
        self.nanos
            .fetch_add(millis.saturating_mul(1_000_000), Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance_millis(secs.saturating_mul(1_000));
    }

    /// Current reading without advancing.
    pub fn peek(&self) -> Timestamp {
        Timestamp::from_unix_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        let nanos = self.nanos.fetch_add(self.step_nanos, Ordering::SeqCst);
        Timestamp::from_unix_nanos(nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_stands_still_until_advanced() {
        let clock = ManualClock::new();
        let first = clock.now();
        assert_eq!(clock.now(), first);

        clock.advance_secs(5);
        assert_eq!(clock.now(), first.plus_secs(5));
    }

    #[test]
    fn auto_advance_steps_after_each_reading() {
        let clock = ManualClock::new().with_auto_advance(10);
        let first = clock.now();
        let second = clock.now();
        assert_eq!(second, first.plus_millis(10));
        assert_eq!(clock.peek(), first.plus_millis(20));
    }

    #[test]
    fn clock_can_be_set_backwards() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.set(start.plus_secs(-60));
        assert!(clock.now().is_before(&start));
    }

    #[test]
    fn system_clock_is_close_to_now() {
        let before = Timestamp::now();
        let reading = SystemClock.now();
        assert!(!reading.is_before(&before));
    }
}
