//! Clock port.

use crate::domain::foundation::Timestamp;

/// Source of the current instant.
///
/// Every store mutation is stamped through this port so tests can drive time
/// explicitly.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_object_safe() {
        fn _accepts_dyn(_clock: &dyn Clock) {}
    }
}
