//! Injectable time source
//!
//! Every expiry decision in the cache goes through a [`Clock`] so that the
//! renewal window can be tested at exact boundaries.

use std::fmt;
use std::time::SystemTime;

/// Supplies the current wall-clock time
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current time
    fn now(&self) -> SystemTime;
}

/// Clock backed by [`SystemTime::now`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

#[cfg(any(test, feature = "test-util"))]
pub use manual::ManualClock;

#[cfg(any(test, feature = "test-util"))]
mod manual {
    use super::Clock;
    use parking_lot::Mutex;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    /// Clock that only moves when told to
    #[derive(Debug)]
    pub struct ManualClock {
        now: Mutex<SystemTime>,
    }

    impl ManualClock {
        /// Start at `now`
        pub fn new(now: SystemTime) -> Self {
            Self {
                now: Mutex::new(now),
            }
        }

        /// Start at `secs` seconds after the Unix epoch
        pub fn at_unix_secs(secs: u64) -> Self {
            Self::new(UNIX_EPOCH + Duration::from_secs(secs))
        }

        /// Move forward by `by`
        pub fn advance(&self, by: Duration) {
            let mut now = self.now.lock();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> SystemTime {
            *self.now.lock()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_system_clock_is_after_2020() {
        let now = SystemClock.now();
        assert!(now > UNIX_EPOCH + Duration::from_secs(1_600_000_000));
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::at_unix_secs(1_000);
        assert_eq!(clock.now(), UNIX_EPOCH + Duration::from_secs(1_000));

        clock.advance(Duration::from_millis(1_500));
        assert_eq!(clock.now(), UNIX_EPOCH + Duration::from_millis(1_001_500));
    }
}
