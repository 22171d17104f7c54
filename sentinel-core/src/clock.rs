//! Ledger clock sources.
//!
//! The protocol never schedules anything itself. Every operation asks the
//! [`Clock`] for the current ledger time once and evaluates all deadlines
//! against that single reading.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::{Timestamp, NANOS_PER_MILLI};

/// Source of the current ledger time.
pub trait Clock: Send + Sync {
    /// Returns the current time. Ledger clocks must not go backwards between calls.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time, clamped so it never moves backwards within a process.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: AtomicU64,
}

impl SystemClock {
    /// Creates a new system clock.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| {
                u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX)
            });
        let previous = self.last.fetch_max(nanos, Ordering::SeqCst);
        Timestamp::from_nanos(previous.max(nanos))
    }
}

/// A clock that only moves when told to.
///
/// Used by tests and by the developer CLI to replay a timeline.
#[derive(Debug, Default)]
pub struct ManualClock {
    nanos: AtomicU64,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    #[must_use]
    pub const fn new(start: Timestamp) -> Self {
        Self {
            nanos: AtomicU64::new(start.as_nanos()),
        }
    }

    /// Creates a clock reading `millis` milliseconds after the epoch.
    #[must_use]
    pub const fn at_millis(millis: u64) -> Self {
        Self::new(Timestamp::from_millis(millis))
    }

    /// Sets the current reading.
    pub fn set(&self, now: Timestamp) {
        self.nanos.store(now.as_nanos(), Ordering::SeqCst);
    }

    /// Sets the current reading in milliseconds.
    pub fn set_millis(&self, millis: u64) {
        self.set(Timestamp::from_millis(millis));
    }

    /// Moves the clock forward by `millis` milliseconds.
    pub fn advance_millis(&self, millis: u64) {
        let delta = millis.saturating_mul(NANOS_PER_MILLI);
        let mut current = self.nanos.load(Ordering::SeqCst);
        loop {
            let next = current.saturating_add(delta);
            match self
                .nanos
                .compare_exchange_weak(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
        assert!(!first.is_zero());
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::at_millis(1_000);
        assert_eq!(clock.now().as_nanos(), 1_000_000_000);
        clock.advance_millis(500);
        assert_eq!(clock.now(), Timestamp::from_millis(1_500));
        clock.set_millis(10);
        assert_eq!(clock.now(), Timestamp::from_millis(10));
    }

    #[test]
    fn test_manual_clock_saturates() {
        let clock = ManualClock::new(Timestamp::from_nanos(u64::MAX - 1));
        clock.advance_millis(1);
        assert_eq!(clock.now().as_nanos(), u64::MAX);
        clock.advance_millis(u64::MAX);
        assert_eq!(clock.now().as_nanos(), u64::MAX);
    }
}
