//! Deadline arithmetic for heartbeats and grace periods.
//!
//! Everything here is a pure function of the stored timestamps, the configured
//! durations and a single reading of the clock. Nothing derived is ever
//! persisted, so a view computed long after the last trigger still reflects
//! the true elapsed time.
//!
//! Timestamps are `u64` nanoseconds and durations `u64` milliseconds. Deadlines
//! are computed in `u128` nanoseconds: `u64::MAX + u64::MAX * 10^6` is far
//! below `u128::MAX`, so no sum or product here can overflow.

use serde::Serialize;

use crate::types::{Timestamp, NANOS_PER_MILLI};

/// Absolute deadline, in nanoseconds, `duration_ms` after `start`.
#[must_use]
pub fn deadline_nanos(start: Timestamp, duration_ms: u64) -> u128 {
    u128::from(start.as_nanos()) + u128::from(duration_ms) * u128::from(NANOS_PER_MILLI)
}

/// Whole milliseconds left until `deadline`, or zero once it has passed.
#[must_use]
pub fn remaining_millis(deadline: u128, now: Timestamp) -> u64 {
    let now = u128::from(now.as_nanos());
    if deadline <= now {
        return 0;
    }
    u64::try_from((deadline - now) / u128::from(NANOS_PER_MILLI)).unwrap_or(u64::MAX)
}

/// Time-derived status of a vault at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeStatus {
    /// When the heartbeat lapses, in nanoseconds.
    pub deadline: u128,
    /// The heartbeat deadline has strictly passed.
    pub expired: bool,
    /// When the grace period ends, if a warning was raised.
    pub warning_deadline: Option<u128>,
    /// A warning is raised and its grace period is still running.
    pub grace_active: bool,
    /// Expired, warned, and the grace period is over.
    pub execution_ready: bool,
    /// Milliseconds until the heartbeat lapses.
    pub time_remaining_ms: u64,
    /// Milliseconds until the grace period ends; zero when no warning is raised.
    pub warning_grace_remaining_ms: u64,
}

impl TimeStatus {
    /// Evaluates the time policy.
    ///
    /// `now` exactly at the heartbeat deadline is still alive; the grace period
    /// is over at exactly the warning deadline.
    #[must_use]
    pub fn evaluate(
        now: Timestamp,
        last_active: Timestamp,
        heartbeat_interval_ms: u64,
        warning_raised_at: Option<Timestamp>,
        grace_period_ms: u64,
    ) -> Self {
        let now_nanos = u128::from(now.as_nanos());
        let deadline = deadline_nanos(last_active, heartbeat_interval_ms);
        let expired = now_nanos > deadline;

        let warning_deadline =
            warning_raised_at.map(|raised| deadline_nanos(raised, grace_period_ms));
        let grace_active = warning_deadline.is_some_and(|wd| now_nanos < wd);
        let execution_ready = expired && warning_deadline.is_some_and(|wd| now_nanos >= wd);

        Self {
            deadline,
            expired,
            warning_deadline,
            grace_active,
            execution_ready,
            time_remaining_ms: remaining_millis(deadline, now),
            warning_grace_remaining_ms: warning_deadline
                .map_or(0, |wd| remaining_millis(wd, now)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE_MS: u64 = 60_000;

    fn at_ms(ms: u64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    #[test]
    fn test_deadline_boundary_is_inclusive() {
        let status = TimeStatus::evaluate(at_ms(MINUTE_MS), at_ms(0), MINUTE_MS, None, MINUTE_MS);
        assert!(!status.expired);
        assert_eq!(status.time_remaining_ms, 0);

        let one_ns_later = Timestamp::from_nanos(at_ms(MINUTE_MS).as_nanos() + 1);
        let status = TimeStatus::evaluate(one_ns_later, at_ms(0), MINUTE_MS, None, MINUTE_MS);
        assert!(status.expired);
        assert!(!status.execution_ready);
    }

    #[test]
    fn test_grace_window() {
        let raised = Some(at_ms(61_000));

        let during = TimeStatus::evaluate(at_ms(61_000), at_ms(0), MINUTE_MS, raised, MINUTE_MS);
        assert!(during.grace_active);
        assert!(!during.execution_ready);
        assert_eq!(during.warning_grace_remaining_ms, MINUTE_MS);

        let at_end = TimeStatus::evaluate(at_ms(121_000), at_ms(0), MINUTE_MS, raised, MINUTE_MS);
        assert!(!at_end.grace_active);
        assert!(at_end.execution_ready);
        assert_eq!(at_end.warning_grace_remaining_ms, 0);
    }

    #[test]
    fn test_not_ready_without_expiry() {
        // A stale warning after a config change must not make the vault ready
        // while the heartbeat itself is still current.
        let status = TimeStatus::evaluate(
            at_ms(200_000),
            at_ms(0),
            10 * MINUTE_MS,
            Some(at_ms(1_000)),
            MINUTE_MS,
        );
        assert!(!status.expired);
        assert!(!status.execution_ready);
    }

    #[test]
    fn test_extreme_values_do_not_overflow() {
        let status = TimeStatus::evaluate(
            Timestamp::from_nanos(u64::MAX),
            Timestamp::from_nanos(u64::MAX),
            u64::MAX,
            Some(Timestamp::from_nanos(u64::MAX)),
            u64::MAX,
        );
        assert!(!status.expired);
        assert_eq!(status.time_remaining_ms, u64::MAX);
        assert!(status.grace_active);
    }

    #[test]
    fn test_remaining_rounds_down() {
        let deadline = deadline_nanos(at_ms(0), 1);
        assert_eq!(remaining_millis(deadline, Timestamp::from_nanos(1)), 0);
        assert_eq!(remaining_millis(deadline, Timestamp::ZERO), 1);
    }
}
