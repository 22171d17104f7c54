//! Policy constants for heartbeat and grace durations.
//!
//! These are fixed for a deployment; callers cannot change them at runtime.

/// Shortest heartbeat interval an owner may configure (1 minute).
pub const MIN_INTERVAL_MS: u64 = 60_000;

/// Interval used when none is given or the given one is below the floor (30 days).
pub const DEFAULT_INTERVAL_MS: u64 = 30 * 24 * 60 * 60 * 1000;

/// Grace period used when none is given or the given one is below the floor (24 hours).
pub const DEFAULT_GRACE_PERIOD_MS: u64 = 24 * 60 * 60 * 1000;

/// Shortest grace period an owner may configure (1 minute).
pub const MIN_GRACE_PERIOD_MS: u64 = 60_000;

/// Returns the heartbeat interval to use at vault creation.
///
/// Missing or sub-floor values fall back to [`DEFAULT_INTERVAL_MS`].
#[must_use]
pub fn effective_interval_ms(requested: Option<u64>) -> u64 {
    requested
        .filter(|ms| *ms >= MIN_INTERVAL_MS)
        .unwrap_or(DEFAULT_INTERVAL_MS)
}

/// Returns the grace period to use at vault creation.
///
/// Missing or sub-floor values fall back to [`DEFAULT_GRACE_PERIOD_MS`].
#[must_use]
pub fn effective_grace_period_ms(requested: Option<u64>) -> u64 {
    requested
        .filter(|ms| *ms >= MIN_GRACE_PERIOD_MS)
        .unwrap_or(DEFAULT_GRACE_PERIOD_MS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(None => DEFAULT_INTERVAL_MS ; "unspecified")]
    #[test_case(Some(0) => DEFAULT_INTERVAL_MS ; "zero")]
    #[test_case(Some(59_999) => DEFAULT_INTERVAL_MS ; "one below floor")]
    #[test_case(Some(60_000) => 60_000 ; "at floor")]
    #[test_case(Some(3_600_000) => 3_600_000 ; "above floor")]
    fn interval_floor(requested: Option<u64>) -> u64 {
        effective_interval_ms(requested)
    }

    #[test_case(None => DEFAULT_GRACE_PERIOD_MS ; "unspecified")]
    #[test_case(Some(59_999) => DEFAULT_GRACE_PERIOD_MS ; "one below floor")]
    #[test_case(Some(60_000) => 60_000 ; "at floor")]
    fn grace_floor(requested: Option<u64>) -> u64 {
        effective_grace_period_ms(requested)
    }
}
