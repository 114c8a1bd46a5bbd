//! Cycle pacing.

use std::time::Duration;

/// Time to sleep after a cycle that took `elapsed` out of `period`.
///
/// Returns zero once the cycle overran. Missed time is never made up, so a
/// run of overruns shifts later cycles instead of bunching them.
pub fn sleep_duration(period: Duration, elapsed: Duration) -> Duration {
    period.saturating_sub(elapsed)
}

/// Whether a cycle used its whole period.
pub fn is_overrun(period: Duration, elapsed: Duration) -> bool {
    elapsed >= period
}
