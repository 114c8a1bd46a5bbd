//! Position feed reader - background task draining a position source.
//!
//! The [`PositionFeedReader`] consumes a [`PositionSource`] continuously and
//! publishes every update into a [`SharedPosition`] slot.
//!
//! # Design
//!
//! - `new()` + `spawn()` → spawns async task
//! - `tokio::select!` on the cancellation token for a clean stop
//! - Stream errors publish "no fix" and back off exponentially (capped)
//! - No update within `stale_after` publishes "no fix" until data resumes

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::provider::SharedPosition;
use super::source::PositionSource;
use super::state::PositionFix;

/// Default time without updates before the fix is considered lost.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(5);

/// Default maximum reconnect backoff.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Configuration for the feed reader.
#[derive(Debug, Clone)]
pub struct PositionFeedReaderConfig {
    /// Time without any update after which "no fix" is published.
    pub stale_after: Duration,

    /// Upper bound for the backoff between failed stream attempts.
    pub max_backoff: Duration,
}

impl Default for PositionFeedReaderConfig {
    fn default() -> Self {
        Self {
            stale_after: DEFAULT_STALE_AFTER,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

/// Counters reported when the reader stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// Updates published (fix or no fix).
    pub updates: u64,
    /// Stream errors encountered.
    pub errors: u64,
    /// Times the fix was dropped for lack of updates.
    pub stale_timeouts: u64,
}

/// Background consumer of a position stream.
pub struct PositionFeedReader<S: PositionSource> {
    source: S,
    shared: SharedPosition,
    config: PositionFeedReaderConfig,
}

impl<S: PositionSource + 'static> PositionFeedReader<S> {
    /// Create a reader publishing into `shared`.
    pub fn new(source: S, shared: SharedPosition, config: PositionFeedReaderConfig) -> Self {
        Self {
            source,
            shared,
            config,
        }
    }

    /// Start the reader as an async task.
    ///
    /// The task runs until `cancellation` is triggered and returns its
    /// counters.
    pub fn spawn(self, cancellation: CancellationToken) -> JoinHandle<ReaderStats> {
        tokio::spawn(self.run(cancellation))
    }

    /// Run the consume loop.
    pub async fn run(mut self, cancellation: CancellationToken) -> ReaderStats {
        tracing::info!(
            stale_after_ms = self.config.stale_after.as_millis() as u64,
            "Position feed reader started"
        );

        let mut stats = ReaderStats::default();
        let mut consecutive_errors: u32 = 0;
        let mut had_fix = false;

        loop {
            let next = tokio::select! {
                _ = cancellation.cancelled() => break,
                result = tokio::time::timeout(self.config.stale_after, self.source.next_update()) => result,
            };

            match next {
                Ok(Ok(fix)) => {
                    consecutive_errors = 0;
                    stats.updates += 1;

                    if fix.has_fix() != had_fix {
                        if fix.has_fix() {
                            tracing::info!(mode = %fix.mode, "Position fix acquired");
                        } else {
                            tracing::info!("Position fix lost");
                        }
                        had_fix = fix.has_fix();
                    }

                    tracing::trace!(
                        lat = ?fix.latitude,
                        lon = ?fix.longitude,
                        alt = ?fix.altitude,
                        mode = %fix.mode,
                        "Position update"
                    );
                    self.shared.publish(fix);
                }
                Ok(Err(e)) => {
                    consecutive_errors += 1;
                    stats.errors += 1;
                    self.shared.publish(PositionFix::no_fix());
                    had_fix = false;

                    let backoff = calculate_backoff(consecutive_errors, self.config.max_backoff);
                    if consecutive_errors == 1 {
                        tracing::warn!(error = %e, "Position stream failed, retrying");
                    } else {
                        tracing::debug!(
                            error = %e,
                            consecutive_errors,
                            backoff_ms = backoff.as_millis() as u64,
                            "Position stream still failing"
                        );
                    }

                    tokio::select! {
                        _ = cancellation.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
                Err(_) => {
                    if had_fix {
                        tracing::info!(
                            stale_after_ms = self.config.stale_after.as_millis() as u64,
                            "No position update received, dropping fix"
                        );
                        stats.stale_timeouts += 1;
                        had_fix = false;
                    }
                    self.shared.publish(PositionFix::no_fix());
                }
            }
        }

        self.shared.clear();
        tracing::info!(
            updates = stats.updates,
            errors = stats.errors,
            "Position feed reader stopped"
        );
        stats
    }
}

/// Exponential backoff: 2^(n-1) × 250ms, capped at `max`.
fn calculate_backoff(consecutive_errors: u32, max: Duration) -> Duration {
    let exponent = consecutive_errors.saturating_sub(1).min(16);
    Duration::from_millis(250u64.saturating_mul(1 << exponent)).min(max)
}
