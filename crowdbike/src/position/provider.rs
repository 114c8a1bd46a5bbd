//! Provider trait and shared wrapper for the current position.
//!
//! - [`PositionProvider`] - Query API used by the sampling loop
//! - [`SharedPosition`] - Thread-safe slot written by the feed reader

use std::sync::{Arc, PoisonError, RwLock};

use super::state::PositionFix;

/// Trait for querying the current position (pull API).
pub trait PositionProvider: Send + Sync {
    /// Most recent complete fix, or the "no fix" sentinel.
    ///
    /// Never blocks on the position source.
    fn snapshot(&self) -> PositionFix;

    /// Check if a usable fix is currently available.
    fn has_fix(&self) -> bool {
        self.snapshot().has_fix()
    }
}

/// Shared position slot.
///
/// The whole [`PositionFix`] is replaced under a write lock, so a snapshot
/// never mixes fields from two different updates.
///
/// # Usage
///
/// ```
/// use crowdbike::position::{PositionFix, PositionProvider, SharedPosition};
///
/// let shared = SharedPosition::new();
/// assert!(!shared.has_fix());
///
/// let reader_handle = shared.clone();
/// assert_eq!(reader_handle.snapshot(), PositionFix::no_fix());
/// ```
#[derive(Clone, Default)]
pub struct SharedPosition {
    inner: Arc<RwLock<PositionFix>>,
}

impl SharedPosition {
    /// Create a slot holding the "no fix" sentinel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current fix.
    pub fn publish(&self, fix: PositionFix) {
        let mut slot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *slot = fix;
    }

    /// Reset to the "no fix" sentinel.
    pub fn clear(&self) {
        self.publish(PositionFix::no_fix());
    }
}

impl PositionProvider for SharedPosition {
    fn snapshot(&self) -> PositionFix {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SharedPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedPosition")
            .field("fix", &self.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::state::FixMode;
    use std::thread;

    fn fix(latitude: f64, longitude: f64) -> PositionFix {
        PositionFix::new(
            None,
            Some(latitude),
            Some(longitude),
            Some(latitude),
            FixMode::ThreeD,
        )
    }

    #[test]
    fn test_shared_starts_without_fix() {
        let shared = SharedPosition::new();

        assert!(!shared.has_fix());
        assert_eq!(shared.snapshot(), PositionFix::no_fix());
    }

    #[test]
    fn test_publish_and_clear() {
        let shared = SharedPosition::new();

        shared.publish(fix(51.4, 7.2));
        assert!(shared.has_fix());
        assert_eq!(shared.snapshot().latitude, Some(51.4));

        shared.clear();
        assert!(!shared.has_fix());
    }

    #[test]
    fn test_clones_share_the_slot() {
        let writer = SharedPosition::new();
        let reader = writer.clone();

        writer.publish(fix(48.0, 7.8));
        assert_eq!(reader.snapshot().longitude, Some(7.8));
    }

    #[test]
    fn test_snapshots_are_never_torn() {
        let shared = SharedPosition::new();
        let writer = shared.clone();

        // Every published fix has latitude == longitude == altitude
        let handle = thread::spawn(move || {
            for i in 0..10_000 {
                let v = i as f64;
                writer.publish(fix(v, v));
            }
        });

        for _ in 0..10_000 {
            let snapshot = shared.snapshot();
            if snapshot.has_fix() {
                assert_eq!(snapshot.latitude, snapshot.longitude);
                assert_eq!(snapshot.latitude, snapshot.altitude);
            }
        }

        handle.join().unwrap();
    }
}
