//! Sampling loop lifecycle.

use std::fmt;

/// Phase of the sampling loop.
///
/// ```text
/// Idle → Acquiring → Persisting → Pacing → Acquiring → …
///                         │
///                         └─ append failure ─→ Stopped
/// ```
///
/// `Stopped` is reached on cancellation or a fatal persistence error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Idle,
    /// Reading sensors and the position snapshot.
    Acquiring,
    /// Calibrating, assembling and appending the record.
    Persisting,
    /// Sleeping out the rest of the period.
    Pacing,
    Stopped,
}

impl LoopState {
    pub fn is_stopped(&self) -> bool {
        matches!(self, LoopState::Stopped)
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopState::Idle => "idle",
            LoopState::Acquiring => "acquiring",
            LoopState::Persisting => "persisting",
            LoopState::Pacing => "pacing",
            LoopState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
