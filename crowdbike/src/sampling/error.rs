//! Sampling loop errors.

use std::time::Duration;

use thiserror::Error;

use crate::storage::StorageError;

/// Fatal sampling loop errors.
///
/// Sensor and position failures never show up here; they only leave fields
/// missing in the record.
#[derive(Debug, Error)]
pub enum SamplingError {
    /// The record could not be persisted.
    #[error("Failed to persist record {sequence}: {source}")]
    Persist {
        sequence: u64,
        #[source]
        source: StorageError,
    },

    /// The log could not be prepared or closed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The loop already stopped after a fatal error.
    #[error("Sampling loop is stopped")]
    Stopped,

    /// The sampling period must be positive.
    #[error("Invalid sampling period {0:?}")]
    InvalidPeriod(Duration),
}
