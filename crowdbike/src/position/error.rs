//! Error types for position sources.

use thiserror::Error;

/// Errors that can occur while consuming a position stream.
#[derive(Debug, Error)]
pub enum PositionError {
    /// Could not reach the position daemon.
    #[error("Failed to connect to {address}: {source}")]
    Connect {
        address: String,
        source: std::io::Error,
    },

    /// Connection attempt exceeded the configured timeout.
    #[error("Timed out connecting to {0}")]
    ConnectTimeout(String),

    /// Reading from or writing to the stream failed.
    #[error("Position stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The daemon closed the stream.
    #[error("Position stream closed by peer")]
    Closed,
}
