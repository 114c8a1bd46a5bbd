//! Storage error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the data log.
///
/// Any of these during `append` ends the session.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The log directory could not be created.
    #[error("Failed to create log directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The log file could not be opened.
    #[error("Failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing to the log file failed.
    #[error("Failed to write log file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Reading the log file back failed.
    #[error("Failed to read log file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file does not start with the expected header.
    #[error("Unexpected header in {path}: '{found}'")]
    Header { path: PathBuf, found: String },

    /// A data row could not be parsed.
    #[error("Invalid row '{line}': {reason}")]
    Parse { line: String, reason: String },

    /// Append was called after `close`.
    #[error("Log file {0} is closed")]
    Closed(PathBuf),
}
