//! Append-only data log.
//!
//! The sampling loop writes one row per cycle through the [`AppendLog`]
//! trait. [`CsvAppendLog`] is the production implementation; tests swap in
//! in-memory or failing logs.

mod csv;
mod error;
mod path;

pub use self::csv::{format_row, header_line, parse_row, read_records, CsvAppendLog};
pub use error::StorageError;
pub use path::log_file_path;

use crate::record::SensorRecord;

/// Append-only record sink.
pub trait AppendLog: Send {
    /// Create the log with its header if it does not exist yet.
    ///
    /// Safe to call on an existing log; the header is never written twice.
    fn ensure_initialized(&mut self) -> Result<(), StorageError>;

    /// Append one record.
    fn append(&mut self, record: &SensorRecord) -> Result<(), StorageError>;

    /// Flush and release the log. Later appends fail.
    fn close(&mut self) -> Result<(), StorageError>;
}
