//! CSV data log.
//!
//! Rows follow [`COLUMNS`]. A missing value is an empty field, so a row for
//! a cycle without fix or sensors looks like
//!
//! ```text
//! 07,12,2019-01-21 10:00:05,,,,,,,,,,,,
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use tracing::{debug, info, warn};

use super::{AppendLog, StorageError};
use crate::record::{SensorRecord, COLUMNS};

/// Format of the `Raspberry_Time` column.
const CAPTURE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How much of the end of an existing log is inspected for a partial row.
const TAIL_CHECK_LEN: u64 = 4096;

/// The header line, without line terminator.
pub fn header_line() -> String {
    COLUMNS.join(",")
}

/// Serialize a record as one CSV line, without line terminator.
pub fn format_row(record: &SensorRecord) -> String {
    let mut fields = Vec::with_capacity(COLUMNS.len());
    fields.push(quote(&record.device_id));
    fields.push(record.sequence.to_string());
    fields.push(record.captured_at.format(CAPTURE_TIME_FORMAT).to_string());
    fields.push(
        record
            .gps_time
            .map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            .unwrap_or_default(),
    );
    fields.extend(record.measurements().into_iter().map(|(_, v)| format_value(v)));
    fields.join(",")
}

/// Parse one data line back into a record.
///
/// The operator is not stored in rows (it is part of the file name) and has
/// to be supplied.
pub fn parse_row(line: &str, operator: &str) -> Result<SensorRecord, StorageError> {
    let invalid = |reason: String| StorageError::Parse {
        line: line.to_string(),
        reason,
    };

    let fields = split_fields(line).map_err(invalid)?;
    if fields.len() != COLUMNS.len() {
        return Err(invalid(format!(
            "expected {} fields, found {}",
            COLUMNS.len(),
            fields.len()
        )));
    }

    let sequence = fields[1]
        .parse::<u64>()
        .map_err(|e| invalid(format!("Record: {}", e)))?;
    let captured_at = NaiveDateTime::parse_from_str(&fields[2], CAPTURE_TIME_FORMAT)
        .map_err(|e| invalid(format!("Raspberry_Time: {}", e)))?
        .and_utc();
    let gps_time = if fields[3].is_empty() {
        None
    } else {
        Some(
            DateTime::parse_from_rfc3339(&fields[3])
                .map_err(|e| invalid(format!("GPS_Time: {}", e)))?
                .with_timezone(&Utc),
        )
    };

    let mut values = [None; 11];
    for (slot, (field, column)) in values
        .iter_mut()
        .zip(fields[4..].iter().zip(&COLUMNS[4..]))
    {
        *slot = parse_value(field).map_err(|e| invalid(format!("{}: {}", column, e)))?;
    }
    let [altitude, latitude, longitude, temperature, temperature_raw, humidity, humidity_raw, vapour_pressure, vapour_pressure_raw, pm10, pm2_5] =
        values;

    Ok(SensorRecord {
        device_id: fields[0].clone(),
        operator: operator.to_string(),
        sequence,
        captured_at,
        gps_time,
        altitude,
        latitude,
        longitude,
        temperature,
        temperature_raw,
        humidity,
        humidity_raw,
        vapour_pressure,
        vapour_pressure_raw,
        pm10,
        pm2_5,
    })
}

/// Read every record of a data log, checking its header.
///
/// Rows cut short by an interrupted write (too few fields, or an open
/// quote) are skipped with a warning. Any other malformed row is an error.
pub fn read_records(path: &Path, operator: &str) -> Result<Vec<SensorRecord>, StorageError> {
    let content = fs::read_to_string(path).map_err(|source| StorageError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut rows = split_records(&content).into_iter();
    let header = rows.next().unwrap_or_default();
    if header != header_line() {
        return Err(StorageError::Header {
            path: path.to_path_buf(),
            found: header.to_string(),
        });
    }

    let mut records = Vec::new();
    for row in rows.filter(|row| !row.is_empty()) {
        if is_truncated(row) {
            warn!(path = %path.display(), row, "Skipping truncated data log row");
            continue;
        }
        records.push(parse_row(row, operator)?);
    }
    Ok(records)
}

/// Split file content into rows, keeping newlines inside quoted fields.
///
/// A trailing `\r` is dropped from each row.
fn split_records(content: &str) -> Vec<&str> {
    let mut rows = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;

    for (i, byte) in content.bytes().enumerate() {
        match byte {
            // An escaped "" toggles twice
            b'"' => in_quotes = !in_quotes,
            b'\n' if !in_quotes => {
                rows.push(content[start..i].trim_end_matches('\r'));
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < content.len() {
        rows.push(content[start..].trim_end_matches('\r'));
    }
    rows
}

fn is_truncated(row: &str) -> bool {
    split_fields(row).map_or(true, |fields| fields.len() < COLUMNS.len())
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => v.to_string(),
        _ => String::new(),
    }
}

fn parse_value(field: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    if field.is_empty() {
        Ok(None)
    } else {
        field.parse().map(Some)
    }
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn split_fields(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            ('"', true) => in_quotes = false,
            ('"', false) if current.is_empty() => in_quotes = true,
            (',', false) => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(current);
    Ok(fields)
}

/// CSV data log on the local filesystem.
///
/// Each row is written with a single `write` on an append-mode handle and
/// flushed before `append` returns.
#[derive(Debug)]
pub struct CsvAppendLog {
    path: PathBuf,
    file: Option<File>,
    closed: bool,
}

impl CsvAppendLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
            closed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<File, StorageError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| StorageError::Open {
                path: self.path.clone(),
                source,
            })
    }

    fn write_line(&mut self, line: &str) -> Result<(), StorageError> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        self.write_raw(&buf)
    }

    fn write_raw(&mut self, text: &str) -> Result<(), StorageError> {
        let Some(file) = self.file.as_mut() else {
            return Err(StorageError::Closed(self.path.clone()));
        };

        file.write_all(text.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|source| StorageError::Write {
                path: self.path.clone(),
                source,
            })
    }

    /// What to append so the next row starts on its own line, if anything.
    ///
    /// A row interrupted inside a quoted field gets its quote closed too, so
    /// the rows after it are not read as part of that field.
    fn partial_row_terminator(&self, len: u64) -> Result<Option<&'static str>, StorageError> {
        let read_error = |source: std::io::Error| StorageError::Read {
            path: self.path.clone(),
            source,
        };

        let mut file = File::open(&self.path).map_err(read_error)?;
        let tail_len = len.min(TAIL_CHECK_LEN);
        file.seek(SeekFrom::End(-(tail_len as i64)))
            .map_err(read_error)?;
        let mut tail = Vec::with_capacity(tail_len as usize);
        file.read_to_end(&mut tail).map_err(read_error)?;

        let partial = match tail.iter().rposition(|b| *b == b'\n') {
            Some(end) => &tail[end + 1..],
            None => &tail[..],
        };
        if partial.is_empty() {
            return Ok(None);
        }

        let quotes = partial.iter().filter(|b| **b == b'"').count();
        Ok(Some(if quotes % 2 == 1 { "\"\n" } else { "\n" }))
    }
}

impl AppendLog for CsvAppendLog {
    fn ensure_initialized(&mut self) -> Result<(), StorageError> {
        if self.closed {
            return Err(StorageError::Closed(self.path.clone()));
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        if self.file.is_none() {
            self.file = Some(self.open()?);
        }

        let len = fs::metadata(&self.path)
            .map(|m| m.len())
            .map_err(|source| StorageError::Open {
                path: self.path.clone(),
                source,
            })?;

        if len == 0 {
            self.write_line(&header_line())?;
            info!(path = %self.path.display(), "Created data log");
        } else {
            debug!(path = %self.path.display(), bytes = len, "Appending to existing data log");
            if let Some(terminator) = self.partial_row_terminator(len)? {
                warn!(
                    path = %self.path.display(),
                    "Data log ends mid-row, terminating partial row"
                );
                self.write_raw(terminator)?;
            }
        }

        Ok(())
    }

    fn append(&mut self, record: &SensorRecord) -> Result<(), StorageError> {
        if self.file.is_none() {
            self.ensure_initialized()?;
        }
        self.write_line(&format_row(record))
    }

    fn close(&mut self) -> Result<(), StorageError> {
        self.closed = true;
        if let Some(file) = self.file.take() {
            file.sync_all().map_err(|source| StorageError::Write {
                path: self.path.clone(),
                source,
            })?;
            debug!(path = %self.path.display(), "Closed data log");
        }
        Ok(())
    }
}
