//! Error types for sensor reads.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while reading a sensor.
///
/// All of these are transient from the sampling loop's point of view: the
/// affected fields are recorded as missing for one cycle.
#[derive(Debug, Error)]
pub enum SensorError {
    /// Reading the device failed (the DHT22 driver reports EIO on bad timing).
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The device returned something that is not a number.
    #[error("Unexpected value '{value}' in {path}")]
    InvalidValue { path: PathBuf, value: String },

    /// A particulate frame failed its checksum.
    #[error("Frame checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    Checksum { expected: u8, actual: u8 },

    /// A particulate frame had the wrong framing bytes.
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// The serial line could not be switched to the sensor's settings.
    #[error("Failed to configure serial line {path}: {reason}")]
    LineSetup { path: PathBuf, reason: String },

    /// The device reached end of file.
    #[error("Device {0} closed")]
    Closed(PathBuf),

    /// The read exceeded its time bound.
    #[error("Read timed out after {0:?}")]
    Timeout(Duration),
}
