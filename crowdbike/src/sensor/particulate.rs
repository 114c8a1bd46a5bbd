//! SDS011 particulate matter sensor.
//!
//! In its default active mode the SDS011 sends one 10-byte frame per second
//! over a 9600 8N1 serial line:
//!
//! ```text
//! AA C0 d1 d2 d3 d4 d5 d6 cs AB
//!       └pm25┘ └pm10┘ └id─┘
//! ```
//!
//! PM values are little-endian tenths of µg/m³ and `cs` is the low byte of
//! `d1 + … + d6`. When the device is a character device it is switched to
//! raw 9600 8N1 with `stty` before it is opened. Regular files and FIFOs are
//! read as they are.

use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};

use super::error::SensorError;
use super::{ParticulateSample, ParticulateSensor};

/// Length of a measurement frame.
pub const FRAME_LEN: usize = 10;

const FRAME_HEAD: u8 = 0xAA;
const FRAME_COMMAND: u8 = 0xC0;
const FRAME_TAIL: u8 = 0xAB;

/// Size of a single device read. Large enough to drain several queued frames.
const READ_CHUNK: usize = 256;

/// `stty` settings for the SDS011 line: 9600 baud, 8N1, no line discipline.
const LINE_SETTINGS: [&str; 6] = ["9600", "cs8", "-cstopb", "-parenb", "raw", "-echo"];

/// Decode one measurement frame.
pub fn decode_frame(frame: &[u8; FRAME_LEN]) -> Result<ParticulateSample, SensorError> {
    if frame[0] != FRAME_HEAD || frame[1] != FRAME_COMMAND || frame[9] != FRAME_TAIL {
        return Err(SensorError::MalformedFrame(format!(
            "framing bytes {:#04x} {:#04x} .. {:#04x}",
            frame[0], frame[1], frame[9]
        )));
    }

    let expected = frame[2..8]
        .iter()
        .fold(0u8, |sum, byte| sum.wrapping_add(*byte));
    if expected != frame[8] {
        return Err(SensorError::Checksum {
            expected,
            actual: frame[8],
        });
    }

    let pm2_5 = u16::from_le_bytes([frame[2], frame[3]]) as f64 / 10.0;
    let pm10 = u16::from_le_bytes([frame[4], frame[5]]) as f64 / 10.0;

    Ok(ParticulateSample { pm2_5, pm10 })
}

/// Incremental frame decoder for a raw byte stream.
///
/// Resynchronises on the `AA C0` header after garbage or a bad frame.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    rejected: u64,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes and return the newest valid sample they completed, if any.
    pub fn push(&mut self, bytes: &[u8]) -> Option<ParticulateSample> {
        self.buffer.extend_from_slice(bytes);
        let mut latest = None;

        loop {
            match self.find_header() {
                Some(start) => {
                    self.buffer.drain(..start);
                }
                None => {
                    // Keep a trailing head byte, it may start the next frame
                    let keep = usize::from(self.buffer.last() == Some(&FRAME_HEAD));
                    let len = self.buffer.len();
                    self.buffer.drain(..len - keep);
                    break;
                }
            }

            if self.buffer.len() < FRAME_LEN {
                break;
            }

            let mut frame = [0u8; FRAME_LEN];
            frame.copy_from_slice(&self.buffer[..FRAME_LEN]);

            match decode_frame(&frame) {
                Ok(sample) => {
                    latest = Some(sample);
                    self.buffer.drain(..FRAME_LEN);
                }
                Err(e) => {
                    self.rejected += 1;
                    debug!(error = %e, "Discarding particulate frame");
                    // Skip the head byte and resync
                    self.buffer.drain(..1);
                }
            }
        }

        latest
    }

    /// Frames dropped for bad framing or checksum.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    fn find_header(&self) -> Option<usize> {
        self.buffer
            .windows(2)
            .position(|pair| pair[0] == FRAME_HEAD && pair[1] == FRAME_COMMAND)
    }
}

/// SDS011 on a serial device.
///
/// The device is opened on first use and reopened after an I/O error.
pub struct Sds011Sensor {
    device: PathBuf,
    file: Option<File>,
    decoder: FrameDecoder,
}

impl Sds011Sensor {
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
            file: None,
            decoder: FrameDecoder::new(),
        }
    }

    pub fn device(&self) -> &Path {
        &self.device
    }

    async fn open(&self) -> Result<File, SensorError> {
        let metadata = tokio::fs::metadata(&self.device)
            .await
            .map_err(|source| SensorError::Io {
                path: self.device.clone(),
                source,
            })?;
        if metadata.file_type().is_char_device() {
            self.configure_line().await?;
        }

        File::open(&self.device)
            .await
            .map_err(|source| SensorError::Io {
                path: self.device.clone(),
                source,
            })
    }

    /// Put the serial line into raw 9600 8N1.
    async fn configure_line(&self) -> Result<(), SensorError> {
        let output = Command::new("stty")
            .arg("-F")
            .arg(&self.device)
            .args(LINE_SETTINGS)
            .output()
            .await
            .map_err(|e| SensorError::LineSetup {
                path: self.device.clone(),
                reason: format!("failed to run stty: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(device = %self.device.display(), stderr = %stderr.trim(), "stty failed");
            return Err(SensorError::LineSetup {
                path: self.device.clone(),
                reason: stderr.trim().to_string(),
            });
        }

        debug!(device = %self.device.display(), "Configured serial line for 9600 8N1 raw");
        Ok(())
    }
}

impl ParticulateSensor for Sds011Sensor {
    async fn read(&mut self) -> Result<ParticulateSample, SensorError> {
        if self.file.is_none() {
            let file = self.open().await?;
            self.file = Some(file);
        }

        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let Some(file) = self.file.as_mut() else {
                return Err(SensorError::Closed(self.device.clone()));
            };

            let n = match file.read(&mut chunk).await {
                Ok(0) => {
                    self.file = None;
                    return Err(SensorError::Closed(self.device.clone()));
                }
                Ok(n) => n,
                Err(source) => {
                    self.file = None;
                    return Err(SensorError::Io {
                        path: self.device.clone(),
                        source,
                    });
                }
            };

            if let Some(sample) = self.decoder.push(&chunk[..n]) {
                return Ok(sample);
            }
        }
    }
}
