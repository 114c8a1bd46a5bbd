//! DHT22 temperature/humidity sensor through Linux IIO.
//!
//! The kernel `dht11` driver (which also handles the DHT22/AM2302) exposes
//! the sensor as an IIO device:
//!
//! ```text
//! /sys/bus/iio/devices/iio:device0/in_temp_input               21400   (m°C)
//! /sys/bus/iio/devices/iio:device0/in_humidityrelative_input   55300   (m%RH)
//! ```
//!
//! Enable it with `dtoverlay=dht11,gpiopin=4` in `/boot/config.txt`. Each
//! read triggers a conversion; the driver returns `EIO` when the bit timing
//! was off, which is common and simply retried on the next cycle.

use std::path::{Path, PathBuf};

use super::error::SensorError;
use super::ClimateSensor;
use crate::calibration::ClimateSample;

/// Temperature channel file name.
pub const TEMPERATURE_CHANNEL: &str = "in_temp_input";

/// Relative humidity channel file name.
pub const HUMIDITY_CHANNEL: &str = "in_humidityrelative_input";

/// DHT22 read through its IIO device directory.
#[derive(Debug, Clone)]
pub struct IioClimateSensor {
    device: PathBuf,
}

impl IioClimateSensor {
    /// Create a sensor for the given IIO device directory.
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
        }
    }

    pub fn device(&self) -> &Path {
        &self.device
    }
}

impl ClimateSensor for IioClimateSensor {
    async fn read(&mut self) -> Result<ClimateSample, SensorError> {
        let temperature = read_milli_channel(&self.device.join(TEMPERATURE_CHANNEL)).await?;
        let humidity = read_milli_channel(&self.device.join(HUMIDITY_CHANNEL)).await?;

        Ok(ClimateSample {
            temperature,
            humidity,
        })
    }
}

/// Read an IIO channel reported in thousandths.
async fn read_milli_channel(path: &Path) -> Result<f64, SensorError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SensorError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    parse_milli(raw.trim()).ok_or_else(|| SensorError::InvalidValue {
        path: path.to_path_buf(),
        value: raw.trim().to_string(),
    })
}

fn parse_milli(value: &str) -> Option<f64> {
    value.parse::<i64>().ok().map(|v| v as f64 / 1000.0)
}
