//! Sensor abstractions and drivers.
//!
//! Sensors are read once per sampling cycle. Every read ends in a
//! [`Reading`]: either a value or an explicit [`MissingReason`]. Nothing
//! downstream ever sees a fabricated stand-in value.
//!
//! # Drivers
//!
//! - [`IioClimateSensor`] - DHT22 through the Linux IIO `dht11` driver
//! - [`Sds011Sensor`] - SDS011 particulate sensor on a serial device

mod climate;
mod error;
mod particulate;

use std::future::Future;

pub use climate::{IioClimateSensor, HUMIDITY_CHANNEL, TEMPERATURE_CHANNEL};
pub use error::SensorError;
pub use particulate::{decode_frame, FrameDecoder, Sds011Sensor, FRAME_LEN};

use crate::calibration::ClimateSample;

/// One particulate matter measurement in µg/m³.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticulateSample {
    pub pm2_5: f64,
    pub pm10: f64,
}

/// Trait for the temperature/humidity sensor.
pub trait ClimateSensor: Send {
    /// Take one raw temperature (°C) and relative humidity (%) reading.
    fn read(&mut self) -> impl Future<Output = Result<ClimateSample, SensorError>> + Send;
}

/// Trait for the particulate matter sensor.
pub trait ParticulateSensor: Send {
    /// Take one PM2.5/PM10 reading.
    fn read(&mut self) -> impl Future<Output = Result<ParticulateSample, SensorError>> + Send;
}

/// Why a value is absent from a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingReason {
    /// The sensor is switched off in the configuration.
    Disabled,
    /// The read did not complete within its time bound.
    Timeout,
    /// The read failed.
    Failed(String),
}

impl std::fmt::Display for MissingReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::Timeout => write!(f, "timed out"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Outcome of a single sensor read.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading<T> {
    Value(T),
    Missing(MissingReason),
}

impl<T> Reading<T> {
    /// Convert to an `Option`, discarding the reason.
    pub fn value(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Missing(_) => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing(_))
    }

    /// The reason, if missing.
    pub fn missing_reason(&self) -> Option<&MissingReason> {
        match self {
            Self::Value(_) => None,
            Self::Missing(reason) => Some(reason),
        }
    }
}

impl<T> From<Result<T, SensorError>> for Reading<T> {
    fn from(result: Result<T, SensorError>) -> Self {
        match result {
            Ok(value) => Self::Value(value),
            Err(SensorError::Timeout(_)) => Self::Missing(MissingReason::Timeout),
            Err(e) => Self::Missing(MissingReason::Failed(e.to_string())),
        }
    }
}
