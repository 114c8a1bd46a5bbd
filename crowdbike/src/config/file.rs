//! Configuration file handling for config.ini.
//!
//! Settings structs live in [`super::settings`], constants in [`super::defaults`],
//! parsing in [`super::parser`], and serialization in [`super::writer`].

use ini::Ini;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;

use super::settings::*;
use crate::calibration::{CalibrationCoefficients, LinearCalibration};
use crate::position::GpsdConfig;
use crate::sampling::SamplingConfig;
use crate::sensor::{IioClimateSensor, Sds011Sensor};
use crate::storage::log_file_path;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// The config file does not exist
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// A required key is absent or empty
    #[error("Missing configuration: {section}.{key} is required")]
    MissingValue { section: String, key: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from `config.ini` in the working directory.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&super::defaults::default_config_path())
    }

    /// Load configuration from a specific path.
    ///
    /// Unlike optional settings, the file itself is required.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Err(ConfigFileError::NotFound(path.to_path_buf()));
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Commented INI text for this configuration.
    pub fn to_ini_string(&self) -> String {
        super::writer::to_config_string(self)
    }

    /// Check settings that parsing cannot guarantee for a config built in code.
    ///
    /// `bike_nr` and `studentname` go into every data log name and row, so
    /// they may not contain control characters. Periods and timeouts must be
    /// positive durations.
    pub fn validate(&self) -> Result<(), ConfigFileError> {
        check_identifier("user", "bike_nr", &self.user.device_id)?;
        check_identifier("user", "studentname", &self.user.operator)?;
        self.sampling_config().map(|_| ())
    }

    /// Calibration coefficients from `[calibration]`.
    pub fn coefficients(&self) -> CalibrationCoefficients {
        CalibrationCoefficients {
            temperature: LinearCalibration::new(
                self.calibration.temperature_a1,
                self.calibration.temperature_a0,
            ),
            vapour_pressure: LinearCalibration::new(
                self.calibration.vapour_pressure_a1,
                self.calibration.vapour_pressure_a0,
            ),
        }
    }

    /// Sampling loop settings.
    ///
    /// Fails when a period or timeout is not a positive duration, which can
    /// only happen for settings built in code rather than parsed.
    pub fn sampling_config(&self) -> Result<SamplingConfig, ConfigFileError> {
        let period = seconds("user", "sampling_rate", self.user.sampling_period)?;
        let climate_timeout = seconds("sensors", "climate_timeout", self.sensors.climate_timeout)?;
        let particulate_timeout =
            seconds("sensors", "pm_timeout", self.sensors.particulate_timeout)?;

        Ok(SamplingConfig::new(&self.user.device_id, &self.user.operator)
            .with_period(period)
            .with_timeouts(climate_timeout, particulate_timeout)
            .with_coefficients(self.coefficients()))
    }

    /// gpsd client settings.
    pub fn gpsd_config(&self) -> GpsdConfig {
        GpsdConfig {
            host: self.gps.host.clone(),
            port: self.gps.port,
            ..GpsdConfig::default()
        }
    }

    /// The DHT22 driver for `[sensors] climate_device`.
    pub fn climate_sensor(&self) -> IioClimateSensor {
        IioClimateSensor::new(&self.sensors.climate_device)
    }

    /// The SDS011 driver, or `None` when `pm_sensor` is off.
    pub fn particulate_sensor(&self) -> Option<Sds011Sensor> {
        self.user
            .particulate_enabled
            .then(|| Sds011Sensor::new(&self.sensors.particulate_device))
    }

    /// Data log path for the given UTC day.
    pub fn data_log_path(&self, date: NaiveDate) -> PathBuf {
        log_file_path(
            &self.user.data_dir,
            &self.user.device_id,
            &self.user.operator,
            date,
        )
    }
}

/// A duration of `secs` seconds, or `None` unless it is finite and at least
/// one nanosecond.
pub(super) fn positive_duration(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|d| !d.is_zero())
}

fn check_identifier(section: &str, key: &str, value: &str) -> Result<(), ConfigFileError> {
    if value.chars().any(char::is_control) {
        return Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.escape_debug().to_string(),
            reason: "must not contain control characters".to_string(),
        });
    }
    Ok(())
}

fn seconds(section: &str, key: &str, value: f64) -> Result<Duration, ConfigFileError> {
    positive_duration(value).ok_or_else(|| ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: "must be a positive number of seconds".to_string(),
    })
}
