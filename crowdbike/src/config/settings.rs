//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

/// Complete kit configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Kit and operator settings
    pub user: UserSettings,
    /// Sensor device settings
    pub sensors: SensorSettings,
    /// gpsd connection settings
    pub gps: GpsSettings,
    /// Calibration coefficients
    pub calibration: CalibrationSettings,
    /// Application log settings
    pub logging: LoggingSettings,
}

/// `[user]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSettings {
    /// Kit identifier (`bike_nr`)
    pub device_id: String,
    /// Operator name (`studentname`)
    pub operator: String,
    /// Directory for the CSV data logs (`logfile_path`)
    pub data_dir: PathBuf,
    /// Whether the SDS011 is fitted (`pm_sensor`)
    pub particulate_enabled: bool,
    /// Seconds between cycles (`sampling_rate`)
    pub sampling_period: f64,
}

/// `[sensors]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSettings {
    /// IIO device directory of the DHT22
    pub climate_device: PathBuf,
    /// Climate read bound in seconds
    pub climate_timeout: f64,
    /// Serial device of the SDS011
    pub particulate_device: PathBuf,
    /// Particulate read bound in seconds
    pub particulate_timeout: f64,
}

/// `[gps]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct GpsSettings {
    pub host: String,
    pub port: u16,
}

/// `[calibration]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationSettings {
    pub temperature_a1: f64,
    pub temperature_a0: f64,
    pub vapour_pressure_a1: f64,
    pub vapour_pressure_a0: f64,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Directory of the application log
    pub directory: PathBuf,
    /// Application log file name
    pub file: String,
}
