//! Default values for optional configuration settings.
//!
//! `[user]` has no defaults for the kit identity and data directory; those
//! keys are required.

use std::path::PathBuf;

use super::settings::*;

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.ini";

// [user]
pub const DEFAULT_PARTICULATE_ENABLED: bool = false;
pub const DEFAULT_SAMPLING_PERIOD_SECS: f64 = 5.0;

// [sensors]
pub const DEFAULT_CLIMATE_DEVICE: &str = "/sys/bus/iio/devices/iio:device0";
pub const DEFAULT_CLIMATE_TIMEOUT_SECS: f64 = 2.5;
pub const DEFAULT_PARTICULATE_DEVICE: &str = "/dev/ttyUSB0";
pub const DEFAULT_PARTICULATE_TIMEOUT_SECS: f64 = 1.0;

// [gps]
pub const DEFAULT_GPS_HOST: &str = "127.0.0.1";
pub const DEFAULT_GPS_PORT: u16 = crate::position::gpsd::DEFAULT_GPSD_PORT;

// [calibration]
pub const DEFAULT_TEMPERATURE_A1: f64 =
    crate::calibration::CalibrationCoefficients::DEFAULT_TEMPERATURE_A1;
pub const DEFAULT_TEMPERATURE_A0: f64 = 0.0;
pub const DEFAULT_VAPOUR_PRESSURE_A1: f64 = 1.0;
pub const DEFAULT_VAPOUR_PRESSURE_A0: f64 = 0.0;

// [logging]
pub const DEFAULT_LOG_DIRECTORY: &str = "logs";
pub const DEFAULT_LOG_FILE: &str = "crowdbike.log";

/// Path of the default config file.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

impl UserSettings {
    /// Settings for a kit with all optional keys at their defaults.
    pub fn new(device_id: impl Into<String>, operator: impl Into<String>, data_dir: PathBuf) -> Self {
        Self {
            device_id: device_id.into(),
            operator: operator.into(),
            data_dir,
            particulate_enabled: DEFAULT_PARTICULATE_ENABLED,
            sampling_period: DEFAULT_SAMPLING_PERIOD_SECS,
        }
    }
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            climate_device: PathBuf::from(DEFAULT_CLIMATE_DEVICE),
            climate_timeout: DEFAULT_CLIMATE_TIMEOUT_SECS,
            particulate_device: PathBuf::from(DEFAULT_PARTICULATE_DEVICE),
            particulate_timeout: DEFAULT_PARTICULATE_TIMEOUT_SECS,
        }
    }
}

impl Default for GpsSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_GPS_HOST.to_string(),
            port: DEFAULT_GPS_PORT,
        }
    }
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            temperature_a1: DEFAULT_TEMPERATURE_A1,
            temperature_a0: DEFAULT_TEMPERATURE_A0,
            vapour_pressure_a1: DEFAULT_VAPOUR_PRESSURE_A1,
            vapour_pressure_a0: DEFAULT_VAPOUR_PRESSURE_A0,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_LOG_DIRECTORY),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

impl ConfigFile {
    /// Config for a kit with every optional setting at its default.
    pub fn with_user(user: UserSettings) -> Self {
        Self {
            user,
            sensors: SensorSettings::default(),
            gps: GpsSettings::default(),
            calibration: CalibrationSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}
