//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation of a kit configuration.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[user]
; Kit number, written to the ID column of every record
bike_nr = {}
; Operator name, part of the data log file name
studentname = {}
; Directory for the daily CSV data logs
logfile_path = {}
; Whether an SDS011 particulate sensor is fitted (true/false)
pm_sensor = {}
; Seconds between two records
sampling_rate = {}

[sensors]
; IIO device directory of the DHT22 (dtoverlay=dht11)
climate_device = {}
; Seconds before a temperature/humidity read counts as missing
climate_timeout = {}
; Serial device of the SDS011, already set to 9600 baud raw mode
pm_device = {}
; Seconds before a particulate read counts as missing
pm_timeout = {}

[gps]
; gpsd host and port
host = {}
port = {}

[calibration]
; calibrated = raw * a1 + a0
temperature_a1 = {}
temperature_a0 = {}
vappress_a1 = {}
vappress_a0 = {}

[logging]
; Application log, cleared at every start
directory = {}
file = {}
"#,
        config.user.device_id,
        config.user.operator,
        path_to_string(&config.user.data_dir),
        config.user.particulate_enabled,
        config.user.sampling_period,
        path_to_string(&config.sensors.climate_device),
        config.sensors.climate_timeout,
        path_to_string(&config.sensors.particulate_device),
        config.sensors.particulate_timeout,
        config.gps.host,
        config.gps.port,
        config.calibration.temperature_a1,
        config.calibration.temperature_a0,
        config.calibration.vapour_pressure_a1,
        config.calibration.vapour_pressure_a0,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

/// Convert a path to a string, replacing the home directory with ~.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use crate::config::settings::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        let mut config =
            ConfigFile::with_user(UserSettings::new("07", "jane", PathBuf::from("/data")));
        config.user.particulate_enabled = true;
        config.user.sampling_period = 2.5;
        config.gps.port = 2950;
        config.calibration.temperature_a0 = -0.25;

        config.save_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_output_has_every_section() {
        let config = ConfigFile::with_user(UserSettings::new("07", "jane", PathBuf::from("/data")));
        let text = config.to_ini_string();

        for section in ["[user]", "[sensors]", "[gps]", "[calibration]", "[logging]"] {
            assert!(text.contains(section), "missing {}", section);
        }
        assert!(text.contains("temperature_a1 = 1.001"));
        assert!(text.contains("pm_sensor = false"));
    }
}
