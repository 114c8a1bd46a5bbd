//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::{Ini, Properties};
use std::path::PathBuf;

use super::file::{positive_duration, ConfigFileError};
use super::settings::*;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// `[user]` must provide `bike_nr`, `studentname` and `logfile_path`; every
/// other key falls back to its default. The result has passed
/// [`ConfigFile::validate`].
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    // [user] section
    let user_section = ini.section(Some("user"));
    let device_id = required(user_section, "user", "bike_nr")?;
    let operator = required(user_section, "user", "studentname")?;
    let data_dir = expand_tilde(&required(user_section, "user", "logfile_path")?);
    let mut config = ConfigFile::with_user(UserSettings::new(device_id, operator, data_dir));

    if let Some(section) = user_section {
        if let Some(v) = section.get("pm_sensor") {
            config.user.particulate_enabled =
                parse_bool(v).ok_or_else(|| ConfigFileError::InvalidValue {
                    section: "user".to_string(),
                    key: "pm_sensor".to_string(),
                    value: v.to_string(),
                    reason: "must be true or false".to_string(),
                })?;
        }
        if let Some(v) = section.get("sampling_rate") {
            config.user.sampling_period = parse_seconds("user", "sampling_rate", v)?;
        }
    }

    // [sensors] section
    if let Some(section) = ini.section(Some("sensors")) {
        if let Some(v) = non_empty(section, "climate_device") {
            config.sensors.climate_device = expand_tilde(v);
        }
        if let Some(v) = section.get("climate_timeout") {
            config.sensors.climate_timeout = parse_seconds("sensors", "climate_timeout", v)?;
        }
        if let Some(v) = non_empty(section, "pm_device") {
            config.sensors.particulate_device = expand_tilde(v);
        }
        if let Some(v) = section.get("pm_timeout") {
            config.sensors.particulate_timeout = parse_seconds("sensors", "pm_timeout", v)?;
        }
    }

    // [gps] section
    if let Some(section) = ini.section(Some("gps")) {
        if let Some(v) = non_empty(section, "host") {
            config.gps.host = v.to_string();
        }
        if let Some(v) = section.get("port") {
            config.gps.port = v
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|port| *port != 0)
                .ok_or_else(|| ConfigFileError::InvalidValue {
                    section: "gps".to_string(),
                    key: "port".to_string(),
                    value: v.to_string(),
                    reason: "must be a port number between 1 and 65535".to_string(),
                })?;
        }
    }

    // [calibration] section
    if let Some(section) = ini.section(Some("calibration")) {
        if let Some(v) = section.get("temperature_a1") {
            config.calibration.temperature_a1 = parse_float("calibration", "temperature_a1", v)?;
        }
        if let Some(v) = section.get("temperature_a0") {
            config.calibration.temperature_a0 = parse_float("calibration", "temperature_a0", v)?;
        }
        if let Some(v) = section.get("vappress_a1") {
            config.calibration.vapour_pressure_a1 = parse_float("calibration", "vappress_a1", v)?;
        }
        if let Some(v) = section.get("vappress_a0") {
            config.calibration.vapour_pressure_a0 = parse_float("calibration", "vappress_a0", v)?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "directory") {
            config.logging.directory = expand_tilde(v);
        }
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = v.to_string();
        }
    }

    config.validate()?;
    Ok(config)
}

fn required(
    section: Option<&Properties>,
    section_name: &str,
    key: &str,
) -> Result<String, ConfigFileError> {
    section
        .and_then(|s| non_empty(s, key))
        .map(str::to_string)
        .ok_or_else(|| ConfigFileError::MissingValue {
            section: section_name.to_string(),
            key: key.to_string(),
        })
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a finite float.
fn parse_float(section: &str, key: &str, value: &str) -> Result<f64, ConfigFileError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be a number".to_string(),
        })
}

/// Parse a positive duration in seconds.
///
/// Values that round to a zero `Duration` are rejected along with
/// negative ones.
fn parse_seconds(section: &str, key: &str, value: &str) -> Result<f64, ConfigFileError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| positive_duration(*v).is_some())
        .ok_or_else(|| ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be a positive number of seconds".to_string(),
        })
}

/// Parse a boolean value from config.
pub(super) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
