//! Check command - validate config.ini without starting a session.
//!
//! Prints the resolved settings (defaults filled in), the data log the next
//! `run` would write to, and warnings for sensor devices that are not there.

use std::path::Path;

use chrono::Utc;
use crowdbike::config::ConfigFile;

use crate::error::CliError;
use crate::runner::config_path;

/// Run the check command.
pub fn run(config: Option<&Path>) -> Result<(), CliError> {
    let path = config_path(config);
    let config = ConfigFile::load_from(&path)?;

    println!("Configuration OK: {}", path.display());
    println!();
    print!("{}", config.to_ini_string());
    println!();
    println!(
        "Data log: {}",
        config.data_log_path(Utc::now().date_naive()).display()
    );

    for warning in device_warnings(&config) {
        println!("Warning: {}", warning);
    }

    Ok(())
}

/// Sensor devices named in the config that do not exist on this machine.
fn device_warnings(config: &ConfigFile) -> Vec<String> {
    let mut warnings = Vec::new();

    if !config.sensors.climate_device.exists() {
        warnings.push(format!(
            "climate device {} not found (is dtoverlay=dht11 enabled?)",
            config.sensors.climate_device.display()
        ));
    }
    if config.user.particulate_enabled && !config.sensors.particulate_device.exists() {
        warnings.push(format!(
            "particulate device {} not found",
            config.sensors.particulate_device.display()
        ));
    }

    warnings
}
