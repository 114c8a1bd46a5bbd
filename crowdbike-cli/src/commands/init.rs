//! Init command - write a commented config.ini for a kit.

use std::path::{Path, PathBuf};

use crowdbike::config::{ConfigFile, UserSettings};

use crate::error::CliError;
use crate::runner::config_path;

/// Arguments for the init command.
pub struct InitArgs {
    pub bike_nr: String,
    pub name: String,
    pub data_dir: PathBuf,
    pub pm_sensor: bool,
    pub sampling_rate: Option<f64>,
    pub force: bool,
}

/// Run the init command.
pub fn run(config: Option<&Path>, args: InitArgs) -> Result<(), CliError> {
    let path = config_path(config);
    if path.exists() && !args.force {
        return Err(CliError::ConfigExists(path));
    }

    let mut user = UserSettings::new(args.bike_nr, args.name, args.data_dir);
    user.particulate_enabled = args.pm_sensor;
    if let Some(rate) = args.sampling_rate {
        user.sampling_period = rate;
    }

    // Refuse to write a file that would not load back
    let config = ConfigFile::with_user(user);
    config.validate()?;
    config.save_to(&path)?;

    println!("Wrote {}", path.display());
    println!("Review the [sensors] and [calibration] sections, then start with: crowdbike run");
    Ok(())
}
