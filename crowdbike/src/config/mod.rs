//! Kit configuration from config.ini.
//!
//! The INI file names the kit and operator, the data directory, the sensor
//! devices, gpsd and the calibration coefficients. [`ConfigFile`] is the
//! validated form; it converts into the per-component configs the rest of
//! the crate takes.
//!
//! # Example
//!
//! ```no_run
//! use crowdbike::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! let sampling = config.sampling_config()?;
//! let gpsd = config.gpsd_config();
//! # Ok::<(), crowdbike::config::ConfigFileError>(())
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::ConfigFileError;
pub use settings::*;
