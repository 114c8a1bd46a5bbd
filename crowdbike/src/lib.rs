//! Crowdbike - mobile environmental data logger
//!
//! Runs on a bike-mounted kit with a GPS receiver (through gpsd), a DHT22
//! temperature/humidity sensor and an optional SDS011 particulate sensor.
//! Once per sampling period it reads the sensors, calibrates the climate
//! values, takes the latest position fix and appends one row to a daily
//! CSV data log.
//!
//! # Architecture
//!
//! - [`position`] - background reader keeping the latest GPS fix
//! - [`sensor`] - climate and particulate drivers
//! - [`calibration`] - pure calibration functions
//! - [`record`] - record assembly
//! - [`storage`] - the append-only CSV data log
//! - [`sampling`] - the fixed-period loop tying it together
//!
//! ```ignore
//! use crowdbike::config::ConfigFile;
//! use crowdbike::position::SharedPosition;
//! use crowdbike::sampling::SamplingLoop;
//! use crowdbike::storage::{AppendLog, CsvAppendLog};
//!
//! let config = ConfigFile::load()?;
//! let mut log = CsvAppendLog::new(config.data_log_path(chrono::Utc::now().date_naive()));
//! log.ensure_initialized()?;
//!
//! let mut sampler = SamplingLoop::new(
//!     config.sampling_config()?,
//!     config.climate_sensor(),
//!     config.particulate_sensor(),
//!     SharedPosition::new(),
//!     log,
//! )?;
//! sampler.run(cancellation).await?;
//! ```

pub mod calibration;
pub mod config;
pub mod logging;
pub mod position;
pub mod record;
pub mod sampling;
pub mod sensor;
pub mod storage;

/// Version of the crowdbike library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
