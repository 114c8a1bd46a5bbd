//! Fixed-period sampling loop.
//!
//! Each cycle reads the climate sensor, the optional particulate sensor and
//! the current position snapshot, calibrates the climate values, assembles
//! one [`SensorRecord`](crate::record::SensorRecord) and appends it to the
//! data log. The loop then sleeps out the remainder of the period.
//!
//! # Drift
//!
//! A cycle starts one period after the previous one started. An overrunning
//! cycle is followed immediately by the next one, so later cycles shift;
//! missed periods are never made up.

mod config;
mod error;
mod pacing;
mod runner;
mod state;

pub use config::{
    SamplingConfig, DEFAULT_CLIMATE_TIMEOUT, DEFAULT_PARTICULATE_TIMEOUT, DEFAULT_PERIOD,
};
pub use error::SamplingError;
pub use pacing::{is_overrun, sleep_duration};
pub use runner::{CycleReport, SamplingLoop, SamplingSummary};
pub use state::LoopState;
