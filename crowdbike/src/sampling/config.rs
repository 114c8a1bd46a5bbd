//! Sampling loop configuration.

use std::time::Duration;

use crate::calibration::CalibrationCoefficients;

/// Default time between cycles.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(5);

/// Default bound for a temperature/humidity read.
pub const DEFAULT_CLIMATE_TIMEOUT: Duration = Duration::from_millis(2500);

/// Default bound for a particulate read.
pub const DEFAULT_PARTICULATE_TIMEOUT: Duration = Duration::from_secs(1);

/// Settings for one sampling session.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    /// Kit identifier written to every row.
    pub device_id: String,
    /// Operator name.
    pub operator_id: String,
    /// Target time between cycle starts.
    pub period: Duration,
    pub climate_timeout: Duration,
    pub particulate_timeout: Duration,
    pub coefficients: CalibrationCoefficients,
}

impl SamplingConfig {
    /// Config with default timing and calibration.
    pub fn new(device_id: impl Into<String>, operator_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            operator_id: operator_id.into(),
            period: DEFAULT_PERIOD,
            climate_timeout: DEFAULT_CLIMATE_TIMEOUT,
            particulate_timeout: DEFAULT_PARTICULATE_TIMEOUT,
            coefficients: CalibrationCoefficients::default(),
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn with_timeouts(mut self, climate: Duration, particulate: Duration) -> Self {
        self.climate_timeout = climate;
        self.particulate_timeout = particulate;
        self
    }

    pub fn with_coefficients(mut self, coefficients: CalibrationCoefficients) -> Self {
        self.coefficients = coefficients;
        self
    }
}
