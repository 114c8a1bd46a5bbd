//! Linear calibration coefficients.

/// Slope/offset pair mapping a raw value to a corrected one: `raw * a1 + a0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearCalibration {
    /// Slope.
    pub a1: f64,
    /// Offset.
    pub a0: f64,
}

impl LinearCalibration {
    /// The identity mapping (`a1 = 1`, `a0 = 0`).
    pub const IDENTITY: Self = Self { a1: 1.0, a0: 0.0 };

    pub const fn new(a1: f64, a0: f64) -> Self {
        Self { a1, a0 }
    }

    #[inline]
    pub fn apply(&self, raw: f64) -> f64 {
        raw * self.a1 + self.a0
    }
}

/// Calibration coefficients for one sensor kit.
///
/// Loaded once at startup and read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationCoefficients {
    /// Applied to temperature in °C.
    pub temperature: LinearCalibration,
    /// Applied to vapour pressure in kPa.
    pub vapour_pressure: LinearCalibration,
}

impl CalibrationCoefficients {
    /// Default temperature slope of the reference DHT22 kit.
    pub const DEFAULT_TEMPERATURE_A1: f64 = 1.001;

    /// Coefficients that leave every value unchanged.
    pub const fn identity() -> Self {
        Self {
            temperature: LinearCalibration::IDENTITY,
            vapour_pressure: LinearCalibration::IDENTITY,
        }
    }
}

impl Default for CalibrationCoefficients {
    fn default() -> Self {
        Self {
            temperature: LinearCalibration::new(Self::DEFAULT_TEMPERATURE_A1, 0.0),
            vapour_pressure: LinearCalibration::IDENTITY,
        }
    }
}
