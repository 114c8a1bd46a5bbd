//! Calibration of raw climate readings.
//!
//! Converts raw DHT22 temperature and relative humidity into calibrated
//! temperature, vapour pressure and corrected relative humidity.
//!
//! Calibration is linear on temperature and on vapour pressure. Relative
//! humidity is never calibrated directly: it is converted to vapour pressure
//! at the raw temperature, the vapour pressure is calibrated, and the result
//! is converted back to relative humidity at the calibrated temperature.
//!
//! # Example
//!
//! ```
//! use crowdbike::calibration::{calibrate, CalibrationCoefficients, ClimateSample};
//!
//! let coefficients = CalibrationCoefficients::identity();
//! let sample = ClimateSample { temperature: 21.4, humidity: 55.0 };
//!
//! let calibrated = calibrate(Some(sample), &coefficients).unwrap();
//! assert_eq!(calibrated.temperature.calibrated, 21.4);
//! ```

mod coefficients;

pub use coefficients::{CalibrationCoefficients, LinearCalibration};

/// Reference saturation vapour pressure at 0 °C in kPa.
const SVP_AT_FREEZING_KPA: f64 = 0.6113;

/// Latent heat of vaporisation of water in J/kg.
const LATENT_HEAT_VAPORISATION: f64 = 2_501_000.0;

/// Specific gas constant for water vapour in J/(kg·K).
const GAS_CONSTANT_VAPOUR: f64 = 461.5;

/// 0 °C in kelvin.
const FREEZING_POINT_K: f64 = 273.15;

/// Upper bound for relative humidity in percent.
pub const MAX_RELATIVE_HUMIDITY: f64 = 100.0;

/// Raw output of the temperature/humidity sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateSample {
    /// Air temperature in °C.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
}

/// Raw and calibrated temperature, both in °C.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperaturePair {
    /// Raw value rounded to 5 decimals.
    pub raw: f64,
    /// Calibrated value rounded to 3 decimals.
    pub calibrated: f64,
}

/// Raw and calibrated humidity quantities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HumidityPair {
    /// Raw relative humidity in percent, rounded to 5 decimals.
    pub humidity_raw: f64,
    /// Corrected relative humidity in percent, within `[0, 100]`.
    pub humidity_calibrated: f64,
    /// Vapour pressure at the raw temperature in kPa, rounded to 3 decimals.
    pub vapour_pressure_raw: f64,
    /// Calibrated vapour pressure in kPa, rounded to 3 decimals.
    pub vapour_pressure_calibrated: f64,
}

/// All calibrated climate quantities for one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibratedClimate {
    pub temperature: TemperaturePair,
    pub humidity: HumidityPair,
}

/// Round `value` to `decimals` decimal places.
///
/// Rounds the exact binary value, so a product such as `20.5 * 1.001`
/// (stored just below `20.5205`) rounds down. Scaling by a power of ten
/// first would round it up.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{:.*}", decimals, value).parse().unwrap_or(value)
}

/// Calibrate a raw temperature.
pub fn calibrate_temperature(raw: f64, coefficients: &CalibrationCoefficients) -> TemperaturePair {
    TemperaturePair {
        raw: round_to(raw, 5),
        calibrated: round_to(coefficients.temperature.apply(raw), 3),
    }
}

/// Saturation vapour pressure in kPa at `temperature_c` (Clausius–Clapeyron).
pub fn saturation_vapor_pressure(temperature_c: f64) -> f64 {
    SVP_AT_FREEZING_KPA
        * ((LATENT_HEAT_VAPORISATION / GAS_CONSTANT_VAPOUR)
            * (1.0 / FREEZING_POINT_K - 1.0 / (temperature_c + FREEZING_POINT_K)))
            .exp()
}

/// Calibrate relative humidity through vapour pressure.
///
/// `raw_temperature` and `calibrated_temperature` select the saturation
/// vapour pressure used on the way in and on the way out respectively.
pub fn calibrate_humidity(
    raw_humidity: f64,
    raw_temperature: f64,
    calibrated_temperature: f64,
    coefficients: &CalibrationCoefficients,
) -> HumidityPair {
    let vapour_pressure = (raw_humidity / 100.0) * saturation_vapor_pressure(raw_temperature);
    let vapour_pressure_raw = round_to(vapour_pressure, 3);
    let vapour_pressure_calibrated = round_to(coefficients.vapour_pressure.apply(vapour_pressure), 3);

    let humidity_calibrated = round_to(
        100.0 * vapour_pressure_calibrated / saturation_vapor_pressure(calibrated_temperature),
        5,
    );

    HumidityPair {
        humidity_raw: round_to(raw_humidity, 5),
        humidity_calibrated: clamp_humidity(humidity_calibrated),
        vapour_pressure_raw,
        vapour_pressure_calibrated,
    }
}

/// Run the full calibration chain on one sample.
///
/// Returns `None` when the sample is missing or contains a non-finite value;
/// nothing is derived from a partial sample.
pub fn calibrate(
    sample: Option<ClimateSample>,
    coefficients: &CalibrationCoefficients,
) -> Option<CalibratedClimate> {
    let sample = sample?;
    if !sample.temperature.is_finite() || !sample.humidity.is_finite() {
        return None;
    }

    let temperature = calibrate_temperature(sample.temperature, coefficients);
    // The raw (unrounded) temperature drives the inbound conversion.
    let humidity = calibrate_humidity(
        sample.humidity,
        sample.temperature,
        temperature.calibrated,
        coefficients,
    );

    Some(CalibratedClimate {
        temperature,
        humidity,
    })
}

fn clamp_humidity(value: f64) -> f64 {
    value.clamp(0.0, MAX_RELATIVE_HUMIDITY)
}
