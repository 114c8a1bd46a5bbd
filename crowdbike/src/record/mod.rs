//! Sensor records - one immutable row per sampling cycle.
//!
//! [`RecordAssembler`] is the only place that builds a [`SensorRecord`]. It
//! maps calibrated climate values, the particulate sample and the position
//! snapshot onto the record's fields and owns the sequence counter.

mod assembler;

pub use assembler::RecordAssembler;

use chrono::{DateTime, Utc};

/// Column names in file order.
pub const COLUMNS: [&str; 15] = [
    "ID",
    "Record",
    "Raspberry_Time",
    "GPS_Time",
    "Altitude",
    "Latitude",
    "Longitude",
    "Temperature",
    "TemperatureRaw",
    "RelHumidity",
    "RelHumidityRaw",
    "VapourPressure",
    "VapourPressureRaw",
    "PM10",
    "PM2.5",
];

/// One logged measurement cycle.
///
/// `None` marks a value that was not measured this cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorRecord {
    /// Kit identifier (`ID`).
    pub device_id: String,
    /// Operator name, part of the file name only.
    pub operator: String,
    /// Cycle counter (`Record`).
    pub sequence: u64,
    /// Wall-clock capture time, whole seconds (`Raspberry_Time`).
    pub captured_at: DateTime<Utc>,
    /// Receiver time of the fix (`GPS_Time`).
    pub gps_time: Option<DateTime<Utc>>,
    /// Meters above mean sea level.
    pub altitude: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Calibrated temperature, °C.
    pub temperature: Option<f64>,
    pub temperature_raw: Option<f64>,
    /// Calibrated relative humidity, %.
    pub humidity: Option<f64>,
    pub humidity_raw: Option<f64>,
    /// Calibrated vapour pressure, kPa.
    pub vapour_pressure: Option<f64>,
    pub vapour_pressure_raw: Option<f64>,
    /// µg/m³.
    pub pm10: Option<f64>,
    /// µg/m³.
    pub pm2_5: Option<f64>,
}

impl SensorRecord {
    /// Measurement columns paired with their values.
    pub fn measurements(&self) -> [(&'static str, Option<f64>); 11] {
        [
            ("Altitude", self.altitude),
            ("Latitude", self.latitude),
            ("Longitude", self.longitude),
            ("Temperature", self.temperature),
            ("TemperatureRaw", self.temperature_raw),
            ("RelHumidity", self.humidity),
            ("RelHumidityRaw", self.humidity_raw),
            ("VapourPressure", self.vapour_pressure),
            ("VapourPressureRaw", self.vapour_pressure_raw),
            ("PM10", self.pm10),
            ("PM2.5", self.pm2_5),
        ]
    }

    /// Names of the columns that are missing in this record.
    pub fn missing_columns(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.gps_time.is_none() {
            missing.push("GPS_Time");
        }
        missing.extend(
            self.measurements()
                .into_iter()
                .filter(|(_, value)| value.is_none())
                .map(|(name, _)| name),
        );
        missing
    }
}
