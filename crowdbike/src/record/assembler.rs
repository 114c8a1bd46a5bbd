//! Record assembly.

use chrono::{DateTime, SubsecRound, Utc};

use super::SensorRecord;
use crate::calibration::CalibratedClimate;
use crate::position::PositionFix;
use crate::sensor::ParticulateSample;

/// Builds one [`SensorRecord`] per cycle.
///
/// The sequence number starts at 0 and advances by one on every call to
/// [`RecordAssembler::assemble`], whatever the inputs look like.
#[derive(Debug, Clone)]
pub struct RecordAssembler {
    device_id: String,
    operator: String,
    next_sequence: u64,
}

impl RecordAssembler {
    pub fn new(device_id: impl Into<String>, operator: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            operator: operator.into(),
            next_sequence: 0,
        }
    }

    /// Sequence number the next record will get.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Assemble the record for one cycle.
    pub fn assemble(
        &mut self,
        captured_at: DateTime<Utc>,
        climate: Option<&CalibratedClimate>,
        particulate: Option<&ParticulateSample>,
        fix: &PositionFix,
    ) -> SensorRecord {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        SensorRecord {
            device_id: self.device_id.clone(),
            operator: self.operator.clone(),
            sequence,
            captured_at: captured_at.trunc_subsecs(0),
            gps_time: fix.time,
            altitude: fix.altitude,
            latitude: fix.latitude,
            longitude: fix.longitude,
            temperature: climate.map(|c| c.temperature.calibrated),
            temperature_raw: climate.map(|c| c.temperature.raw),
            humidity: climate.map(|c| c.humidity.humidity_calibrated),
            humidity_raw: climate.map(|c| c.humidity.humidity_raw),
            vapour_pressure: climate.map(|c| c.humidity.vapour_pressure_calibrated),
            vapour_pressure_raw: climate.map(|c| c.humidity.vapour_pressure_raw),
            pm10: particulate.map(|p| p.pm10),
            pm2_5: particulate.map(|p| p.pm2_5),
        }
    }
}
