//! gpsd JSON protocol parsing.
//!
//! gpsd streams one JSON object per line once watching is enabled. Only
//! `TPV` (time-position-velocity) reports carry a fix; `VERSION`, `DEVICES`,
//! `WATCH`, `SKY` and friends are ignored.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::trace;

use crate::position::state::{FixMode, PositionFix};

/// Command enabling JSON watch mode.
pub const WATCH_COMMAND: &[u8] = b"?WATCH={\"enable\":true,\"json\":true};\n";

/// The subset of a gpsd report we care about.
#[derive(Debug, Deserialize)]
struct Report {
    class: String,
    #[serde(default)]
    mode: u8,
    time: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    /// Altitude MSL (gpsd >= 3.20).
    #[serde(rename = "altMSL")]
    alt_msl: Option<f64>,
    /// Legacy altitude field.
    alt: Option<f64>,
}

/// Parse one line of gpsd output.
///
/// Returns `Some` only for TPV reports. A TPV without a usable solution maps
/// to the "no fix" sentinel so the reader can publish the loss of fix.
pub fn parse_report(line: &str) -> Option<PositionFix> {
    let report: Report = match serde_json::from_str(line) {
        Ok(report) => report,
        Err(e) => {
            trace!(error = %e, "Ignoring unparsable gpsd line");
            return None;
        }
    };

    if report.class != "TPV" {
        return None;
    }

    let time = report.time.as_deref().and_then(parse_time);
    let altitude = report.alt_msl.or(report.alt);

    Some(PositionFix::new(
        time,
        report.lat,
        report.lon,
        altitude,
        FixMode::from_gpsd(report.mode),
    ))
}

fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .ok()
}
