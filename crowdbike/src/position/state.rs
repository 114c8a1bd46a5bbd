//! Core position types.
//!
//! - [`FixMode`] - Quality of the receiver's solution
//! - [`PositionFix`] - One complete position report

use chrono::{DateTime, Utc};

/// Fix quality reported by the positioning receiver.
///
/// Mirrors the gpsd `mode` field: 0 and 1 both mean no usable solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FixMode {
    /// No solution (mode unknown or no fix).
    #[default]
    NoFix,
    /// Latitude/longitude only.
    TwoD,
    /// Latitude/longitude and altitude.
    ThreeD,
}

impl FixMode {
    /// Map a gpsd `mode` value.
    pub fn from_gpsd(mode: u8) -> Self {
        match mode {
            2 => Self::TwoD,
            3 => Self::ThreeD,
            _ => Self::NoFix,
        }
    }

    pub fn has_fix(&self) -> bool {
        !matches!(self, Self::NoFix)
    }
}

impl std::fmt::Display for FixMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoFix => write!(f, "no fix"),
            Self::TwoD => write!(f, "2D"),
            Self::ThreeD => write!(f, "3D"),
        }
    }
}

/// A complete position report.
///
/// Every field comes from the same receiver update. Fields the receiver did
/// not provide are `None`; the "no fix" sentinel has every field `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionFix {
    /// UTC time of the fix as reported by the receiver.
    pub time: Option<DateTime<Utc>>,

    /// Altitude above mean sea level in meters (3D fixes only).
    pub altitude: Option<f64>,

    /// Latitude in degrees (-90 to 90).
    pub latitude: Option<f64>,

    /// Longitude in degrees (-180 to 180).
    pub longitude: Option<f64>,

    /// Fix quality.
    pub mode: FixMode,
}

impl PositionFix {
    /// The "no fix" sentinel.
    pub const fn no_fix() -> Self {
        Self {
            time: None,
            altitude: None,
            latitude: None,
            longitude: None,
            mode: FixMode::NoFix,
        }
    }

    /// Create a fix from receiver values.
    ///
    /// Collapses to [`PositionFix::no_fix`] when the mode reports no solution
    /// or the horizontal position is incomplete.
    pub fn new(
        time: Option<DateTime<Utc>>,
        latitude: Option<f64>,
        longitude: Option<f64>,
        altitude: Option<f64>,
        mode: FixMode,
    ) -> Self {
        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            return Self::no_fix();
        };
        if !mode.has_fix() {
            return Self::no_fix();
        }

        Self {
            time,
            altitude: if mode == FixMode::ThreeD { altitude } else { None },
            latitude: Some(latitude),
            longitude: Some(longitude),
            mode,
        }
    }

    /// Check whether this report carries a usable position.
    pub fn has_fix(&self) -> bool {
        self.mode.has_fix()
    }
}
