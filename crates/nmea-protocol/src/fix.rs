//! Latest Decoded Fix

use serde::{Deserialize, Serialize};

/// Latest values decoded from the receiver.
///
/// Each sentence type overwrites only the members it carries; everything
/// else keeps its value from earlier sentences. There is a single writer (the
/// processing task). Readers that copy the snapshot while a sentence is being
/// applied may see old and new members mixed, since members are not updated
/// as a unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FixSnapshot {
    /// UTC time of fix as transmitted (hhmmss.ss)
    pub utc_time: f64,
    /// UT date as transmitted (ddmmyy)
    pub ut_date: i64,
    /// Latitude as transmitted (ddmm.mmmm)
    pub latitude: f64,
    /// 'N' or 'S'
    pub latitude_direction: Option<char>,
    /// Longitude as transmitted (dddmm.mmmm)
    pub longitude: f64,
    /// 'E' or 'W'
    pub longitude_direction: Option<char>,
    /// Antenna altitude above mean sea level (m)
    pub altitude: f64,
    /// Geoid height above the WGS84 ellipsoid (m)
    pub geoidal_separation: f64,
    /// Speed over ground (km/h)
    pub speed_kmph: f64,
    /// Speed over ground (knots)
    pub speed_knots: f64,
    /// Satellites in view
    pub sat_in_view: u8,
    /// Satellites used in the fix
    pub sat_in_use: u8,
    /// GGA fix quality (0 = invalid)
    pub fix: u8,
    /// GSA fix mode (1 = none, 2 = 2D, 3 = 3D)
    pub fix_mode: u8,
    /// Position dilution of precision
    pub pdop: f64,
    /// Horizontal dilution of precision
    pub hdop: f64,
    /// Vertical dilution of precision
    pub vdop: f64,
}

impl FixSnapshot {
    /// Check if the last GGA reported a valid fix
    pub fn has_fix(&self) -> bool {
        self.fix != 0
    }

    /// Latitude in signed decimal degrees (positive = North)
    pub fn latitude_degrees(&self) -> f64 {
        signed_degrees(self.latitude, self.latitude_direction, 'S')
    }

    /// Longitude in signed decimal degrees (positive = East)
    pub fn longitude_degrees(&self) -> f64 {
        signed_degrees(self.longitude, self.longitude_direction, 'W')
    }
}

/// Convert NMEA `[d]ddmm.mmmm` to decimal degrees
fn signed_degrees(raw: f64, direction: Option<char>, negative: char) -> f64 {
    let degrees = (raw / 100.0).trunc();
    let minutes = raw - degrees * 100.0;
    let value = degrees + minutes / 60.0;
    if direction == Some(negative) {
        -value
    } else {
        value
    }
}
