//! Sentence Dispatch and Decoding
//!
//! Maps the fields of each handled sentence type onto [`FixSnapshot`] members.

use crate::fields::Fields;
use crate::fix::FixSnapshot;
use crate::framing::START_DELIMITER;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Handled sentence formatters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentenceKind {
    /// Geographic position, latitude/longitude
    Gll,
    /// Recommended minimum specific GNSS data
    Rmc,
    /// Course over ground and ground speed
    Vtg,
    /// Global positioning system fix data
    Gga,
    /// DOP and active satellites
    Gsa,
    /// Satellites in view
    Gsv,
}

impl SentenceKind {
    /// Look up the formatter of a `$TTFFF` tag.
    ///
    /// With `accept_any_talker` false only the `GP` talker is recognised.
    pub fn from_tag(tag: &[u8], accept_any_talker: bool) -> Option<Self> {
        let [start, t1, t2, f1, f2, f3] = *<&[u8; 6]>::try_from(tag).ok()?;
        if start != START_DELIMITER || !t1.is_ascii_uppercase() || !t2.is_ascii_uppercase() {
            return None;
        }
        if !accept_any_talker && [t1, t2] != *b"GP" {
            return None;
        }

        match &[f1, f2, f3] {
            b"GLL" => Some(SentenceKind::Gll),
            b"RMC" => Some(SentenceKind::Rmc),
            b"VTG" => Some(SentenceKind::Vtg),
            b"GGA" => Some(SentenceKind::Gga),
            b"GSA" => Some(SentenceKind::Gsa),
            b"GSV" => Some(SentenceKind::Gsv),
            _ => None,
        }
    }

    /// Formatter mnemonic
    pub fn as_str(&self) -> &'static str {
        match self {
            SentenceKind::Gll => "GLL",
            SentenceKind::Rmc => "RMC",
            SentenceKind::Vtg => "VTG",
            SentenceKind::Gga => "GGA",
            SentenceKind::Gsa => "GSA",
            SentenceKind::Gsv => "GSV",
        }
    }
}

/// Applies checksum-valid sentences to a fix snapshot
#[derive(Debug, Clone, Copy)]
pub struct Decoder {
    accept_any_talker: bool,
}

impl Decoder {
    /// Create a decoder; see [`SentenceKind::from_tag`] for `accept_any_talker`
    pub fn new(accept_any_talker: bool) -> Self {
        Self { accept_any_talker }
    }

    /// Decode one sentence into `fix`.
    ///
    /// Returns the kind applied, or `None` for an unrecognised tag, in which
    /// case `fix` is untouched.
    pub fn decode(&self, line: &[u8], fix: &mut FixSnapshot) -> Option<SentenceKind> {
        let fields = Fields::split(line);
        let kind = SentenceKind::from_tag(fields.tag(), self.accept_any_talker)?;

        match kind {
            SentenceKind::Gll => {
                fix.latitude = fields.decimal(1);
                fix.latitude_direction = fields.letter(2);
                fix.longitude = fields.decimal(3);
                fix.longitude_direction = fields.letter(4);
            }
            SentenceKind::Rmc => {
                fix.utc_time = fields.decimal(1);
                fix.ut_date = fields.integer(9);
                fix.latitude = fields.decimal(3);
                fix.latitude_direction = fields.letter(4);
                fix.longitude = fields.decimal(5);
                fix.longitude_direction = fields.letter(6);
            }
            SentenceKind::Vtg => {
                fix.speed_knots = fields.decimal(5);
                fix.speed_kmph = fields.decimal(7);
            }
            SentenceKind::Gga => {
                fix.utc_time = fields.decimal(1);
                fix.latitude = fields.decimal(2);
                fix.latitude_direction = fields.letter(3);
                fix.longitude = fields.decimal(4);
                fix.longitude_direction = fields.letter(5);
                fix.fix = fields.count(6);
                fix.sat_in_use = fields.count(7);
                fix.hdop = fields.decimal(8);
                fix.altitude = fields.decimal(9);
                fix.geoidal_separation = fields.decimal(11);
            }
            SentenceKind::Gsa => {
                fix.fix_mode = fields.count(2);
                fix.pdop = fields.decimal(15);
                fix.hdop = fields.decimal(16);
                fix.vdop = fields.decimal(17);
            }
            SentenceKind::Gsv => {
                fix.sat_in_view = fields.count(3);
            }
        }

        trace!("Decoded {} sentence ({} fields)", kind.as_str(), fields.len());
        Some(kind)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(true)
    }
}
