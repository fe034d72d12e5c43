//! NMEA-0183 Protocol Implementation
//!
//! This crate validates NMEA-0183 sentence checksums and decodes the six
//! sentence types a GPS receiver reports its fix with (GLL, RMC, VTG, GGA,
//! GSA, GSV) into an incrementally updated [`FixSnapshot`].

mod checksum;
mod error;
mod fields;
mod fix;
mod sentence;

pub use checksum::{checksum, validate};
pub use error::NmeaError;
pub use fields::Fields;
pub use fix::FixSnapshot;
pub use sentence::{Decoder, SentenceKind};

/// NMEA-0183 framing constants
pub mod framing {
    /// Start of a sentence
    pub const START_DELIMITER: u8 = b'$';
    /// Separates the payload from the checksum
    pub const CHECKSUM_DELIMITER: u8 = b'*';
    /// Separates fields
    pub const FIELD_DELIMITER: u8 = b',';
    /// Longest sentence allowed by the standard, `$` through `\r\n`
    pub const MAX_SENTENCE_LEN: usize = 82;
}
