//! NMEA Error Types

use thiserror::Error;

/// Reasons a line is rejected before decoding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NmeaError {
    /// Computed checksum differs from the transmitted one
    #[error("Checksum mismatch: expected {expected:02X}, got {actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// No `*HH` suffix within the line, or non-hex digits after `*`
    #[error("Missing or malformed checksum suffix")]
    MalformedChecksum,

    /// Line does not begin with `$`
    #[error("Sentence does not start with '$'")]
    MissingStartDelimiter,

    /// Line did not fit the staging buffer
    #[error("Sentence truncated at {kept} bytes ({dropped} dropped)")]
    LineTruncated { kept: usize, dropped: usize },
}

impl NmeaError {
    /// Whether this rejection counts as a failed checksum validation
    pub fn is_checksum_failure(&self) -> bool {
        !matches!(self, NmeaError::LineTruncated { .. })
    }
}
