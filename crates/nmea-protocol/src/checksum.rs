//! Sentence Checksum Validation
//!
//! The checksum is the XOR of every byte strictly between `$` and `*`,
//! transmitted as two hex digits after the `*`.

use crate::error::NmeaError;
use crate::framing::{CHECKSUM_DELIMITER, START_DELIMITER};

/// XOR of all bytes in `payload`
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// Validate the checksum of a `$...*HH` line.
///
/// The scan never leaves `line`: a missing `*` or a short suffix is reported
/// as [`NmeaError::MalformedChecksum`].
pub fn validate(line: &[u8]) -> Result<(), NmeaError> {
    if line.first() != Some(&START_DELIMITER) {
        return Err(NmeaError::MissingStartDelimiter);
    }

    let star = line
        .iter()
        .position(|&b| b == CHECKSUM_DELIMITER)
        .ok_or(NmeaError::MalformedChecksum)?;

    let expected = match line.get(star + 1..star + 3) {
        Some(&[high, low]) => hex_byte(high, low).ok_or(NmeaError::MalformedChecksum)?,
        _ => return Err(NmeaError::MalformedChecksum),
    };

    let actual = checksum(&line[1..star]);
    if actual != expected {
        return Err(NmeaError::ChecksumMismatch { expected, actual });
    }
    Ok(())
}

fn hex_byte(high: u8, low: u8) -> Option<u8> {
    Some(hex_digit(high)? << 4 | hex_digit(low)?)
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}
