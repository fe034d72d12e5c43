//! Field Splitting and Lenient Numeric Parsing

use crate::framing::{CHECKSUM_DELIMITER, FIELD_DELIMITER};

/// Most fields any handled sentence carries (GSV with four satellites has 20)
const MAX_FIELDS: usize = 32;

/// Comma-separated fields of one sentence, borrowed from the line.
///
/// The checksum suffix and line terminator are excluded. Fields past
/// [`MAX_FIELDS`] are ignored.
pub struct Fields<'a> {
    items: [&'a [u8]; MAX_FIELDS],
    len: usize,
}

impl<'a> Fields<'a> {
    /// Split a sentence into its fields
    pub fn split(line: &'a [u8]) -> Self {
        let end = line
            .iter()
            .position(|&b| b == CHECKSUM_DELIMITER || b == b'\r' || b == b'\n')
            .unwrap_or(line.len());

        let empty: &'a [u8] = &[];
        let mut items = [empty; MAX_FIELDS];
        let mut len = 0;
        for field in line[..end].split(|&b| b == FIELD_DELIMITER).take(MAX_FIELDS) {
            items[len] = field;
            len += 1;
        }

        Self { items, len }
    }

    /// Field at `index`, or an empty field if the sentence is shorter
    pub fn get(&self, index: usize) -> &'a [u8] {
        if index < self.len {
            self.items[index]
        } else {
            &[]
        }
    }

    /// Sentence tag (field 0)
    pub fn tag(&self) -> &'a [u8] {
        self.get(0)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Field parsed as a decimal number, 0.0 when malformed
    pub fn decimal(&self, index: usize) -> f64 {
        parse_decimal(self.get(index))
    }

    /// Field parsed as an integer from its leading digits, 0 when malformed
    pub fn integer(&self, index: usize) -> i64 {
        parse_integer(self.get(index))
    }

    /// Field parsed as a small count, 0 when malformed or out of range
    pub fn count(&self, index: usize) -> u8 {
        u8::try_from(self.integer(index)).unwrap_or(0)
    }

    /// First character of a single-letter field (hemisphere, status)
    pub fn letter(&self, index: usize) -> Option<char> {
        self.get(index).first().map(|&b| char::from(b))
    }
}

/// Parse the longest numeric prefix of `text`, like C's `atof` in the "C" locale.
///
/// Malformed or empty text yields 0.0 instead of an error.
pub fn parse_decimal(text: &[u8]) -> f64 {
    let text = trim_leading_space(text);
    let mut end = sign_len(text);
    let digits_start = end;
    end += digit_run(&text[end..]);
    let int_digits = end - digits_start;

    let mut frac_digits = 0;
    if text.get(end) == Some(&b'.') {
        frac_digits = digit_run(&text[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return 0.0;
    }

    std::str::from_utf8(&text[..end])
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.0)
}

/// Parse the leading integer of `text`, like C's `atoi`.
///
/// Malformed, empty or overflowing text yields 0.
pub fn parse_integer(text: &[u8]) -> i64 {
    let text = trim_leading_space(text);
    let end = sign_len(text);
    let end = end + digit_run(&text[end..]);

    std::str::from_utf8(&text[..end])
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

fn trim_leading_space(text: &[u8]) -> &[u8] {
    let start = text
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(text.len());
    &text[start..]
}

fn sign_len(text: &[u8]) -> usize {
    match text.first() {
        Some(b'-') | Some(b'+') => 1,
        _ => 0,
    }
}

fn digit_run(text: &[u8]) -> usize {
    text.iter().take_while(|b| b.is_ascii_digit()).count()
}
