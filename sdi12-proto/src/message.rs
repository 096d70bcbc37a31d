//! Message framing helpers.
//!
//! A sensor response is laid out as:
//!
//! ```text
//! <address><values><CR><LF>
//! <address><values><CRC><CR><LF>
//! ```
//!
//! Each value is `[+-]digits[.digits]`: a mandatory polarity sign, at most
//! seven digits and an optional decimal point, nine characters at most. The
//! sign doubles as the delimiter between values.

use heapless::Vec;

use crate::crc::{calculate_crc, crc_to_ascii, CRC_ASCII_LEN};

/// Maximum characters in one value (sign + 7 digits + decimal point).
pub const MAX_VALUE_LEN: usize = 9;

/// Maximum digits in one value.
pub const MAX_VALUE_DIGITS: usize = 7;

/// Maximum `<values>` length in the answer to a plain D command.
pub const MAX_DATA_LEN: usize = 35;

/// Maximum `<values>` length for concurrent, continuous and high-volume ASCII data.
pub const MAX_HV_DATA_LEN: usize = 75;

/// Longest response: address + 75 value characters + CRC + CR + LF.
pub const MAX_RESPONSE_LEN: usize = 1 + MAX_HV_DATA_LEN + CRC_ASCII_LEN + 2;

/// A response assembled for transmission, terminator included.
pub type Response = Vec<u8, MAX_RESPONSE_LEN>;

/// Error type for message assembly and value validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageError {
    /// The message does not fit the fixed-capacity buffer.
    TooLong,
    /// A value does not start with `+` or `-`.
    MissingSign,
    /// A value has no digits, too many digits, or a stray character.
    InvalidValue,
    /// A value is longer than nine characters.
    ValueTooLong,
}

/// Strip a trailing CR and/or LF from a line.
#[inline]
#[must_use]
pub fn strip_line_ending(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    if end > 0 && line[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && line[end - 1] == b'\r' {
        end -= 1;
    }
    &line[..end]
}

/// Split a response into its content and trailing CRC field.
///
/// The line ending is stripped first. Returns `None` when the remainder is too
/// short to carry a CRC. The CRC itself is not checked; see
/// [`verify_crc`](crate::crc::verify_crc).
#[must_use]
pub fn split_crc(message: &[u8]) -> Option<(&[u8], &[u8])> {
    let body = strip_line_ending(message);
    if body.len() < CRC_ASCII_LEN {
        return None;
    }
    Some(body.split_at(body.len() - CRC_ASCII_LEN))
}

/// Assemble a response ready for transmission.
///
/// Any CR LF already ending `body` is dropped, the CRC of the remaining
/// content is appended when `add_crc` is set, and a single CR LF closes the
/// message.
pub fn build_response(body: &[u8], add_crc: bool) -> Result<Response, MessageError> {
    let content = strip_line_ending(body);
    let mut out = Response::new();
    out.extend_from_slice(content)
        .map_err(|_| MessageError::TooLong)?;
    if add_crc {
        out.extend_from_slice(&crc_to_ascii(calculate_crc(content)))
            .map_err(|_| MessageError::TooLong)?;
    }
    out.extend_from_slice(b"\r\n")
        .map_err(|_| MessageError::TooLong)?;
    Ok(out)
}

/// Iterate over the values of a `<values>` field.
///
/// Each item is the raw value including its sign, or the reason it is
/// malformed. Iteration stops after the first error.
#[inline]
pub fn values(field: &[u8]) -> ValueIter<'_> {
    ValueIter {
        rest: field,
        failed: false,
    }
}

/// Iterator returned by [`values`].
#[derive(Debug, Clone)]
pub struct ValueIter<'a> {
    rest: &'a [u8],
    failed: bool,
}

impl<'a> Iterator for ValueIter<'a> {
    type Item = Result<&'a [u8], MessageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.rest.is_empty() {
            return None;
        }
        if !is_sign(self.rest[0]) {
            self.failed = true;
            return Some(Err(MessageError::MissingSign));
        }
        let end = self.rest[1..]
            .iter()
            .position(|&b| is_sign(b))
            .map_or(self.rest.len(), |p| p + 1);
        let (value, rest) = self.rest.split_at(end);
        self.rest = rest;

        let checked = validate_value(value);
        if checked.is_err() {
            self.failed = true;
        }
        Some(checked.map(|()| value))
    }
}

#[inline]
fn is_sign(b: u8) -> bool {
    b == b'+' || b == b'-'
}

/// Check one signed value against the `[+-]digits[.digits]` layout.
fn validate_value(value: &[u8]) -> Result<(), MessageError> {
    if value.len() > MAX_VALUE_LEN {
        return Err(MessageError::ValueTooLong);
    }
    let mut digits = 0;
    let mut seen_point = false;
    for &b in &value[1..] {
        match b {
            b'0'..=b'9' => digits += 1,
            b'.' if !seen_point => seen_point = true,
            _ => return Err(MessageError::InvalidValue),
        }
    }
    if digits == 0 || digits > MAX_VALUE_DIGITS {
        return Err(MessageError::InvalidValue);
    }
    Ok(())
}
