//! SDI-12 CRC16 and its ASCII transport encoding.
//!
//! The checksum is CRC-16/ARC (reflected polynomial 0xA001, initial value 0)
//! over every byte of a response before the CRC field: the address and the
//! values. On the wire it is packed into three printable characters:
//!
//! ```text
//! 1st = 0x40 | (crc >> 12)
//! 2nd = 0x40 | ((crc >> 6) & 0x3F)
//! 3rd = 0x40 | (crc & 0x3F)
//! ```

use crc::{Crc, CRC_16_ARC};

use crate::message::strip_line_ending;

/// Length of the encoded CRC field.
pub const CRC_ASCII_LEN: usize = 3;

/// CRC-16/ARC calculator with 256-entry lookup table.
static CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_ARC);

/// Calculate the SDI-12 CRC16 of a byte slice.
#[inline]
#[must_use]
pub fn calculate_crc(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// Encode a CRC16 as the three ASCII characters sent on the wire.
#[inline]
#[must_use]
pub const fn crc_to_ascii(crc: u16) -> [u8; CRC_ASCII_LEN] {
    [
        0x40 | (crc >> 12) as u8,
        0x40 | ((crc >> 6) & 0x3F) as u8,
        0x40 | (crc & 0x3F) as u8,
    ]
}

/// Verify the CRC field at the end of a message.
///
/// `message` is the full response, optionally still terminated by CR LF. The
/// CRC is recomputed over everything before the final three characters and
/// compared with them. A mismatch means the response should be requested
/// again; it is never a fatal condition.
#[must_use]
pub fn verify_crc(message: &[u8]) -> bool {
    let body = strip_line_ending(message);
    if body.len() < CRC_ASCII_LEN {
        return false;
    }
    let (content, received) = body.split_at(body.len() - CRC_ASCII_LEN);
    crc_to_ascii(calculate_crc(content)) == received
}

/// CRC16 digest for incremental calculation.
///
/// Use this when a response is assembled piecewise, e.g. value by value.
pub struct Crc16Digest {
    digest: crc::Digest<'static, u16>,
}

impl Crc16Digest {
    /// Create a new CRC16 digest.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            digest: CRC16.digest(),
        }
    }

    /// Update the digest with a byte slice.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        self.digest.update(data);
    }

    /// Finalize and return the checksum value.
    #[inline]
    #[must_use]
    pub fn finalize(self) -> u16 {
        self.digest.finalize()
    }
}

impl Default for Crc16Digest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec;

    fn with_crc(body: &[u8]) -> Vec<u8> {
        let mut msg = body.to_vec();
        msg.extend_from_slice(&crc_to_ascii(calculate_crc(body)));
        msg.extend_from_slice(b"\r\n");
        msg
    }

    #[test]
    fn test_crc_check_value() {
        assert_eq!(calculate_crc(b"123456789"), 0xBB3D);
    }

    #[test]
    fn test_crc_empty() {
        assert_eq!(calculate_crc(b""), 0);
        assert_eq!(&crc_to_ascii(0), b"@@@");
    }

    #[test]
    fn test_crc_protocol_example() {
        // Example response from the SDI-12 protocol document
        assert_eq!(calculate_crc(b"0+3.14"), 0xFC5A);
        assert_eq!(&crc_to_ascii(0xFC5A), b"OqZ");
        assert!(verify_crc(b"0+3.14OqZ\r\n"));
        assert!(verify_crc(b"0+3.14OqZ"));
    }

    #[test]
    fn test_crc_ascii_is_printable() {
        for crc in [0u16, 0x0FFF, 0xF000, 0xFFFF, 0x1234, 0xA5A5] {
            for c in crc_to_ascii(crc) {
                assert!((0x40..=0x7F).contains(&c));
            }
        }
    }

    #[test]
    fn test_verify_round_trip() {
        for body in [&b"0"[..], b"0+1.11+2.22", b"a-12.5+7", b"Z0013", b"1+0.0-0.0"] {
            assert!(verify_crc(&with_crc(body)));
        }
    }

    #[test]
    fn test_verify_rejects_any_single_flip() {
        let msg = with_crc(b"0+22.47-3.1+1013");
        let covered = msg.len() - 2;
        for i in 0..covered {
            let mut bad = msg.clone();
            bad[i] ^= 0x01;
            assert!(!verify_crc(&bad), "flip at {} not detected", i);
        }
    }

    #[test]
    fn test_verify_too_short() {
        assert!(!verify_crc(b""));
        assert!(!verify_crc(b"\r\n"));
        assert!(!verify_crc(b"@@"));
        // empty content, CRC of nothing
        assert!(verify_crc(b"@@@\r\n"));
    }

    #[test]
    fn test_digest_matches_batch() {
        let data = b"0+3.14+2.718";
        let mut digest = Crc16Digest::new();
        digest.update(b"0");
        digest.update(b"+3.14");
        digest.update(b"+2.718");
        assert_eq!(digest.finalize(), calculate_crc(data));
    }
}
