//! 7E1 character framing.
//!
//! Every character travels as 10 bits: one start bit (0), seven data bits
//! least significant first, one even parity bit and one stop bit (1).

/// Bits in one character frame.
pub const BITS_PER_FRAME: usize = 10;

/// Data bits per character.
pub const DATA_BITS: u8 = 7;

/// Mask of the data bits within a received value.
pub const DATA_MASK: u8 = 0x7F;

/// Position of the parity bit within a received value.
pub const PARITY_MASK: u8 = 0x80;

/// Even parity bit for the 7 data bits of `data`.
///
/// Returns `true` when the parity bit must be 1, i.e. when the data bits hold
/// an odd number of ones. Bit 7 of `data` is ignored.
#[inline]
#[must_use]
pub const fn parity_even_bit(data: u8) -> bool {
    (data & DATA_MASK).count_ones() % 2 == 1
}

/// Check an assembled value (data in bits 0-6, parity in bit 7).
#[inline]
#[must_use]
pub const fn parity_matches(value: u8) -> bool {
    parity_even_bit(value) == (value & PARITY_MASK != 0)
}

/// Iterate over the logical bits of one frame, in transmission order.
///
/// `true` is a logical 1 (marking, line LOW), `false` a logical 0 (spacing,
/// line HIGH). Bit 7 of `byte` is ignored.
#[inline]
pub fn frame_bits(byte: u8) -> FrameBits {
    let data = (byte & DATA_MASK) as u16;
    let parity = parity_even_bit(byte) as u16;
    // start (0) | data << 1 | parity << 8 | stop (1) << 9
    FrameBits {
        bits: (data << 1) | (parity << 8) | (1 << 9),
        index: 0,
    }
}

/// Iterator returned by [`frame_bits`].
#[derive(Debug, Clone)]
pub struct FrameBits {
    bits: u16,
    index: u8,
}

impl Iterator for FrameBits {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.index as usize >= BITS_PER_FRAME {
            return None;
        }
        let bit = (self.bits >> self.index) & 1 == 1;
        self.index += 1;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = BITS_PER_FRAME - self.index as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for FrameBits {}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec;

    #[test]
    fn test_parity_even_bit() {
        assert!(!parity_even_bit(0x00));
        assert!(parity_even_bit(0x01));
        assert!(!parity_even_bit(0x03));
        // '0' = 0b011_0000
        assert!(!parity_even_bit(b'0'));
        // '1' = 0b011_0001
        assert!(parity_even_bit(b'1'));
        assert!(parity_even_bit(0x7F));
        // bit 7 does not take part
        assert_eq!(parity_even_bit(0x81), parity_even_bit(0x01));
    }

    #[test]
    fn test_parity_matches_every_value() {
        for data in 0u8..=0x7F {
            let good = data | if parity_even_bit(data) { PARITY_MASK } else { 0 };
            assert!(parity_matches(good), "value {:#04x}", good);
            assert!(!parity_matches(good ^ PARITY_MASK));
        }
    }

    #[test]
    fn test_frame_layout() {
        // 'M' = 0x4D = 0b100_1101, four ones -> parity 0
        let bits: Vec<bool> = frame_bits(b'M').collect();
        assert_eq!(
            bits,
            [false, true, false, true, true, false, false, true, false, true]
        );
    }

    #[test]
    fn test_frame_has_even_ones_over_data_and_parity() {
        for byte in 0u8..=0x7F {
            let bits: Vec<bool> = frame_bits(byte).collect();
            assert_eq!(bits.len(), BITS_PER_FRAME);
            assert!(!bits[0], "start bit must be spacing");
            assert!(bits[9], "stop bit must be marking");
            let ones = bits[1..9].iter().filter(|&&b| b).count();
            assert_eq!(ones % 2, 0, "byte {:#04x}", byte);
        }
    }
}
