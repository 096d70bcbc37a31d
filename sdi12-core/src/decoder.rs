//! Edge-driven software UART receiver.
//!
//! No timer is involved. Each pin change carries the time since the previous
//! one; rounding that span to whole bit periods says how many bits passed,
//! and the level *before* the edge says what they were.
//!
//! Bit slots of one frame:
//!
//! ```text
//! slot:   0      1..=7          8        9
//!         start  data 0..6      parity   stop
//! ```
//!
//! `state` holds the slot that began at the previous edge.

use sdi12_proto::frame::{parity_matches, DATA_BITS, DATA_MASK, PARITY_MASK};
use sdi12_proto::timing::{bit_periods, is_break};

use crate::hal::{PinState, Ticks, TimeSource};

/// Decoder is idle, waiting for a rising edge.
pub const WAITING_FOR_START_BIT: u8 = 0xFF;

const PARITY_SLOT: u8 = DATA_BITS + 1;
const STOP_SLOT: u8 = DATA_BITS + 2;

/// Outcome of one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Decoded {
    /// A complete character, parity bit removed.
    Char {
        /// The 7-bit character.
        byte: u8,
        /// Whether the received parity bit was even over the data bits.
        parity_ok: bool,
    },
    /// A spacing span of break length started where a character would.
    Break,
}

/// Receive state machine for one data line.
#[derive(Debug, Clone)]
pub struct BitDecoder {
    state: u8,
    value: u8,
    last_edge: Ticks,
}

impl BitDecoder {
    /// A decoder waiting for a start bit.
    pub const fn new() -> Self {
        Self {
            state: WAITING_FOR_START_BIT,
            value: 0,
            last_edge: Ticks(0),
        }
    }

    /// Drop any partial character and wait for the next start bit.
    pub fn reset(&mut self) {
        self.state = WAITING_FOR_START_BIT;
        self.value = 0;
    }

    /// Whether a character is partially received.
    #[inline]
    #[must_use]
    pub fn in_frame(&self) -> bool {
        self.state != WAITING_FOR_START_BIT
    }

    /// Feed an edge timestamped `now`; `level` is the line after the edge.
    pub fn on_edge<T: TimeSource + ?Sized>(
        &mut self,
        time: &T,
        now: Ticks,
        level: PinState,
    ) -> Option<Decoded> {
        let elapsed = time.elapsed_micros(self.last_edge, now);
        self.last_edge = now;
        self.step(elapsed, level)
    }

    /// Feed an edge `elapsed_micros` after the previous one.
    pub fn step(&mut self, elapsed_micros: u32, level: PinState) -> Option<Decoded> {
        if self.state == WAITING_FOR_START_BIT {
            // line going HIGH (spacing) is a start bit
            if level == PinState::High {
                self.start();
            }
            return None;
        }

        if self.state == 0 && level == PinState::Low && is_break(elapsed_micros) {
            self.reset();
            return Some(Decoded::Break);
        }

        let periods = bit_periods(elapsed_micros);
        if periods == 0 {
            return None;
        }

        let bits_left = STOP_SLOT - self.state;
        let bits = periods.min(u32::from(bits_left)) as u8;

        // The level before the edge is the opposite of `level`; LOW is a 1.
        if level == PinState::High {
            for slot in self.state.max(1)..self.state + bits {
                self.value |= 1 << (slot - 1);
            }
        }
        self.state += bits;

        if self.state == PARITY_SLOT && level == PinState::Low {
            // edge opened the parity slot; parity is the new level
            self.value |= PARITY_MASK;
        }
        if self.state < PARITY_SLOT {
            return None;
        }

        let raw = self.value;
        if periods > u32::from(bits_left) && level == PinState::High {
            // trailing bits were marking and this edge is the next start bit
            self.start();
        } else {
            self.reset();
        }

        Some(Decoded::Char {
            byte: raw & DATA_MASK,
            parity_ok: parity_matches(raw),
        })
    }

    fn start(&mut self) {
        self.state = 0;
        self.value = 0;
    }
}

impl Default for BitDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::sim::{edges_for_bits, edges_for_bytes};
    use sdi12_proto::frame::frame_bits;
    use sdi12_proto::timing::{BIT_WIDTH_MICROS, LINE_BREAK_MICROS};
    use std::vec::Vec;

    fn decode(edges: &[(u32, PinState)]) -> Vec<Decoded> {
        let mut decoder = BitDecoder::new();
        let mut last = 0;
        let mut out = Vec::new();
        for &(at, level) in edges {
            if let Some(d) = decoder.step(at - last, level) {
                out.push(d);
            }
            last = at;
        }
        out
    }

    fn chars(bytes: &[u8]) -> Vec<Decoded> {
        bytes
            .iter()
            .map(|&byte| Decoded::Char {
                byte,
                parity_ok: true,
            })
            .collect()
    }

    #[test]
    fn test_single_character() {
        // 'M' closes on the edge opening its spacing parity slot
        assert_eq!(decode(&edges_for_bytes(b"M", 1_000)), chars(b"M"));
    }

    #[test]
    fn test_response_line() {
        assert_eq!(
            decode(&edges_for_bytes(b"00013\r\n", 500)),
            chars(b"00013\r\n")
        );
    }

    #[test]
    fn test_trailing_marking_completes_on_next_start() {
        // 0x7F is all marking after the start bit: only the next start
        // edge can close it
        assert_eq!(decode(&edges_for_bytes(&[0x7F], 0)), []);
        assert_eq!(
            decode(&edges_for_bytes(&[0x7F, b'\n'], 0)),
            chars(&[0x7F, b'\n'])
        );
    }

    #[test]
    fn test_idle_gap_between_characters() {
        let mut edges = edges_for_bytes(b"0", 0);
        edges.extend(edges_for_bytes(b"!", 40_000));
        assert_eq!(decode(&edges), chars(b"0!"));
    }

    #[test]
    fn test_parity_mismatch_still_delivered() {
        // '1' needs parity 1; send it with parity 0
        let mut bits: Vec<bool> = frame_bits(b'1').collect();
        bits[8] = false;
        bits.push(false); // spacing after the stop bit closes the frame
        let decoded = decode(&edges_for_bits(&bits, 0));
        assert_eq!(
            decoded[0],
            Decoded::Char {
                byte: b'1',
                parity_ok: false
            }
        );
    }

    #[test]
    fn test_falling_edge_ignored_while_waiting() {
        let mut decoder = BitDecoder::new();
        assert_eq!(decoder.step(5_000, PinState::Low), None);
        assert!(!decoder.in_frame());
        assert_eq!(decoder.step(5_000, PinState::High), None);
        assert!(decoder.in_frame());
    }

    #[test]
    fn test_break_threshold() {
        let mut decoder = BitDecoder::new();
        decoder.step(0, PinState::High);
        assert_eq!(
            decoder.step(LINE_BREAK_MICROS + 1, PinState::Low),
            Some(Decoded::Break)
        );
        assert!(!decoder.in_frame());

        // 12099 us of spacing is a (malformed) character, not a break
        let mut decoder = BitDecoder::new();
        decoder.step(0, PinState::High);
        assert_ne!(
            decoder.step(LINE_BREAK_MICROS - 1, PinState::Low),
            Some(Decoded::Break)
        );
    }

    #[test]
    fn test_glitch_only_moves_timestamp() {
        let mut decoder = BitDecoder::new();
        decoder.step(0, PinState::High);
        assert_eq!(decoder.step(100, PinState::Low), None);
        assert_eq!(decoder.step(100, PinState::High), None);
        assert!(decoder.in_frame());
    }

    #[test]
    fn test_tolerates_jitter() {
        // every edge 200 us late or early still rounds to the right slot
        let edges: Vec<(u32, PinState)> = edges_for_bytes(b"0D0!", 10_000)
            .into_iter()
            .enumerate()
            .map(|(i, (at, level))| {
                let skew = if i % 2 == 0 { 200 } else { 0 };
                (at + skew, level)
            })
            .collect();
        assert_eq!(decode(&edges), chars(b"0D0!"));
    }

    #[test]
    fn test_on_edge_uses_time_source() {
        use crate::sim::SimLine;

        let sim = SimLine::new();
        let mut decoder = BitDecoder::new();
        let mut out = Vec::new();
        // 'a' ends on marking, so the LF's start bit completes it
        for (at, level) in edges_for_bytes(b"a\n", 3 * BIT_WIDTH_MICROS) {
            sim.advance_to(at);
            if let Some(d) = decoder.on_edge(&sim, sim.now(), level) {
                out.push(d);
            }
        }
        assert_eq!(out, chars(b"a\n"));
    }
}
