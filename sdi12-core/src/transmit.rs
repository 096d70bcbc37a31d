//! Bit-banged transmitter.
//!
//! Bits are timed against the [`TimeSource`] with deadlines measured from
//! the start of each frame, so rounding in one bit never shifts the next.

use sdi12_proto::frame::frame_bits;
use sdi12_proto::timing::{BIT_WIDTH_MICROS, LINE_BREAK_MICROS, LINE_MARK_MICROS};

use crate::config::clamp_wake_delay;
use crate::hal::{Hardware, PinId, PinState};

/// Drives one data pin that is already an output.
pub(crate) struct Transmitter<'a, H> {
    hw: &'a H,
    pin: PinId,
}

impl<'a, H: Hardware> Transmitter<'a, H> {
    pub(crate) fn new(hw: &'a H, pin: PinId) -> Self {
        Self { hw, pin }
    }

    /// Break, marking, then `extra_ms` more marking for slow sensors.
    pub(crate) fn wake(&self, extra_ms: u8) {
        let start = self.hw.now();
        self.hw.write(self.pin, PinState::High);
        self.hw.delay_until(start, LINE_BREAK_MICROS);

        let extra = u32::from(clamp_wake_delay(extra_ms)) * 1_000;
        let mark = self.hw.now();
        self.hw.write(self.pin, PinState::Low);
        self.hw.delay_until(mark, LINE_MARK_MICROS + extra);
    }

    /// Marking that precedes a response.
    pub(crate) fn marking(&self) {
        let start = self.hw.now();
        self.hw.write(self.pin, PinState::Low);
        self.hw.delay_until(start, LINE_MARK_MICROS);
    }

    /// One 7E1 frame. Runs inside a critical section.
    pub(crate) fn write_char(&self, byte: u8) {
        critical_section::with(|_| {
            let start = self.hw.now();
            let mut deadline = 0;
            for bit in frame_bits(byte) {
                // logical 1 is marking (LOW)
                let level = if bit { PinState::Low } else { PinState::High };
                self.hw.write(self.pin, level);
                deadline += BIT_WIDTH_MICROS;
                self.hw.delay_until(start, deadline);
            }
        });
    }

    pub(crate) fn write_all(&self, bytes: &[u8]) {
        for &byte in bytes {
            self.write_char(byte);
        }
    }
}
