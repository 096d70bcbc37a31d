//! Line timing for 1200 baud SDI-12.
//!
//! All durations are in microseconds unless the name says otherwise. The
//! transmit-side values carry a small margin over the protocol minimums so a
//! slightly fast clock still produces a conforming waveform.

/// Width of one bit at 1200 baud (1 / 1200 s ≈ 833.33 µs).
pub const BIT_WIDTH_MICROS: u32 = 833;

/// Break sent before a command. Protocol minimum is 12 ms.
pub const LINE_BREAK_MICROS: u32 = 12_100;

/// Marking sent after a break or before a response. Protocol minimum is 8.33 ms.
pub const LINE_MARK_MICROS: u32 = 8_400;

/// Extra sensor wake time must stay below this many milliseconds.
pub const MAX_WAKE_DELAY_MS: u8 = 100;

/// Default time a timed read waits for the next character.
pub const DEFAULT_STREAM_TIMEOUT_MS: u32 = 150;

/// Number of whole bit periods covered by `elapsed_micros`, rounded to nearest.
///
/// Rounding absorbs interrupt latency and clock skew of up to half a bit in
/// either direction.
#[inline]
#[must_use]
pub const fn bit_periods(elapsed_micros: u32) -> u32 {
    elapsed_micros.saturating_add(BIT_WIDTH_MICROS / 2) / BIT_WIDTH_MICROS
}

/// Whether a continuous spacing (HIGH) span is long enough to be a break.
#[inline]
#[must_use]
pub const fn is_break(spacing_micros: u32) -> bool {
    spacing_micros >= LINE_BREAK_MICROS
}
