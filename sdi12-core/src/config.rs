//! Run-time bus configuration.

use sdi12_proto::timing::{DEFAULT_STREAM_TIMEOUT_MS, MAX_WAKE_DELAY_MS};

/// Value returned by the numeric parsers when no number arrives in time.
pub const DEFAULT_TIMEOUT_VALUE: i32 = -9999;

/// Per-instance settings for [`Sdi12Bus`](crate::Sdi12Bus).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Extra wake time after the break and marking, in milliseconds.
    ///
    /// Some sensors need longer than the protocol minimum to power up. Values
    /// are clamped below [`MAX_WAKE_DELAY_MS`].
    pub wake_delay_ms: u8,
    /// Sentinel returned by `parse_int` / `parse_float` on timeout.
    pub timeout_value: i32,
    /// How long timed reads wait for the next character.
    pub stream_timeout_ms: u32,
    /// Pause applied by `available()` when the buffer looks empty.
    ///
    /// Gives cooperative platforms a chance to run other work while the
    /// caller spins on `available()`. Zero disables it.
    pub yield_ms: u32,
}

impl Config {
    /// The protocol defaults.
    pub const fn new() -> Self {
        Self {
            wake_delay_ms: 0,
            timeout_value: DEFAULT_TIMEOUT_VALUE,
            stream_timeout_ms: DEFAULT_STREAM_TIMEOUT_MS,
            yield_ms: 0,
        }
    }

    /// Set the extra wake delay, clamped below 100 ms.
    #[must_use]
    pub const fn with_wake_delay(mut self, ms: u8) -> Self {
        self.wake_delay_ms = clamp_wake_delay(ms);
        self
    }

    /// Set the parser timeout sentinel.
    #[must_use]
    pub const fn with_timeout_value(mut self, value: i32) -> Self {
        self.timeout_value = value;
        self
    }

    /// Set the timed-read window.
    #[must_use]
    pub const fn with_stream_timeout(mut self, ms: u32) -> Self {
        self.stream_timeout_ms = ms;
        self
    }

    /// Set the `available()` yield pause.
    #[must_use]
    pub const fn with_yield(mut self, ms: u32) -> Self {
        self.yield_ms = ms;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
pub(crate) const fn clamp_wake_delay(ms: u8) -> u8 {
    if ms >= MAX_WAKE_DELAY_MS {
        MAX_WAKE_DELAY_MS - 1
    } else {
        ms
    }
}
