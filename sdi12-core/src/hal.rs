//! Hardware seams: the time source and the data-line driver.
//!
//! The driver never touches registers itself. A board crate implements
//! [`TimeSource`] and [`LineDriver`] for one type and hands it to a
//! [`Registry`](crate::Registry); host tests use a simulated implementation.
//!
//! Every method takes `&self` because the same hardware value is shared
//! between the foreground and the edge interrupt.

pub use embedded_hal::digital::PinState;

/// Identifier of a data pin, typically its GPIO number.
pub type PinId = u8;

/// Raw reading of a free-running counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ticks(pub u32);

/// Direction of the data pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// High impedance, the line is read.
    Input,
    /// The line is driven.
    Output,
}

/// Monotonic free-running counter with a known tick duration.
///
/// Counters are allowed to wrap; [`elapsed_micros`](TimeSource::elapsed_micros)
/// must use wrapping arithmetic. Spans handled by the driver never exceed a
/// few hundred milliseconds.
pub trait TimeSource {
    /// Current counter value.
    fn now(&self) -> Ticks;

    /// Microseconds between two readings, `to` taken after `from`.
    fn elapsed_micros(&self, from: Ticks, to: Ticks) -> u32;

    /// Busy-wait until `micros` have passed since `start`.
    ///
    /// Deadlines are measured from a fixed start so consecutive waits do not
    /// accumulate drift.
    fn delay_until(&self, start: Ticks, micros: u32) {
        while self.elapsed_micros(start, self.now()) < micros {
            core::hint::spin_loop();
        }
    }

    /// Busy-wait for `micros` from now.
    fn delay_micros(&self, micros: u32) {
        let start = self.now();
        self.delay_until(start, micros);
    }
}

/// Electrical control of SDI-12 data pins.
pub trait LineDriver {
    /// Switch the pin between input and output.
    fn set_mode(&self, pin: PinId, mode: PinMode);

    /// Drive the pin level. Only meaningful in [`PinMode::Output`].
    fn write(&self, pin: PinId, level: PinState);

    /// Sample the pin level.
    fn read(&self, pin: PinId) -> PinState;

    /// Arm or disarm the pin-change interrupt that feeds
    /// [`Registry::handle_interrupt`](crate::Registry::handle_interrupt).
    fn set_edge_interrupt(&self, pin: PinId, enabled: bool);
}

/// Everything the bus needs from a board.
pub trait Hardware: LineDriver + TimeSource {}

impl<T: LineDriver + TimeSource> Hardware for T {}
