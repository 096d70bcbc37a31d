//! SDI-12 data line on RP2040 GPIO.
//!
//! The pin is switched and driven through the SIO block directly so the
//! transmitter can toggle it from inside a critical section without going
//! through a pin driver it does not own. Time comes from the embassy time
//! driver (1 MHz on RP2040).
//!
//! Edge interrupts are not wired to the GPIO block here: the edge task
//! waits on every pin change and consults [`Rp2040Line::is_armed`] before
//! calling into the registry.

use embassy_rp::pac;
use embassy_time::{Duration, Instant};
use portable_atomic::{AtomicU32, Ordering};
use sdi12_core::{LineDriver, PinId, PinMode, PinState, Ticks, TimeSource};

/// RP2040 implementation of the driver's hardware seams. Bank 0 only.
pub struct Rp2040Line {
    armed: AtomicU32,
}

impl Rp2040Line {
    pub const fn new() -> Self {
        Self {
            armed: AtomicU32::new(0),
        }
    }

    /// Whether edges on `pin` should reach the decoder.
    #[inline]
    pub fn is_armed(&self, pin: PinId) -> bool {
        self.armed.load(Ordering::Acquire) & mask(pin) != 0
    }
}

impl Default for Rp2040Line {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
const fn mask(pin: PinId) -> u32 {
    1 << pin
}

impl TimeSource for Rp2040Line {
    fn now(&self) -> Ticks {
        // the 32-bit wrap every ~71 minutes is handled by elapsed_micros
        Ticks(Instant::now().as_ticks() as u32)
    }

    fn elapsed_micros(&self, from: Ticks, to: Ticks) -> u32 {
        let ticks = u64::from(to.0.wrapping_sub(from.0));
        Duration::from_ticks(ticks).as_micros() as u32
    }
}

impl LineDriver for Rp2040Line {
    fn set_mode(&self, pin: PinId, mode: PinMode) {
        let oe = pac::SIO.gpio_oe(0);
        match mode {
            PinMode::Output => oe.value_set().write_value(mask(pin)),
            PinMode::Input => oe.value_clr().write_value(mask(pin)),
        }
    }

    fn write(&self, pin: PinId, level: PinState) {
        let out = pac::SIO.gpio_out(0);
        match level {
            PinState::High => out.value_set().write_value(mask(pin)),
            PinState::Low => out.value_clr().write_value(mask(pin)),
        }
    }

    fn read(&self, pin: PinId) -> PinState {
        PinState::from(pac::SIO.gpio_in(0).read() & mask(pin) != 0)
    }

    fn set_edge_interrupt(&self, pin: PinId, enabled: bool) {
        if enabled {
            self.armed.fetch_or(mask(pin), Ordering::AcqRel);
        } else {
            self.armed.fetch_and(!mask(pin), Ordering::AcqRel);
        }
    }
}
