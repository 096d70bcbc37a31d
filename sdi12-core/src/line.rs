//! Line states of an SDI-12 data pin.

use crate::hal::{LineDriver, PinId, PinMode, PinState};

/// What an instance is doing with its data pin.
///
/// | State        | Interrupts | Direction | Level |
/// |--------------|------------|-----------|-------|
/// | Disabled     | off        | input     | -     |
/// | Enabled      | off        | input     | -     |
/// | Holding      | off        | output    | low   |
/// | Transmitting | off        | output    | varies|
/// | Listening    | on         | input     | -     |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineState {
    /// Pin released, instance not in use.
    #[default]
    Disabled,
    /// Pin released, instance started.
    Enabled,
    /// Line held in marking so no sensor sees a spurious start bit.
    Holding,
    /// The transmitter owns the line.
    Transmitting,
    /// Edges are decoded into the receive buffer.
    Listening,
}

impl LineState {
    /// Whether the pin-change interrupt is armed in this state.
    #[inline]
    #[must_use]
    pub const fn interrupts_enabled(self) -> bool {
        matches!(self, LineState::Listening)
    }

    /// Pin direction in this state.
    #[inline]
    #[must_use]
    pub const fn direction(self) -> PinMode {
        match self {
            LineState::Holding | LineState::Transmitting => PinMode::Output,
            _ => PinMode::Input,
        }
    }

    /// Configure `pin` for this state.
    ///
    /// The interrupt is disarmed before anything else changes, and armed
    /// only after the pin is an input again.
    pub(crate) fn apply<D: LineDriver + ?Sized>(self, driver: &D, pin: PinId) {
        if !self.interrupts_enabled() {
            driver.set_edge_interrupt(pin, false);
        }
        match self {
            LineState::Disabled | LineState::Enabled => {
                driver.write(pin, PinState::Low);
                driver.set_mode(pin, PinMode::Input);
            }
            LineState::Holding => {
                driver.write(pin, PinState::Low);
                driver.set_mode(pin, PinMode::Output);
            }
            LineState::Transmitting => {
                driver.set_mode(pin, PinMode::Output);
            }
            LineState::Listening => {
                driver.write(pin, PinState::Low);
                driver.set_mode(pin, PinMode::Input);
                driver.set_edge_interrupt(pin, true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::cell::RefCell;
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Mode(PinMode),
        Write(PinState),
        Irq(bool),
    }

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<Call>>,
    }

    impl LineDriver for Recorder {
        fn set_mode(&self, _pin: PinId, mode: PinMode) {
            self.calls.borrow_mut().push(Call::Mode(mode));
        }
        fn write(&self, _pin: PinId, level: PinState) {
            self.calls.borrow_mut().push(Call::Write(level));
        }
        fn read(&self, _pin: PinId) -> PinState {
            PinState::Low
        }
        fn set_edge_interrupt(&self, _pin: PinId, enabled: bool) {
            self.calls.borrow_mut().push(Call::Irq(enabled));
        }
    }

    fn calls_for(state: LineState) -> Vec<Call> {
        let driver = Recorder::default();
        state.apply(&driver, 4);
        driver.calls.into_inner()
    }

    #[test]
    fn test_interrupt_disarmed_first() {
        for state in [
            LineState::Disabled,
            LineState::Enabled,
            LineState::Holding,
            LineState::Transmitting,
        ] {
            let calls = calls_for(state);
            assert_eq!(calls[0], Call::Irq(false), "{:?}", state);
            assert!(!calls.contains(&Call::Irq(true)));
        }
    }

    #[test]
    fn test_holding_drives_marking() {
        assert_eq!(
            calls_for(LineState::Holding),
            [
                Call::Irq(false),
                Call::Write(PinState::Low),
                Call::Mode(PinMode::Output)
            ]
        );
    }

    #[test]
    fn test_listening_arms_last() {
        let calls = calls_for(LineState::Listening);
        assert_eq!(calls.last(), Some(&Call::Irq(true)));
        assert!(calls.contains(&Call::Mode(PinMode::Input)));
        assert!(!calls.contains(&Call::Irq(false)));
    }

    #[test]
    fn test_state_table() {
        assert!(LineState::Listening.interrupts_enabled());
        assert!(!LineState::Holding.interrupts_enabled());
        assert_eq!(LineState::Holding.direction(), PinMode::Output);
        assert_eq!(LineState::Transmitting.direction(), PinMode::Output);
        assert_eq!(LineState::Listening.direction(), PinMode::Input);
        assert_eq!(LineState::default(), LineState::Disabled);
    }
}
