//! Simulated board for host tests.
//!
//! One data line, a microsecond clock that only moves when asked to, and a
//! trace of every level change the driver makes. Busy-waits jump the clock
//! straight to their deadline.

extern crate std;

use core::cell::{Cell, RefCell};
use std::vec::Vec;

use sdi12_proto::frame::frame_bits;
use sdi12_proto::timing::BIT_WIDTH_MICROS;

use crate::hal::{LineDriver, PinId, PinMode, PinState, Ticks, TimeSource};
use crate::registry::Registry;

/// A level change at a point in time.
pub(crate) type Edge = (u32, PinState);

pub(crate) struct SimLine {
    now: Cell<u32>,
    // one bit per pin
    outputs: Cell<u32>,
    high_out: Cell<u32>,
    high_in: Cell<u32>,
    armed: Cell<u32>,
    trace: RefCell<Vec<Edge>>,
}

#[inline]
const fn mask(pin: PinId) -> u32 {
    1 << pin
}

const fn level_of(word: u32, pin: PinId) -> PinState {
    if word & mask(pin) != 0 {
        PinState::High
    } else {
        PinState::Low
    }
}

const fn with_level(word: u32, pin: PinId, level: PinState) -> u32 {
    match level {
        PinState::High => word | mask(pin),
        PinState::Low => word & !mask(pin),
    }
}

impl SimLine {
    pub(crate) fn new() -> Self {
        Self {
            now: Cell::new(0),
            outputs: Cell::new(0),
            high_out: Cell::new(0),
            high_in: Cell::new(0),
            armed: Cell::new(0),
            trace: RefCell::new(Vec::new()),
        }
    }

    /// Move the clock forward; never backwards.
    pub(crate) fn advance_to(&self, at: u32) {
        if at > self.now.get() {
            self.now.set(at);
        }
    }

    /// Level an external device puts on every pin.
    pub(crate) fn set_input(&self, level: PinState) {
        self.high_in.set(match level {
            PinState::High => u32::MAX,
            PinState::Low => 0,
        });
    }

    /// Level an external device puts on `pin` only.
    pub(crate) fn set_input_on(&self, pin: PinId, level: PinState) {
        self.high_in.set(with_level(self.high_in.get(), pin, level));
    }

    pub(crate) fn mode(&self, pin: PinId) -> PinMode {
        if self.outputs.get() & mask(pin) != 0 {
            PinMode::Output
        } else {
            PinMode::Input
        }
    }

    pub(crate) fn output(&self, pin: PinId) -> PinState {
        level_of(self.high_out.get(), pin)
    }

    pub(crate) fn is_armed(&self, pin: PinId) -> bool {
        self.armed.get() & mask(pin) != 0
    }

    /// Whether any pin raises edge interrupts.
    pub(crate) fn irq_enabled(&self) -> bool {
        self.armed.get() != 0
    }

    /// Level changes driven since the last call.
    pub(crate) fn take_trace(&self) -> Vec<Edge> {
        self.trace.take()
    }
}

impl TimeSource for SimLine {
    fn now(&self) -> Ticks {
        Ticks(self.now.get())
    }

    fn elapsed_micros(&self, from: Ticks, to: Ticks) -> u32 {
        to.0.wrapping_sub(from.0)
    }

    fn delay_until(&self, start: Ticks, micros: u32) {
        self.advance_to(start.0 + micros);
    }
}

impl LineDriver for SimLine {
    fn set_mode(&self, pin: PinId, mode: PinMode) {
        let outputs = self.outputs.get();
        self.outputs.set(match mode {
            PinMode::Output => outputs | mask(pin),
            PinMode::Input => outputs & !mask(pin),
        });
    }

    fn write(&self, pin: PinId, level: PinState) {
        let before = self.high_out.get();
        if level_of(before, pin) != level {
            self.high_out.set(with_level(before, pin, level));
            self.trace.borrow_mut().push((self.now.get(), level));
        }
    }

    fn read(&self, pin: PinId) -> PinState {
        match self.mode(pin) {
            PinMode::Output => self.output(pin),
            PinMode::Input => level_of(self.high_in.get(), pin),
        }
    }

    fn set_edge_interrupt(&self, pin: PinId, enabled: bool) {
        let armed = self.armed.get();
        self.armed.set(if enabled {
            armed | mask(pin)
        } else {
            armed & !mask(pin)
        });
    }
}

/// Edges of back-to-back frames starting at `start`, line idle (LOW) before.
pub(crate) fn edges_for_bytes(bytes: &[u8], start: u32) -> Vec<Edge> {
    let bits: Vec<bool> = bytes.iter().flat_map(|&b| frame_bits(b)).collect();
    edges_for_bits(&bits, start)
}

/// Edges of an arbitrary logical bit sequence, one bit width each.
pub(crate) fn edges_for_bits(bits: &[bool], start: u32) -> Vec<Edge> {
    let mut level = PinState::Low;
    let mut edges = Vec::new();
    for (i, &bit) in bits.iter().enumerate() {
        let next = if bit { PinState::Low } else { PinState::High };
        if next != level {
            edges.push((start + i as u32 * BIT_WIDTH_MICROS, next));
            level = next;
        }
    }
    edges
}

/// Play edges onto every pin, raising the interrupt while any pin is armed.
pub(crate) fn replay<const N: usize>(registry: &Registry<SimLine, N>, edges: &[Edge]) {
    let hw = registry.hardware();
    for &(at, level) in edges {
        hw.advance_to(at);
        hw.set_input(level);
        if hw.irq_enabled() {
            registry.handle_interrupt();
        }
    }
}

/// Play edges onto `pin` alone, raising the interrupt only while it is armed.
pub(crate) fn replay_on<const N: usize>(
    registry: &Registry<SimLine, N>,
    pin: PinId,
    edges: &[Edge],
) {
    let hw = registry.hardware();
    for &(at, level) in edges {
        hw.advance_to(at);
        hw.set_input_on(pin, level);
        if hw.is_armed(pin) {
            registry.handle_interrupt();
        }
    }
}
