//! Instance arbitration and interrupt routing.
//!
//! All bus instances on a board share one pin-change interrupt, one decoder
//! and one receive buffer. The [`Registry`] owns those and records which
//! instance is active; [`Registry::handle_interrupt`] is the only entry
//! point the board's edge interrupt needs to call.
//!
//! A registry is usually a `static`:
//!
//! ```ignore
//! static SDI12: Registry<BoardLine> = Registry::new(BoardLine::new());
//!
//! // in the pin-change interrupt
//! SDI12.handle_interrupt();
//! ```

use core::cell::RefCell;

use critical_section::Mutex;
use portable_atomic::{AtomicU32, AtomicU8, Ordering};

use crate::buffer::{RxBuffer, DEFAULT_BUFFER_SIZE};
use crate::decoder::{BitDecoder, Decoded};
use crate::error::BusError;
use crate::hal::{Hardware, PinId};

/// Maximum live bus instances per registry.
pub const MAX_INSTANCES: usize = 32;

/// Index of an instance within its registry.
pub(crate) type SlotId = u8;

const NO_SLOT: u8 = 0;
const NO_PIN: u8 = u8::MAX;

/// Sticky per-instance conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flag {
    Overflow,
    Parity,
    Break,
}

/// Shared state of every bus instance on one interrupt source.
pub struct Registry<H, const N: usize = DEFAULT_BUFFER_SIZE> {
    hw: H,
    check_parity: bool,
    /// Active slot + 1, or `NO_SLOT`.
    active: AtomicU8,
    active_pin: AtomicU8,
    allocated: AtomicU32,
    overflow: AtomicU32,
    parity: AtomicU32,
    breaks: AtomicU32,
    decoder: Mutex<RefCell<BitDecoder>>,
    buffer: RxBuffer<N>,
}

impl<H: Hardware, const N: usize> Registry<H, N> {
    /// Create a registry over `hw`.
    ///
    /// Parity is checked unless the `ignore-parity` feature is enabled.
    pub const fn new(hw: H) -> Self {
        Self::with_parity_check(hw, cfg!(not(feature = "ignore-parity")))
    }

    /// Create a registry with explicit parity checking.
    pub const fn with_parity_check(hw: H, check_parity: bool) -> Self {
        Self {
            hw,
            check_parity,
            active: AtomicU8::new(NO_SLOT),
            active_pin: AtomicU8::new(NO_PIN),
            allocated: AtomicU32::new(0),
            overflow: AtomicU32::new(0),
            parity: AtomicU32::new(0),
            breaks: AtomicU32::new(0),
            decoder: Mutex::new(RefCell::new(BitDecoder::new())),
            buffer: RxBuffer::new(),
        }
    }

    /// The board hardware.
    #[inline]
    pub fn hardware(&self) -> &H {
        &self.hw
    }

    /// The shared receive buffer.
    #[inline]
    pub fn buffer(&self) -> &RxBuffer<N> {
        &self.buffer
    }

    /// Pin of the active instance, if any instance is active and has a pin.
    pub fn active_pin(&self) -> Option<PinId> {
        if self.active.load(Ordering::Acquire) == NO_SLOT {
            return None;
        }
        match self.active_pin.load(Ordering::Acquire) {
            NO_PIN => None,
            pin => Some(pin),
        }
    }

    /// Number of live instances.
    pub fn instances(&self) -> usize {
        self.allocated.load(Ordering::Acquire).count_ones() as usize
    }

    /// Pin-change interrupt entry point.
    ///
    /// Timestamps the edge, samples the line and advances the decoder of the
    /// active instance. Returns immediately when no instance is active.
    pub fn handle_interrupt(&self) {
        let slot = self.active.load(Ordering::Acquire);
        if slot == NO_SLOT {
            return;
        }
        let pin = self.active_pin.load(Ordering::Acquire);
        if pin == NO_PIN {
            return;
        }
        let bit = 1u32 << (slot - 1);

        let now = self.hw.now();
        let level = self.hw.read(pin);
        let decoded = critical_section::with(|cs| {
            self.decoder
                .borrow_ref_mut(cs)
                .on_edge(&self.hw, now, level)
        });

        match decoded {
            Some(Decoded::Char { byte, parity_ok }) => {
                if self.check_parity && !parity_ok {
                    self.parity.fetch_or(bit, Ordering::AcqRel);
                }
                if self.buffer.push(byte).is_err() {
                    self.overflow.fetch_or(bit, Ordering::AcqRel);
                }
            }
            Some(Decoded::Break) => {
                trace!("break on pin {}", pin);
                self.breaks.fetch_or(bit, Ordering::AcqRel);
            }
            None => {}
        }
    }

    pub(crate) fn allocate(&self) -> Result<SlotId, BusError> {
        self.allocated
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                let free = (!used).trailing_zeros() as usize;
                (free < MAX_INSTANCES).then(|| used | (1 << free))
            })
            .map(|used| (!used).trailing_zeros() as SlotId)
            .map_err(|_| BusError::NoFreeSlot)
    }

    pub(crate) fn release(&self, slot: SlotId) {
        self.demote(slot);
        let mask = !(1u32 << slot);
        self.overflow.fetch_and(mask, Ordering::AcqRel);
        self.parity.fetch_and(mask, Ordering::AcqRel);
        self.breaks.fetch_and(mask, Ordering::AcqRel);
        self.allocated.fetch_and(mask, Ordering::AcqRel);
    }

    /// Make `slot` the active instance. `false` if it already was.
    pub(crate) fn promote(&self, slot: SlotId, pin: Option<PinId>) -> bool {
        critical_section::with(|cs| {
            if self.active.load(Ordering::Acquire) == slot + 1 {
                return false;
            }
            self.decoder.borrow_ref_mut(cs).reset();
            self.active_pin.store(pin.unwrap_or(NO_PIN), Ordering::Release);
            self.active.store(slot + 1, Ordering::Release);
            true
        })
    }

    /// Clear the active instance if it is `slot`.
    pub(crate) fn demote(&self, slot: SlotId) -> bool {
        self.active
            .compare_exchange(slot + 1, NO_SLOT, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    #[inline]
    pub(crate) fn is_active(&self, slot: SlotId) -> bool {
        self.active.load(Ordering::Acquire) == slot + 1
    }

    /// Follow a pin change of the active instance.
    pub(crate) fn rebind(&self, slot: SlotId, pin: Option<PinId>) {
        critical_section::with(|cs| {
            if self.is_active(slot) {
                self.decoder.borrow_ref_mut(cs).reset();
                self.active_pin.store(pin.unwrap_or(NO_PIN), Ordering::Release);
            }
        });
    }

    /// Drop a partial character before the line is listened to again.
    pub(crate) fn reset_decoder(&self) {
        critical_section::with(|cs| self.decoder.borrow_ref_mut(cs).reset());
    }

    pub(crate) fn flag(&self, flag: Flag, slot: SlotId) -> bool {
        self.flag_word(flag).load(Ordering::Acquire) & (1 << slot) != 0
    }

    pub(crate) fn clear_flag(&self, flag: Flag, slot: SlotId) -> bool {
        self.flag_word(flag)
            .fetch_and(!(1 << slot), Ordering::AcqRel)
            & (1 << slot)
            != 0
    }

    fn flag_word(&self, flag: Flag) -> &AtomicU32 {
        match flag {
            Flag::Overflow => &self.overflow,
            Flag::Parity => &self.parity,
            Flag::Break => &self.breaks,
        }
    }
}
