//! The SDI-12 bus instance.
//!
//! An [`Sdi12Bus`] is one logical user of a data pin. Several instances may
//! exist on a [`Registry`]; only the active one receives. Sending a command
//! wakes the bus, transmits, and leaves the line listening for the answer,
//! which is then drained with the stream-style readers.
//!
//! # Example
//!
//! ```ignore
//! let mut bus = Sdi12Bus::new(&SDI12, Config::default())?;
//! bus.begin_with_pin(DATA_PIN);
//!
//! bus.send_command(b"0M!", 0)?;
//! let reply = bus.read_line()?;       // "00013"
//! ```

use heapless::Vec;
use sdi12_proto::message::{build_response, MAX_RESPONSE_LEN};

use crate::buffer::DEFAULT_BUFFER_SIZE;
use crate::config::Config;
use crate::error::{BusError, ReadError, RxError};
use crate::hal::{Hardware, PinId};
use crate::line::LineState;
use crate::registry::{Flag, Registry, SlotId};
use crate::transmit::Transmitter;

/// Polling step of the timed reads.
const POLL_MICROS: u32 = 100;

/// A received line, terminator removed.
pub type Line = Vec<u8, MAX_RESPONSE_LEN>;

/// One logical SDI-12 bus instance.
pub struct Sdi12Bus<'r, H: Hardware, const N: usize = DEFAULT_BUFFER_SIZE> {
    registry: &'r Registry<H, N>,
    slot: SlotId,
    pin: Option<PinId>,
    state: LineState,
    config: Config,
}

impl<'r, H: Hardware, const N: usize> Sdi12Bus<'r, H, N> {
    /// Register an instance without a data pin.
    pub fn new(registry: &'r Registry<H, N>, config: Config) -> Result<Self, BusError> {
        let slot = registry.allocate()?;
        debug!("bus instance {} created", slot);
        Ok(Self {
            registry,
            slot,
            pin: None,
            state: LineState::Disabled,
            config,
        })
    }

    /// Register an instance bound to `pin`.
    pub fn with_pin(
        registry: &'r Registry<H, N>,
        pin: PinId,
        config: Config,
    ) -> Result<Self, BusError> {
        let mut bus = Self::new(registry, config)?;
        bus.pin = Some(pin);
        Ok(bus)
    }

    /// Start the instance: make it active and hold the line in marking.
    pub fn begin(&mut self) {
        if self.pin.is_none() {
            warn!("begin on bus {} without a data pin", self.slot);
        }
        self.set_state(LineState::Enabled);
        self.registry.promote(self.slot, self.pin);
        self.set_state(LineState::Holding);
    }

    /// Bind `pin`, then [`begin`](Self::begin).
    pub fn begin_with_pin(&mut self, pin: PinId) {
        self.set_data_pin(pin);
        self.begin();
    }

    /// Release the pin and give up the active role.
    pub fn end(&mut self) {
        self.set_state(LineState::Disabled);
        self.registry.demote(self.slot);
    }

    /// Bind a different data pin.
    ///
    /// The previous pin is left as it is. If the instance is active, the
    /// interrupt routing follows the new pin.
    pub fn set_data_pin(&mut self, pin: PinId) {
        self.pin = Some(pin);
        self.registry.rebind(self.slot, self.pin);
    }

    /// The bound data pin.
    #[inline]
    pub fn data_pin(&self) -> Option<PinId> {
        self.pin
    }

    /// Make this the active instance and hold the line.
    ///
    /// Returns `false`, changing nothing, if it already was active. The
    /// previously active instance keeps its pin configuration; call
    /// [`force_hold`](Self::force_hold) on it first if it was listening.
    pub fn set_active(&mut self) -> bool {
        if !self.registry.promote(self.slot, self.pin) {
            return false;
        }
        self.set_state(LineState::Holding);
        true
    }

    /// Whether this instance receives the pin-change interrupts.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.registry.is_active(self.slot)
    }

    /// Current line state.
    #[inline]
    pub fn state(&self) -> LineState {
        self.state
    }

    /// The instance configuration.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Hold the line in marking, ignoring incoming edges.
    pub fn force_hold(&mut self) {
        self.set_state(LineState::Holding);
    }

    /// Release the line and decode incoming edges.
    pub fn force_listen(&mut self) {
        self.set_state(LineState::Listening);
    }

    /// Wake the bus and send a command, then listen for the reply.
    ///
    /// `cmd` is sent as is; SDI-12 commands end with `!` and carry no line
    /// terminator. The sensors get the longer of `extra_wake_ms` and the
    /// configured wake delay on top of the standard marking.
    pub fn send_command(&mut self, cmd: &[u8], extra_wake_ms: u8) -> Result<(), BusError> {
        let pin = self.require_pin()?;
        self.set_state(LineState::Transmitting);
        let tx = Transmitter::new(self.registry.hardware(), pin);
        tx.wake(extra_wake_ms.max(self.config.wake_delay_ms));
        tx.write_all(cmd);
        self.set_state(LineState::Listening);
        Ok(())
    }

    /// Send a response as a sensor would, then listen.
    ///
    /// The CRC is appended when `append_crc` is set and the message always
    /// ends in exactly one CR LF.
    pub fn send_response(&mut self, body: &[u8], append_crc: bool) -> Result<(), BusError> {
        let pin = self.require_pin()?;
        let message = build_response(body, append_crc)?;
        self.set_state(LineState::Transmitting);
        let tx = Transmitter::new(self.registry.hardware(), pin);
        tx.marking();
        tx.write_all(&message);
        self.set_state(LineState::Listening);
        Ok(())
    }

    /// Send one framed character with no wake or marking.
    pub fn write_byte(&mut self, byte: u8) -> Result<(), BusError> {
        let pin = self.require_pin()?;
        self.set_state(LineState::Transmitting);
        Transmitter::new(self.registry.hardware(), pin).write_char(byte);
        self.set_state(LineState::Listening);
        Ok(())
    }

    /// Number of unread characters.
    ///
    /// Fails while an overflow is unacknowledged. With a yield delay
    /// configured, an empty buffer is looked at again after the pause.
    pub fn available(&self) -> Result<usize, RxError> {
        if self.registry.flag(Flag::Overflow, self.slot) {
            return Err(RxError::BufferOverflow);
        }
        let buffer = self.registry.buffer();
        if buffer.is_empty() && self.config.yield_ms > 0 {
            self.registry
                .hardware()
                .delay_micros(self.config.yield_ms.saturating_mul(1_000));
        }
        Ok(buffer.len())
    }

    /// Next character without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.registry.buffer().peek()
    }

    /// Take the next character.
    #[inline]
    pub fn read(&mut self) -> Option<u8> {
        self.registry.buffer().pop()
    }

    /// Discard unread characters. The overflow flag is left alone.
    pub fn clear_buffer(&mut self) {
        self.registry.buffer().clear();
    }

    /// Acknowledge an overflow. Returns whether one was pending.
    pub fn clear_overflow(&mut self) -> bool {
        self.registry.clear_flag(Flag::Overflow, self.slot)
    }

    /// Whether a character arrived with bad parity since the last clear.
    pub fn parity_failed(&self) -> bool {
        self.registry.flag(Flag::Parity, self.slot)
    }

    pub fn clear_parity_failure(&mut self) {
        self.registry.clear_flag(Flag::Parity, self.slot);
    }

    /// Whether a break was seen since the last call; clears the flag.
    pub fn take_break(&mut self) -> bool {
        self.registry.clear_flag(Flag::Break, self.slot)
    }

    /// Take the next character, waiting up to the stream timeout.
    pub fn read_timed(&mut self) -> Option<u8> {
        let byte = self.peek_timed()?;
        self.read();
        Some(byte)
    }

    /// Read up to the next LF, waiting for each character.
    ///
    /// CR and LF are not part of the returned line.
    pub fn read_line(&mut self) -> Result<Line, ReadError> {
        let mut line = Line::new();
        loop {
            match self.read_timed().ok_or(ReadError::Timeout)? {
                b'\n' => return Ok(line),
                b'\r' => {}
                byte => line.push(byte).map_err(|_| ReadError::LineTooLong)?,
            }
        }
    }

    /// Parse an integer from the stream.
    ///
    /// An optional sign is taken only as the first character; parsing stops
    /// at the first non-digit, which stays unread. Returns the configured
    /// timeout value when no number starts within the stream timeout.
    pub fn parse_int(&mut self) -> i32 {
        match self.scan_number(false) {
            Some((value, _)) => value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
            None => self.config.timeout_value,
        }
    }

    /// Parse a decimal number from the stream.
    ///
    /// Like [`parse_int`](Self::parse_int), with one optional decimal point.
    pub fn parse_float(&mut self) -> f32 {
        match self.scan_number(true) {
            Some((value, decimals)) => {
                let mut divisor = 1.0f32;
                for _ in 0..decimals {
                    divisor *= 10.0;
                }
                value as f32 / divisor
            }
            None => self.config.timeout_value as f32,
        }
    }

    /// Change the parser timeout sentinel.
    pub fn set_timeout_value(&mut self, value: i32) {
        self.config.timeout_value = value;
    }

    fn require_pin(&self) -> Result<PinId, BusError> {
        self.pin.ok_or_else(|| {
            warn!("bus {} has no data pin", self.slot);
            BusError::NoDataPin
        })
    }

    fn set_state(&mut self, state: LineState) {
        self.state = state;
        let Some(pin) = self.pin else {
            return;
        };
        if state == LineState::Listening && self.is_active() {
            self.registry.reset_decoder();
        }
        state.apply(self.registry.hardware(), pin);
    }

    fn peek_timed(&self) -> Option<u8> {
        let hw = self.registry.hardware();
        let start = hw.now();
        let timeout = self.config.stream_timeout_ms.saturating_mul(1_000);
        loop {
            if let Some(byte) = self.peek() {
                return Some(byte);
            }
            if hw.elapsed_micros(start, hw.now()) >= timeout {
                return None;
            }
            hw.delay_micros(POLL_MICROS);
        }
    }

    /// Consume `[+-]digits[.digits]` and return the digits as an integer
    /// plus the count of fractional digits.
    fn scan_number(&mut self, fraction: bool) -> Option<(i64, u32)> {
        let first = self.peek_timed()?;
        let negative = match first {
            b'-' => true,
            b'+' | b'0'..=b'9' => false,
            b'.' if fraction => false,
            _ => return None,
        };
        if matches!(first, b'-' | b'+') {
            self.read();
        }

        let mut value: i64 = 0;
        let mut decimals = 0;
        let mut in_fraction = false;
        while let Some(c) = self.peek_timed() {
            match c {
                b'0'..=b'9' => {
                    value = value.saturating_mul(10).saturating_add(i64::from(c - b'0'));
                    if in_fraction {
                        decimals += 1;
                    }
                }
                b'.' if fraction && !in_fraction => in_fraction = true,
                _ => break,
            }
            self.read();
        }
        Some((if negative { -value } else { value }, decimals))
    }
}

impl<H: Hardware, const N: usize> Drop for Sdi12Bus<'_, H, N> {
    fn drop(&mut self) {
        if let Some(pin) = self.pin {
            LineState::Disabled.apply(self.registry.hardware(), pin);
        }
        self.registry.release(self.slot);
        debug!("bus instance {} dropped", self.slot);
    }
}
