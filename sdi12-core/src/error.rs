//! Error types for the bus driver.
//!
//! Nothing here is fatal: every error leaves the bus usable and the caller
//! decides whether to retry.

use sdi12_proto::MessageError;

/// Error type for bus control and transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// No data pin is bound to the instance.
    NoDataPin,
    /// Every registry slot is taken.
    NoFreeSlot,
    /// The outgoing message could not be assembled.
    Message(MessageError),
}

impl From<MessageError> for BusError {
    fn from(err: MessageError) -> Self {
        BusError::Message(err)
    }
}

/// Error type for the receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxError {
    /// Characters were dropped because the buffer was full.
    ///
    /// Reported until acknowledged with `clear_overflow()`.
    BufferOverflow,
}

/// Error type for line-oriented reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadError {
    /// No character arrived within the stream timeout.
    Timeout,
    /// The line did not fit the line buffer.
    LineTooLong,
}
