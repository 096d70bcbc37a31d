//! Platform-agnostic SDI-12 bus driver.
//!
//! A software UART for the single-wire, inverse-logic, 1200 baud SDI-12 bus,
//! built from nothing but pin-change interrupts and a free-running counter,
//! plus the line-state machine and the arbitration that lets several logical
//! bus instances share one interrupt source.
//!
//! # Overview
//!
//! - [`hal`]: Hardware seams ([`TimeSource`], [`LineDriver`])
//! - [`line`]: Line states and the pin setup each implies ([`LineState`])
//! - [`decoder`]: Edge-timestamp receiver ([`BitDecoder`])
//! - [`buffer`]: Shared receive ring ([`RxBuffer`])
//! - [`registry`]: Active-instance arbitration and the ISR entry point ([`Registry`])
//! - [`bus`]: The public bus API ([`Sdi12Bus`])
//!
//! Wire-level helpers (CRC, framing, message layout) live in [`sdi12_proto`]
//! and the most used ones are re-exported here.
//!
//! # Wiring a board
//!
//! Implement [`TimeSource`] and [`LineDriver`] for one type, put a
//! [`Registry`] over it in a `static`, and call
//! [`Registry::handle_interrupt`] from the pin-change interrupt of the data
//! pin. Everything else happens in the foreground through [`Sdi12Bus`].
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting and logging (for embedded targets)
//! - **`log`**: Log through the `log` facade
//! - **`ignore-parity`**: Registries created with [`Registry::new`] do not
//!   flag parity failures

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// must come first so the macros are visible in every module
#[macro_use]
mod fmt;

pub mod buffer;
pub mod bus;
pub mod config;
pub mod decoder;
pub mod error;
pub mod hal;
pub mod line;
pub mod registry;
mod transmit;

#[cfg(test)]
mod sim;

pub use buffer::{RxBuffer, DEFAULT_BUFFER_SIZE};
pub use bus::{Line, Sdi12Bus};
pub use config::{Config, DEFAULT_TIMEOUT_VALUE};
pub use decoder::{BitDecoder, Decoded};
pub use error::{BusError, ReadError, RxError};
pub use hal::{Hardware, LineDriver, PinId, PinMode, PinState, Ticks, TimeSource};
pub use line::LineState;
pub use registry::{Registry, MAX_INSTANCES};

pub use sdi12_proto::{calculate_crc, crc_to_ascii, verify_crc, Address};
