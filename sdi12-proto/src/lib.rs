//! SDI-12 wire vocabulary shared by the bus driver and its tests.
//!
//! This crate knows nothing about pins, timers or interrupts. It describes
//! what travels on the wire:
//!
//! - **Timing**: bit width, break and marking lengths ([`timing`])
//! - **Framing**: 1200 baud 7E1 character frames and even parity ([`frame`])
//! - **CRC**: the SDI-12 CRC16 and its 3-character ASCII encoding ([`crc`])
//! - **Addresses**: the single-character sensor address ([`address`])
//! - **Messages**: line endings, CRC fields, value fields and response
//!   assembly ([`message`])
//!
//! # Electrical Conventions
//!
//! SDI-12 uses inverse logic on a single data line:
//!
//! | Line level | Name     | Logical value |
//! |------------|----------|---------------|
//! | LOW        | marking  | 1 (idle)      |
//! | HIGH       | spacing  | 0             |
//!
//! A break is a spacing (HIGH) condition of at least 12 ms that wakes every
//! sensor on the bus.
//!
//! # Example
//!
//! ```
//! use sdi12_proto::{calculate_crc, crc_to_ascii, verify_crc};
//!
//! let crc = calculate_crc(b"0+3.14");
//! assert_eq!(&crc_to_ascii(crc), b"OqZ");
//! assert!(verify_crc(b"0+3.14OqZ\r\n"));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod address;
pub mod crc;
pub mod frame;
pub mod message;
pub mod timing;

pub use address::{Address, AddressError};
pub use crc::{calculate_crc, crc_to_ascii, verify_crc, Crc16Digest, CRC_ASCII_LEN};
pub use frame::{frame_bits, parity_even_bit, parity_matches, BITS_PER_FRAME};
pub use message::{
    build_response, split_crc, strip_line_ending, values, MessageError, Response, ValueIter,
    MAX_DATA_LEN, MAX_HV_DATA_LEN, MAX_RESPONSE_LEN, MAX_VALUE_DIGITS, MAX_VALUE_LEN,
};
pub use timing::{
    bit_periods, is_break, BIT_WIDTH_MICROS, LINE_BREAK_MICROS, LINE_MARK_MICROS,
    MAX_WAKE_DELAY_MS,
};
