//! Sensor addresses.

use core::fmt;

/// Error returned when a byte is not a valid SDI-12 address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AddressError(pub u8);

/// A single-character sensor address: `0-9`, `A-Z` or `a-z`.
///
/// Sixty-two addresses in total; `0` is the factory default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Address(u8);

impl Address {
    /// The factory default address.
    pub const DEFAULT: Address = Address(b'0');

    /// Validate `c` as an address.
    #[inline]
    pub const fn new(c: u8) -> Result<Self, AddressError> {
        if Self::is_valid(c) {
            Ok(Address(c))
        } else {
            Err(AddressError(c))
        }
    }

    /// Whether `c` is one of the 62 address characters.
    #[inline]
    #[must_use]
    pub const fn is_valid(c: u8) -> bool {
        c.is_ascii_alphanumeric()
    }

    /// The address as its ASCII byte.
    #[inline]
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self.0
    }

    /// The address leading a response line, if it is a valid one.
    #[inline]
    pub fn of_response(line: &[u8]) -> Option<Self> {
        line.first().and_then(|&c| Self::new(c).ok())
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for Address {
    type Error = AddressError;

    fn try_from(c: u8) -> Result<Self, Self::Error> {
        Self::new(c)
    }
}

impl TryFrom<char> for Address {
    type Error = AddressError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        if c.is_ascii() {
            Self::new(c as u8)
        } else {
            Err(AddressError(b'?'))
        }
    }
}

impl From<Address> for u8 {
    fn from(a: Address) -> u8 {
        a.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 as char)
    }
}
