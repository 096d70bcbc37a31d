//! Measurement sequence run against one sensor.
//!
//! `aMC!` starts a measurement with CRC-protected data, the reply `atttn`
//! says how many seconds to wait and how many values to expect, then
//! `aD0!`, `aD1!`, ... collect the values until all have arrived.

use defmt::{debug, warn};
use embassy_time::Timer;
use heapless::Vec;
use sdi12_core::{Address, BusError, Hardware, ReadError, Sdi12Bus};
use sdi12_proto::{split_crc, values, verify_crc, MessageError, MAX_DATA_LEN};

/// Most values an `aM!` measurement returns.
pub const MAX_VALUES: usize = 9;

/// Send attempts per data command before giving up on a bad CRC.
const CRC_RETRIES: usize = 3;

/// Error type for a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum RecordError {
    /// Bus could not transmit.
    Bus(BusError),
    /// Reply missing or too long.
    Read(ReadError),
    /// A value field is malformed.
    Message(MessageError),
    /// Reply from another address or in an unexpected layout.
    UnexpectedReply,
    /// Every attempt came back with a CRC mismatch.
    Crc,
}

impl From<BusError> for RecordError {
    fn from(err: BusError) -> Self {
        RecordError::Bus(err)
    }
}

impl From<ReadError> for RecordError {
    fn from(err: ReadError) -> Self {
        RecordError::Read(err)
    }
}

impl From<MessageError> for RecordError {
    fn from(err: MessageError) -> Self {
        RecordError::Message(err)
    }
}

/// Take one measurement from the sensor at `address`.
pub async fn measure<H: Hardware, const N: usize>(
    bus: &mut Sdi12Bus<'_, H, N>,
    address: Address,
) -> Result<Vec<f32, MAX_VALUES>, RecordError> {
    let a = address.as_byte();

    bus.clear_buffer();
    bus.send_command(&[a, b'M', b'C', b'!'], 0)?;
    let reply = bus.read_line()?;
    let (seconds, count) =
        parse_measure_reply(&reply, address).ok_or(RecordError::UnexpectedReply)?;
    debug!("sensor {}: {} values in {} s", address, count, seconds);

    if seconds > 0 {
        Timer::after_secs(u64::from(seconds)).await;
    }
    // drop the service request, if the sensor sent one
    bus.clear_buffer();

    let mut out = Vec::new();
    for page in b'0'..=b'9' {
        if out.len() >= count {
            break;
        }
        let line = read_data_page(bus, a, page)?;
        let (content, _crc) = split_crc(&line).ok_or(RecordError::UnexpectedReply)?;
        if Address::of_response(content) != Some(address) {
            return Err(RecordError::UnexpectedReply);
        }
        if content.len() - 1 > MAX_DATA_LEN {
            return Err(RecordError::Message(MessageError::TooLong));
        }
        let before = out.len();
        for value in values(&content[1..]) {
            let value = parse_value(value?)?;
            if out.push(value).is_err() {
                break;
            }
        }
        if out.len() == before {
            // an empty page means the sensor has nothing more
            break;
        }
    }
    Ok(out)
}

/// Send `aDn!` until a reply with a valid CRC arrives.
fn read_data_page<H: Hardware, const N: usize>(
    bus: &mut Sdi12Bus<'_, H, N>,
    a: u8,
    page: u8,
) -> Result<sdi12_core::Line, RecordError> {
    for attempt in 0..CRC_RETRIES {
        bus.clear_buffer();
        bus.send_command(&[a, b'D', page, b'!'], 0)?;
        let line = bus.read_line()?;
        if verify_crc(&line) {
            return Ok(line);
        }
        warn!("CRC mismatch on D{}, attempt {}", page - b'0', attempt + 1);
    }
    Err(RecordError::Crc)
}

/// Split `atttn` into seconds to wait and the value count.
fn parse_measure_reply(reply: &[u8], address: Address) -> Option<(u16, usize)> {
    let (&first, rest) = reply.split_first()?;
    if first != address.as_byte() || rest.len() < 4 || !rest.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let (ttt, n) = rest.split_at(3);
    let count = usize::from(decimal(n));
    Some((decimal(ttt), count.min(MAX_VALUES)))
}

fn decimal(digits: &[u8]) -> u16 {
    digits
        .iter()
        .fold(0u16, |acc, &d| acc.saturating_mul(10).saturating_add(u16::from(d - b'0')))
}

fn parse_value(value: &[u8]) -> Result<f32, RecordError> {
    core::str::from_utf8(value)
        .ok()
        .and_then(|s| s.parse::<f32>().ok())
        .ok_or(RecordError::Message(MessageError::InvalidValue))
}
