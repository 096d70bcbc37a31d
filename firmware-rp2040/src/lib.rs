//! SDI-12 data recorder for RP2040.
//!
//! Board glue around [`sdi12_core`]: the data-line driver, the edge routing
//! loop, and the measurement sequence the recorder runs against each sensor.
//!
//! # Hardware Configuration
//!
//! | Function  | GPIO | Description |
//! |-----------|------|-------------|
//! | SDI-12    | 15   | Data line (through a level shifter to 5 V) |
//!
//! # Architecture
//!
//! - **Edge task** (interrupt executor, high priority): waits for every
//!   change on the data pin and feeds it to [`SDI12`]
//! - **Recorder** (thread executor): issues commands and reads replies
//!   through an [`Sdi12Bus`]
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)
//! - **`ignore-parity`**: Do not flag parity failures
//!
//! # Re-exports
//!
//! This crate re-exports the bus API from [`sdi12_core`] for convenience.

#![no_std]

pub mod line;
pub mod recorder;

use embedded_hal_async::digital::Wait;

pub use line::Rp2040Line;
pub use recorder::{measure, RecordError, MAX_VALUES};
pub use sdi12_core::{
    Address, BusError, Config, LineState, PinId, ReadError, Registry, Sdi12Bus,
};

/// GPIO number of the SDI-12 data line.
pub const DATA_PIN: PinId = 15;

/// The board's single SDI-12 interrupt source.
pub static SDI12: Registry<Rp2040Line> = Registry::new(Rp2040Line::new());

/// Bus instance type used by the recorder.
pub type Bus = Sdi12Bus<'static, Rp2040Line>;

/// Forward every change on `pin` to the registry while it is armed.
///
/// Run this from a high-priority executor; the decoder tolerates up to
/// half a bit (~400 us) of latency between the edge and this loop.
pub async fn route_edges<P: Wait>(pin: &mut P, id: PinId) -> ! {
    loop {
        if pin.wait_for_any_edge().await.is_err() {
            continue;
        }
        if SDI12.hardware().is_armed(id) {
            SDI12.handle_interrupt();
        }
    }
}
