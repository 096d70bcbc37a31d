#![no_std]
#![no_main]

use defmt::{info, unwrap, warn};
use defmt_rtt as _;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::gpio::{Flex, Pull};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_time::Timer;
use sdi12_rp2040::{measure, route_edges, Address, Bus, Config, Sdi12Bus, DATA_PIN, SDI12};

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

/// Sensor addresses polled each round.
const SENSORS: &[u8] = b"01";

/// Time between measurement rounds.
const POLL_INTERVAL_SECS: u64 = 60;

/// Extra wake time for slow sensors, in milliseconds.
const WAKE_DELAY_MS: u8 = 10;

/// Executor for the edge task; preempts the busy-waiting recorder.
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("SDI-12 recorder starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- Data line ---
    // Flex hands the pad to SIO; the line driver takes it from there.
    let mut line = Flex::new(p.PIN_15);
    line.set_pull(Pull::None);
    line.set_as_input();

    interrupt::SWI_IRQ_1.set_priority(Priority::P1);
    let spawner_high = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    spawner_high.spawn(edge_task(line).unwrap());

    // --- Bus ---
    let config = Config::default().with_wake_delay(WAKE_DELAY_MS);
    let mut bus: Bus = unwrap!(Sdi12Bus::new(&SDI12, config));
    bus.begin_with_pin(DATA_PIN);

    info!("SDI-12 recorder initialized, polling {} sensors", SENSORS.len());

    loop {
        for &a in SENSORS {
            let Ok(address) = Address::new(a) else {
                warn!("skipping invalid address {=u8}", a);
                continue;
            };
            record(&mut bus, address).await;
        }
        bus.force_hold();
        Timer::after_secs(POLL_INTERVAL_SECS).await;
    }
}

async fn record(bus: &mut Bus, address: Address) {
    match measure(bus, address).await {
        Ok(values) => info!("sensor {}: {}", address, values.as_slice()),
        Err(e) => warn!("sensor {}: {:?}", address, e),
    }
    if bus.parity_failed() {
        warn!("parity errors on the bus");
        bus.clear_parity_failure();
    }
    if bus.clear_overflow() {
        warn!("receive buffer overflowed");
    }
}

/// Edge task - routes data-line changes into the decoder.
#[embassy_executor::task]
async fn edge_task(mut line: Flex<'static>) {
    route_edges(&mut line, DATA_PIN).await
}
