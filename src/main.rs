//! GoodBoy Firmware: Main Entry Point
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  ControlApi ──▶ DispenseAdmission        WifiAdapter         │
//! │  (HTTP POST)        │ enqueue             (Connectivity)     │
//! │                     ▼                          ▲             │
//! │  ──────────────── Port Trait Boundary ─────────┼─────────    │
//! │                                                │             │
//! │  ┌──────────────────────┐    ┌─────────────────┴──────┐      │
//! │  │ DispenseCoordinator  │    │  ReconnectSupervisor    │      │
//! │  │   + DispenseWorker ──┼──▶ │  (main loop, 20 ms)     │      │
//! │  │   (APP core)         │    └────────────────────────┘      │
//! │  └──────────┬───────────┘                                    │
//! │             ▼                                                │
//! │  HalfStepSequencer (4 × PinDriver + Ets)    StatusBlinker    │
//! │                                             TimeSync (SNTP)  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{AnyOutputPin, Output, OutputPin, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;
use log::{debug, info, warn};

use goodboy::adapters::control_api;
use goodboy::adapters::device_id;
use goodboy::adapters::log_sink::LogEventSink;
use goodboy::adapters::nvs::NvsAdapter;
use goodboy::adapters::sntp::TimeSync;
use goodboy::adapters::time::SystemClock;
use goodboy::adapters::wifi::{self, WifiAdapter};
use goodboy::app::admission::DispenseAdmission;
use goodboy::app::connectivity::{ReconnectSupervisor, RetryPolicy};
use goodboy::app::coordinator::{DispenseCoordinator, DispenseWorker};
use goodboy::app::events::AppEvent;
use goodboy::app::ports::{Clock, ConnectivityPort, EventSink};
use goodboy::config::DispenserConfig;
use goodboy::drivers::status_led::StatusBlinker;
use goodboy::drivers::stepper::HalfStepSequencer;
use goodboy::drivers::task_pin::{Core, spawn_on_core};
use goodboy::pins;

const SUPERVISOR_POLL_MS: u32 = 20;
const BLINK_TICK_MS: u32 = 50;
const HOUSEKEEPING_INTERVAL_MS: u64 = 5_000;

type OutPin = PinDriver<'static, AnyOutputPin, Output>;

/// Drive `pin` as an output, checking it is the GPIO `pins` assigns.
fn output(pin: impl OutputPin, expected_gpio: i32) -> Result<OutPin> {
    anyhow::ensure!(
        pin.pin() == expected_gpio,
        "GPIO{} wired where pins.rs expects GPIO{}",
        pin.pin(),
        expected_gpio
    );
    Ok(PinDriver::output(pin.downgrade_output())?)
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  GoodBoy v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    // ── 2. Config from NVS (or defaults) ──────────────────────
    let config = match NvsAdapter::new(nvs_partition.clone()) {
        Ok(nvs) => nvs.load_or_default(),
        Err(e) => {
            warn!("NVS unavailable ({}), running with defaults", e);
            DispenserConfig::default()
        }
    };
    log::set_max_level(config.log_level.into());

    let mac = device_id::read_mac();
    let name = device_id::resolve_device_name(&config, &mac);
    info!("Device: {} (log level {:?})", name, config.log_level);

    // ── 3. Actuator + dispense worker (APP core) ──────────────
    let gpio = peripherals.pins;
    let coils = [
        output(gpio.gpio19, pins::STEPPER_IN1_GPIO)?,
        output(gpio.gpio18, pins::STEPPER_IN2_GPIO)?,
        output(gpio.gpio5, pins::STEPPER_IN3_GPIO)?,
        output(gpio.gpio17, pins::STEPPER_IN4_GPIO)?,
    ];
    let sequencer = HalfStepSequencer::new(coils, Ets, config.inter_step_delay_us);

    let coordinator = Arc::new(DispenseCoordinator::from_config(&config));
    let worker = DispenseWorker::new(
        Arc::clone(&coordinator),
        sequencer,
        SystemClock::new(),
        LogEventSink::new(),
        &config,
    );
    spawn_on_core(Core::App, 5, 8, "dispense\0", move || worker.run())?;

    // ── 4. Wi-Fi + reconnect supervisor ───────────────────────
    let driver = EspWifi::new(peripherals.modem, sysloop, Some(nvs_partition))?;
    let (ssid, password) = wifi::select_credentials(&config, wifi::build_time_credentials());
    let link = WifiAdapter::new(driver, ssid, password).map_err(goodboy::error::Error::from)?;
    let mut policy = RetryPolicy::from_config(&config);
    policy.set_seed(device_id::backoff_seed(&mac));
    let mut supervisor = ReconnectSupervisor::new(link, policy);

    // ── 5. Status LED (PRO core) ──────────────────────────────
    let link_up = Arc::new(AtomicBool::new(false));
    let mut blinker = StatusBlinker::new(output(gpio.gpio2, pins::STATUS_LED_GPIO)?);
    let blink_link_up = Arc::clone(&link_up);
    spawn_on_core(Core::Pro, 2, 4, "blink\0", move || {
        let mut clock = SystemClock::new();
        loop {
            blinker.tick(clock.now_ms(), blink_link_up.load(Ordering::Relaxed));
            clock.sleep_ms(BLINK_TICK_MS);
        }
    })?;

    // ── 6. Control endpoint ───────────────────────────────────
    let _server = control_api::start(DispenseAdmission::new(Arc::clone(&coordinator), &config))?;

    info!("System ready. Entering supervisor loop.");

    // ── 7. Supervisor loop ────────────────────────────────────
    let mut clock = SystemClock::new();
    let mut sink = LogEventSink::new();
    let mut time_sync = TimeSync::new();
    let mut last_housekeeping = 0u64;

    loop {
        let now = clock.now_ms();

        if let Some(event) = supervisor.poll(now) {
            time_sync.on_link_event(&event);
            sink.emit(&AppEvent::Link(event));
        }
        link_up.store(supervisor.is_up(), Ordering::Relaxed);

        if now.saturating_sub(last_housekeeping) >= HOUSEKEEPING_INTERVAL_MS {
            last_housekeeping = now;
            // SAFETY: reads a heap statistic; no preconditions.
            let free_heap = unsafe { esp_idf_svc::sys::esp_get_free_heap_size() };
            let rssi = supervisor.link().rssi();
            let unix_s = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs());
            let synced = time_sync.poll(unix_s);
            debug!(
                "HK | heap={}B link={} time={} queue={}/{} dispatched={} dropped={}",
                free_heap,
                rssi.map_or_else(|| "disconnected".into(), |dbm| format!("{dbm}dBm")),
                if synced { "synced" } else { "unsynced" },
                coordinator.len(),
                coordinator.capacity(),
                coordinator.dispatched_total(),
                coordinator.dropped_total(),
            );
        }

        clock.sleep_ms(SUPERVISOR_POLL_MS);
    }
}
