//! SynkLinx firmware entry point
//!
//! Hexagonal architecture around a single cooperative loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter         BleTelemetryAdapter    LogEventSink   │
//! │  (PPG + Temperature)     (TelemetryLink)        (EventSink)    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            TelemetryService (pure logic)               │    │
//! │  │  Buffer · Estimator · Gates · Scheduler · Link FSM     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  LINK_EVENTS channel (radio callbacks → main loop)             │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::AnyIOPin;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::Hertz;
use log::{error, info, warn};

use synklinx::adapters::ble::BleTelemetryAdapter;
use synklinx::adapters::hardware::HardwareAdapter;
use synklinx::adapters::log_sink::LogEventSink;
use synklinx::adapters::time::uptime_ms;
use synklinx::app::service::TelemetryService;
use synklinx::config::SystemConfig;
use synklinx::events::LINK_EVENTS;
use synklinx::pins;
use synklinx::vitals::algorithm::PeakRatioAlgorithm;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SynkLinx v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Config (compiled-in defaults) ──────────────────────
    let config = SystemConfig::default();
    if let Err(e) = config.validate() {
        warn!("Default config rejected ({}), continuing anyway", e);
    }

    // ── 3. Sensor bus ─────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    // SAFETY: the pin numbers come from `pins.rs` and nothing else claims them.
    let (sda, scl) = unsafe {
        (
            AnyIOPin::new(pins::I2C_SDA_GPIO),
            AnyIOPin::new(pins::I2C_SCL_GPIO),
        )
    };
    let i2c_config = I2cConfig::new().baudrate(Hertz(pins::I2C_BAUDRATE_HZ));
    let i2c = I2cDriver::new(peripherals.i2c0, sda, scl, &i2c_config)?;
    let mut hw = HardwareAdapter::new(i2c);

    // ── 4. Radio ──────────────────────────────────────────────
    let mut ble = BleTelemetryAdapter::new(config.device_name.clone());
    if let Err(e) = ble.start() {
        // Without the radio there is nothing to report to.
        error!("BLE init failed: {}, halting", e);
        return Err(anyhow::anyhow!("BLE init failed: {}", e));
    }

    // ── 5. Domain core ────────────────────────────────────────
    let mut sink = LogEventSink::new();
    let algorithm = PeakRatioAlgorithm::new(config.ppg_sample_rate_hz);
    let mut service = TelemetryService::new(&config, algorithm);
    service.start(uptime_ms(), &mut hw, &mut ble, &mut sink);

    info!("System ready. Entering telemetry loop.");

    // ── 6. Telemetry loop ─────────────────────────────────────
    loop {
        service.tick(uptime_ms(), &LINK_EVENTS, &mut hw, &mut ble, &mut sink);
        FreeRtos::delay_ms(config.loop_delay_ms);
    }
}
