//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ TelemetryService (domain)
//! ```
//!
//! Driven adapters (sensor drivers, estimation routine, radio, event sinks)
//! implement these traits.  The [`TelemetryService`](super::service::TelemetryService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.

use crate::error::{CommsError, SensorError};
use crate::sensors::buffer::PpgSample;
use crate::vitals::RawVitals;

use super::telemetry::TelemetryChannel;

// ───────────────────────────────────────────────────────────────
// Sensor ports (driven adapters: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// PPG front end: probe/configure, then pop one sample pair per ready event.
pub trait PpgSensorPort {
    /// Detect and configure the sensor.  `Ok` means it is ready to sample.
    fn probe_ppg(&mut self) -> Result<(), SensorError>;

    /// Pop the next sample pair if one is ready.
    fn poll_sample(&mut self) -> Result<Option<PpgSample>, SensorError>;
}

/// Temperature sensor: probe/configure, then instantaneous reads.
pub trait TemperatureSensorPort {
    fn probe_temperature(&mut self) -> Result<(), SensorError>;

    fn read_celsius(&mut self) -> Result<f32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Estimation port
// ───────────────────────────────────────────────────────────────

/// HR/SpO2 estimation routine over one paired intensity window.
///
/// Implementations must be pure: same window in, same output out.  They
/// report their own validity flags; range gating happens in the caller.
pub trait VitalsAlgorithm {
    fn estimate(&self, infrared: &[u32], red: &[u32]) -> RawVitals;
}

// ───────────────────────────────────────────────────────────────
// Telemetry link port (driven adapter: domain → radio)
// ───────────────────────────────────────────────────────────────

/// The narrow slice of the BLE stack the pipeline needs.
pub trait TelemetryLink {
    /// Number of currently connected peers.
    fn connected_count(&self) -> usize;

    /// Send `payload` as a notification on `channel`.
    fn notify(&mut self, channel: TelemetryChannel, payload: &[u8]) -> Result<(), CommsError>;

    /// (Re)start advertising so a new peer can discover the device.
    fn restart_advertising(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
