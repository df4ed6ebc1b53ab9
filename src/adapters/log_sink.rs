//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).  Invalid readings are
//! printed as `--`, never as the zero the radio sends.

use core::fmt;

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::plausibility::Measurement;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

/// `Display` wrapper: value with `precision` decimals, or `--`.
struct Shown<T>(Measurement<T>, usize);

impl<T: Copy + fmt::Display> fmt::Display for Shown<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Measurement::Valid(v) => write!(f, "{:.*}", self.1, v),
            Measurement::Invalid => f.write_str("--"),
        }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | HR={}bpm | SpO2={}% | T={}\u{00b0}C",
                    Shown(t.heart_rate, 0),
                    Shown(t.spo2, 0),
                    Shown(t.temperature_c, 2),
                );
            }
            AppEvent::LinkStateChanged { from, to } => {
                info!("LINK | {:?} -> {:?}", from, to);
            }
            // Availability already logs these transitions at a level that
            // matches the cause (bus faults warn, implausible-only flaps stay
            // at debug).
            AppEvent::SensorOnline(id) => {
                debug!("SENSOR | {} online", id.name());
            }
            AppEvent::SensorMissing(id) => {
                warn!("SENSOR | {} not detected, sending fallback values", id.name());
            }
            AppEvent::SensorDegraded(id) => {
                debug!("SENSOR | {} degraded, re-probing", id.name());
            }
            AppEvent::Started { ppg, temperature } => {
                info!(
                    "START | ppg={} temperature={}",
                    if *ppg { "OK" } else { "MISSING" },
                    if *temperature { "OK" } else { "MISSING" },
                );
            }
        }
    }
}
