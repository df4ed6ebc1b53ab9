//! Outbound application events.
//!
//! The [`TelemetryService`](super::service::TelemetryService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them (serial log, test recorder).

use crate::fsm::StateId;
use crate::sensors::SensorId;

use super::telemetry::TelemetryFrame;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Startup probes done.  Carries which sensors answered.
    Started { ppg: bool, temperature: bool },

    /// A sensor was detected (startup probe or re-probe).
    SensorOnline(SensorId),

    /// The startup probe for a sensor failed; fallback values are sent.
    SensorMissing(SensorId),

    /// An available sensor produced too many faulty reads.
    SensorDegraded(SensorId),

    /// The connection lifecycle changed state.
    LinkStateChanged { from: StateId, to: StateId },

    /// One notification round went out.
    Telemetry(TelemetryFrame),
}
