//! Application service: the hexagonal core.
//!
//! [`TelemetryService`] owns the sample window, estimator, sensor
//! availability tracker, notification scheduler and connection lifecycle.
//! All I/O flows through port traits passed in at call sites, so the whole
//! pipeline runs against mock adapters in tests.
//!
//! ```text
//!  PpgSensorPort ─────────▶ ┌───────────────────────────────┐ ──▶ TelemetryLink
//!  TemperatureSensorPort ──▶│       TelemetryService        │
//!  LINK_EVENTS ────────────▶│ buffer · estimator · gates    │ ──▶ EventSink
//!                           │ availability · scheduler · FSM│
//!                           └───────────────────────────────┘
//! ```
//!
//! One [`tick`](TelemetryService::tick) runs:
//!
//! 0. drain queued link events into the lifecycle and apply its actions;
//! 1. pop a PPG sample if the sensor is available and one is ready;
//! 2. estimate HR/SpO2 if that sample completed a full window;
//! 3. read and gate the temperature if that sensor is available;
//! 4. notify all three channels if a round is due and a peer is connected;
//! 5. re-probe any sensor that is not available and whose timer elapsed.

use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::error::SensorError;
use crate::events::{LinkEvent, LinkEventChannel, drain_link_events};
use crate::fsm::StateId;
use crate::fsm::context::LinkActions;
use crate::fsm::lifecycle::ConnectionLifecycle;
use crate::plausibility::Measurement;
use crate::scheduler::NotificationScheduler;
use crate::sensors::SensorId;
use crate::sensors::availability::{ReadOutcome, SensorAvailability, SensorTransition};
use crate::sensors::buffer::SampleBuffer;
use crate::sensors::temperature::TemperatureReader;
use crate::vitals::{VitalEstimator, VitalReading};

use super::events::AppEvent;
use super::ports::{EventSink, PpgSensorPort, TelemetryLink, TemperatureSensorPort, VitalsAlgorithm};
use super::telemetry::{TelemetryChannel, TelemetryFrame};

// ───────────────────────────────────────────────────────────────
// TelemetryService
// ───────────────────────────────────────────────────────────────

pub struct TelemetryService<A: VitalsAlgorithm> {
    buffer: SampleBuffer,
    estimator: VitalEstimator<A>,
    temperature: TemperatureReader,
    availability: SensorAvailability,
    scheduler: NotificationScheduler,
    lifecycle: ConnectionLifecycle,
    vitals: VitalReading,
    temperature_c: Measurement<f32>,
}

impl<A: VitalsAlgorithm> TelemetryService<A> {
    /// Construct the service.  Does **not** touch hardware; call
    /// [`start`](Self::start) next.
    pub fn new(config: &SystemConfig, algorithm: A) -> Self {
        Self {
            buffer: SampleBuffer::new(),
            estimator: VitalEstimator::new(algorithm, config),
            temperature: TemperatureReader::new(config),
            availability: SensorAvailability::new(config),
            scheduler: NotificationScheduler::new(config),
            lifecycle: ConnectionLifecycle::new(config),
            vitals: VitalReading::default(),
            temperature_c: Measurement::Invalid,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Probe both sensors, announce what was found and start advertising.
    pub fn start(
        &mut self,
        now_ms: u64,
        hw: &mut (impl PpgSensorPort + TemperatureSensorPort),
        link: &mut impl TelemetryLink,
        sink: &mut impl EventSink,
    ) {
        for id in SensorId::ALL {
            let result = probe(hw, id);
            let online = self.availability.record_probe(id, result.is_ok(), now_ms);
            match result {
                Ok(()) => {
                    info!("{} detected", id.name());
                    if online.is_some() {
                        sink.emit(&AppEvent::SensorOnline(id));
                    }
                }
                Err(e) => {
                    warn!("{} not detected ({}), sending fallback values", id.name(), e);
                    sink.emit(&AppEvent::SensorMissing(id));
                }
            }
        }

        let actions = self.lifecycle.start();
        self.apply_link_actions(actions, link);

        sink.emit(&AppEvent::Started {
            ppg: self.availability.is_available(SensorId::Ppg),
            temperature: self.availability.is_available(SensorId::Temperature),
        });
        info!("TelemetryService started, waiting for a peer");
    }

    // ── Link events ───────────────────────────────────────────

    /// Feed one link event through the lifecycle and apply its actions.
    pub fn handle_link_event(
        &mut self,
        event: LinkEvent,
        link: &mut impl TelemetryLink,
        sink: &mut impl EventSink,
    ) {
        let from = self.lifecycle.state();
        let actions = self.lifecycle.on_event(event);
        self.apply_link_actions(actions, link);

        let to = self.lifecycle.state();
        if to != from {
            sink.emit(&AppEvent::LinkStateChanged { from, to });
        }
    }

    fn apply_link_actions(&mut self, actions: LinkActions, link: &mut impl TelemetryLink) {
        if actions.reset_buffer {
            self.reset_window();
        }
        if actions.restart_advertising {
            link.restart_advertising();
        }
    }

    fn reset_window(&mut self) {
        self.buffer.reset();
        self.vitals = VitalReading::default();
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one loop iteration.  Returns the frame if a notification round
    /// went out.
    pub fn tick(
        &mut self,
        now_ms: u64,
        events: &LinkEventChannel,
        hw: &mut (impl PpgSensorPort + TemperatureSensorPort),
        link: &mut impl TelemetryLink,
        sink: &mut impl EventSink,
    ) -> Option<TelemetryFrame> {
        // 0. Link events queued by the radio since the last tick
        drain_link_events(events, |event| self.handle_link_event(event, link, sink));

        // 1. Acquire
        let sampled = self.acquire_ppg(hw, sink);

        // 2. Estimate
        if !self.availability.is_available(SensorId::Ppg) {
            self.vitals = VitalReading::default();
        } else if sampled && self.buffer.is_filled() {
            self.vitals = self.estimator.estimate(&self.buffer);
        }

        // 3. Temperature
        self.temperature_c = if self.availability.is_available(SensorId::Temperature) {
            let (reading, outcome) = self.temperature.read(hw);
            if self.availability.record_read(SensorId::Temperature, outcome)
                == Some(SensorTransition::Degraded)
            {
                sink.emit(&AppEvent::SensorDegraded(SensorId::Temperature));
            }
            reading
        } else {
            Measurement::Invalid
        };

        // 4. Notify
        let frame = if self.scheduler.should_notify(now_ms, link.connected_count()) {
            let frame = self.frame();
            for channel in TelemetryChannel::ALL {
                if let Err(e) = link.notify(channel, &frame.payload(channel)) {
                    debug!("notify {:?} failed: {}", channel, e);
                }
            }
            sink.emit(&AppEvent::Telemetry(frame));
            Some(frame)
        } else {
            None
        };

        // 5. Re-probe
        self.reprobe(now_ms, hw, sink);

        frame
    }

    /// Pop at most one sample.  Returns `true` if one was pushed.
    fn acquire_ppg(&mut self, hw: &mut impl PpgSensorPort, sink: &mut impl EventSink) -> bool {
        if !self.availability.is_available(SensorId::Ppg) {
            return false;
        }
        match hw.poll_sample() {
            Ok(Some(sample)) => {
                self.availability.record_read(SensorId::Ppg, ReadOutcome::Good);
                self.buffer.push(sample);
                true
            }
            Ok(None) => false,
            Err(e) => {
                debug!("PPG read failed: {}", e);
                if self.availability.record_read(SensorId::Ppg, ReadOutcome::Failed)
                    == Some(SensorTransition::Degraded)
                {
                    self.reset_window();
                    sink.emit(&AppEvent::SensorDegraded(SensorId::Ppg));
                }
                false
            }
        }
    }

    fn reprobe(
        &mut self,
        now_ms: u64,
        hw: &mut (impl PpgSensorPort + TemperatureSensorPort),
        sink: &mut impl EventSink,
    ) {
        for id in SensorId::ALL {
            if !self.availability.due_for_reprobe(id, now_ms) {
                continue;
            }
            let result = probe(hw, id);
            if let Err(e) = result {
                debug!("{} re-probe failed: {}", id.name(), e);
            }
            if self.availability.record_probe(id, result.is_ok(), now_ms)
                == Some(SensorTransition::Online)
            {
                if id == SensorId::Ppg {
                    // Probing reconfigures the part and flushes its FIFO.
                    self.reset_window();
                }
                sink.emit(&AppEvent::SensorOnline(id));
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// The values the next notification round would carry.
    pub fn frame(&self) -> TelemetryFrame {
        TelemetryFrame {
            heart_rate: self.vitals.heart_rate,
            spo2: self.vitals.spo2,
            temperature_c: self.temperature_c,
        }
    }

    pub fn vitals(&self) -> VitalReading {
        self.vitals
    }

    pub fn temperature(&self) -> Measurement<f32> {
        self.temperature_c
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn availability(&self) -> &SensorAvailability {
        &self.availability
    }

    pub fn link_state(&self) -> StateId {
        self.lifecycle.state()
    }

    pub fn lifecycle(&self) -> &ConnectionLifecycle {
        &self.lifecycle
    }
}

fn probe(hw: &mut (impl PpgSensorPort + TemperatureSensorPort), id: SensorId) -> Result<(), SensorError> {
    match id {
        SensorId::Ppg => hw.probe_ppg(),
        SensorId::Temperature => hw.probe_temperature(),
    }
}
