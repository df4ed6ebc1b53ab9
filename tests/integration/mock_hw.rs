//! Mock adapters for integration tests.
//!
//! `MockSensors` plays back a queue of PPG samples and a fixed temperature,
//! with switches for presence and fault injection.  `MockLink` records every
//! notification and advertising restart.  Neither touches real hardware.

use std::collections::VecDeque;

use synklinx::app::events::AppEvent;
use synklinx::app::ports::{EventSink, PpgSensorPort, TelemetryLink, TemperatureSensorPort};
use synklinx::app::telemetry::TelemetryChannel;
use synklinx::error::{CommsError, SensorError};
use synklinx::sensors::buffer::{PpgSample, WINDOW_LEN};

// ── Synthetic signals ─────────────────────────────────────────

/// A clean pulse: `period` samples per beat, IR 100000 ± 1000 and
/// red 50000 ± 240 (ratio of ratios 0.48).
pub fn pulse(period: usize, count: usize) -> Vec<PpgSample> {
    (0..count)
        .map(|i| {
            let phase = core::f32::consts::TAU * i as f32 / period as f32;
            PpgSample::new(
                (100_000.0 + 1_000.0 * phase.sin()).round() as u32,
                (50_000.0 + 240.0 * phase.sin()).round() as u32,
            )
        })
        .collect()
}

/// One window of constant samples.
pub fn flat(level: u32) -> Vec<PpgSample> {
    vec![PpgSample::new(level, level); WINDOW_LEN]
}

// ── MockSensors ───────────────────────────────────────────────

pub struct MockSensors {
    pub ppg_present: bool,
    pub temperature_present: bool,
    /// Every PPG read fails with a bus error while set.
    pub ppg_faulty: bool,
    pub samples: VecDeque<PpgSample>,
    pub celsius: Result<f32, SensorError>,
    pub ppg_probes: u32,
    pub temperature_probes: u32,
}

#[allow(dead_code)]
impl MockSensors {
    pub fn new() -> Self {
        Self {
            ppg_present: true,
            temperature_present: true,
            ppg_faulty: false,
            samples: VecDeque::new(),
            celsius: Ok(36.5),
            ppg_probes: 0,
            temperature_probes: 0,
        }
    }

    pub fn absent() -> Self {
        Self {
            ppg_present: false,
            temperature_present: false,
            ..Self::new()
        }
    }

    pub fn queue(&mut self, samples: impl IntoIterator<Item = PpgSample>) {
        self.samples.extend(samples);
    }
}

impl Default for MockSensors {
    fn default() -> Self {
        Self::new()
    }
}

impl PpgSensorPort for MockSensors {
    fn probe_ppg(&mut self) -> Result<(), SensorError> {
        self.ppg_probes += 1;
        if self.ppg_present {
            Ok(())
        } else {
            Err(SensorError::NotDetected)
        }
    }

    fn poll_sample(&mut self) -> Result<Option<PpgSample>, SensorError> {
        if self.ppg_faulty {
            return Err(SensorError::BusFailed);
        }
        Ok(self.samples.pop_front())
    }
}

impl TemperatureSensorPort for MockSensors {
    fn probe_temperature(&mut self) -> Result<(), SensorError> {
        self.temperature_probes += 1;
        if self.temperature_present {
            Ok(())
        } else {
            Err(SensorError::NotDetected)
        }
    }

    fn read_celsius(&mut self) -> Result<f32, SensorError> {
        self.celsius
    }
}

// ── MockLink ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub channel: TelemetryChannel,
    pub payload: Vec<u8>,
}

pub struct MockLink {
    pub peers: usize,
    pub notifications: Vec<Notification>,
    pub adverts: u32,
}

#[allow(dead_code)]
impl MockLink {
    pub fn new() -> Self {
        Self {
            peers: 0,
            notifications: Vec::new(),
            adverts: 0,
        }
    }

    /// Number of complete three-channel rounds sent.
    pub fn rounds(&self) -> usize {
        self.notifications.len() / TelemetryChannel::ALL.len()
    }

    pub fn last_payload(&self, channel: TelemetryChannel) -> Option<&[u8]> {
        self.notifications
            .iter()
            .rev()
            .find(|n| n.channel == channel)
            .map(|n| n.payload.as_slice())
    }
}

impl Default for MockLink {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryLink for MockLink {
    fn connected_count(&self) -> usize {
        self.peers
    }

    fn notify(&mut self, channel: TelemetryChannel, payload: &[u8]) -> Result<(), CommsError> {
        if self.peers == 0 {
            return Err(CommsError::NotConnected);
        }
        self.notifications.push(Notification {
            channel,
            payload: payload.to_vec(),
        });
        Ok(())
    }

    fn restart_advertising(&mut self) {
        self.adverts += 1;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.iter().any(|e| e == event)
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
