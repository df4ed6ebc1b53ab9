//! Integration tests for the acquisition → estimation → notification
//! pipeline.
//!
//! Drive `TelemetryService` tick by tick against `MockSensors` and
//! `MockLink` on a simulated 5 ms loop and assert on what the peer would
//! receive.

use synklinx::app::events::AppEvent;
use synklinx::app::service::TelemetryService;
use synklinx::app::telemetry::TelemetryChannel;
use synklinx::config::SystemConfig;
use synklinx::error::SensorError;
use synklinx::events::LinkEventChannel;
use synklinx::plausibility::Measurement;
use synklinx::sensors::SensorId;
use synklinx::sensors::availability::SensorState;
use synklinx::sensors::buffer::WINDOW_LEN;
use synklinx::vitals::algorithm::PeakRatioAlgorithm;

use crate::mock_hw::{MockLink, MockSensors, RecordingSink, flat, pulse};

const LOOP_MS: u64 = 5;

struct Rig {
    service: TelemetryService<PeakRatioAlgorithm>,
    hw: MockSensors,
    link: MockLink,
    sink: RecordingSink,
    events: LinkEventChannel,
    now_ms: u64,
}

impl Rig {
    fn new(hw: MockSensors) -> Self {
        let config = SystemConfig::default();
        let mut rig = Self {
            service: TelemetryService::new(&config, PeakRatioAlgorithm::new(config.ppg_sample_rate_hz)),
            hw,
            link: MockLink::new(),
            sink: RecordingSink::new(),
            events: LinkEventChannel::new(),
            now_ms: 0,
        };
        rig.service.start(0, &mut rig.hw, &mut rig.link, &mut rig.sink);
        rig
    }

    fn tick(&mut self) {
        self.service
            .tick(self.now_ms, &self.events, &mut self.hw, &mut self.link, &mut self.sink);
        self.now_ms += LOOP_MS;
    }

    fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Tick until the clock reaches `t_ms` (exclusive).
    fn run_until(&mut self, t_ms: u64) {
        while self.now_ms < t_ms {
            self.tick();
        }
    }
}

// ── Estimation ────────────────────────────────────────────────

#[test]
fn clean_pulse_reports_75_bpm_and_98_percent() {
    let mut rig = Rig::new(MockSensors::new());
    rig.hw.queue(pulse(20, WINDOW_LEN));

    rig.run(WINDOW_LEN);
    assert!(rig.service.buffer().is_filled());
    assert_eq!(rig.service.vitals().heart_rate, Measurement::Valid(75));
    assert_eq!(rig.service.vitals().spo2, Measurement::Valid(98));

    rig.link.peers = 1;
    rig.tick();
    assert_eq!(rig.link.last_payload(TelemetryChannel::HeartRate), Some(&[75u8][..]));
    assert_eq!(rig.link.last_payload(TelemetryChannel::Spo2), Some(&[98u8][..]));
    // 36.50 °C → 3650 = 0x0E42, little-endian
    assert_eq!(
        rig.link.last_payload(TelemetryChannel::Temperature),
        Some(&[0x42u8, 0x0E][..])
    );
}

#[test]
fn no_estimate_before_window_fills() {
    let mut rig = Rig::new(MockSensors::new());
    rig.hw.queue(pulse(20, WINDOW_LEN - 1));
    rig.link.peers = 1;

    rig.run(WINDOW_LEN);
    assert!(!rig.service.buffer().is_filled());
    assert_eq!(rig.link.last_payload(TelemetryChannel::HeartRate), Some(&[0u8][..]));
    assert_eq!(rig.link.last_payload(TelemetryChannel::Spo2), Some(&[0u8][..]));
}

#[test]
fn flat_signal_sends_zero_sentinels() {
    let mut rig = Rig::new(MockSensors::new());
    rig.hw.queue(flat(100_000));
    rig.run(WINDOW_LEN);

    rig.link.peers = 1;
    rig.tick();
    assert_eq!(rig.service.vitals().heart_rate, Measurement::Invalid);
    assert_eq!(rig.link.last_payload(TelemetryChannel::HeartRate), Some(&[0u8][..]));
    assert_eq!(rig.link.last_payload(TelemetryChannel::Spo2), Some(&[0u8][..]));
}

#[test]
fn samples_keep_flowing_after_the_first_window() {
    let mut rig = Rig::new(MockSensors::new());
    rig.hw.queue(pulse(25, 3 * WINDOW_LEN));
    rig.run(3 * WINDOW_LEN);

    assert_eq!(rig.service.buffer().cursor(), 0);
    assert_eq!(rig.service.vitals().heart_rate, Measurement::Valid(60));
}

// ── Temperature ───────────────────────────────────────────────

#[test]
fn implausible_temperature_is_sent_as_zero() {
    let mut hw = MockSensors::new();
    hw.celsius = Ok(90.0);
    let mut rig = Rig::new(hw);
    rig.link.peers = 1;

    rig.tick();
    assert_eq!(rig.service.temperature(), Measurement::Invalid);
    assert_eq!(
        rig.link.last_payload(TelemetryChannel::Temperature),
        Some(&[0u8, 0][..])
    );
}

#[test]
fn temperature_bus_error_is_invalid_for_that_tick_only() {
    let mut hw = MockSensors::new();
    hw.celsius = Err(SensorError::BusFailed);
    let mut rig = Rig::new(hw);

    rig.tick();
    assert_eq!(rig.service.temperature(), Measurement::Invalid);

    rig.hw.celsius = Ok(37.25);
    rig.tick();
    assert_eq!(rig.service.temperature(), Measurement::Valid(37.25));
}

// ── Notification cadence ──────────────────────────────────────

#[test]
fn nothing_is_sent_without_a_peer() {
    let mut rig = Rig::new(MockSensors::new());
    rig.hw.queue(pulse(20, WINDOW_LEN));
    rig.run_until(2_000);
    assert!(rig.link.notifications.is_empty());
}

#[test]
fn four_rounds_per_second_with_one_peer() {
    let mut rig = Rig::new(MockSensors::new());
    rig.link.peers = 1;
    rig.run_until(1_000);

    assert_eq!(rig.link.rounds(), 4);
    assert_eq!(rig.link.notifications.len(), 12);
    let order: Vec<_> = rig.link.notifications[..3].iter().map(|n| n.channel).collect();
    assert_eq!(order, TelemetryChannel::ALL.to_vec());
}

#[test]
fn every_round_is_logged_as_telemetry() {
    let mut rig = Rig::new(MockSensors::new());
    rig.link.peers = 2;
    rig.run_until(500);

    let frames = rig
        .sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::Telemetry(_)))
        .count();
    assert_eq!(frames, rig.link.rounds());
}

// ── Sensor availability ───────────────────────────────────────

#[test]
fn missing_sensors_send_fallbacks_and_reprobe_every_five_seconds() {
    let mut rig = Rig::new(MockSensors::absent());
    assert!(rig.sink.contains(&AppEvent::Started {
        ppg: false,
        temperature: false
    }));
    assert!(rig.sink.contains(&AppEvent::SensorMissing(SensorId::Ppg)));

    rig.link.peers = 1;
    rig.run_until(5_000);
    assert_eq!(rig.hw.ppg_probes, 1);
    assert_eq!(rig.hw.temperature_probes, 1);
    assert_eq!(
        rig.link.last_payload(TelemetryChannel::Temperature),
        Some(&[0u8, 0][..])
    );

    // Plug the thermometer in; the next re-probe finds it.
    rig.hw.temperature_present = true;
    rig.tick();
    assert_eq!(rig.hw.ppg_probes, 2);
    assert_eq!(rig.hw.temperature_probes, 2);
    assert!(rig.sink.contains(&AppEvent::SensorOnline(SensorId::Temperature)));
    assert_eq!(
        rig.service.availability().state(SensorId::Ppg),
        SensorState::Absent
    );

    rig.tick();
    assert_eq!(rig.service.temperature(), Measurement::Valid(36.5));
}

#[test]
fn faulty_ppg_degrades_then_recovers_on_reprobe() {
    let mut rig = Rig::new(MockSensors::new());
    rig.hw.queue(pulse(20, WINDOW_LEN));
    rig.run(WINDOW_LEN);
    assert!(rig.service.vitals().heart_rate.is_valid());

    rig.hw.ppg_faulty = true;
    rig.run(20);
    assert_eq!(
        rig.service.availability().state(SensorId::Ppg),
        SensorState::Degraded
    );
    assert!(rig.sink.contains(&AppEvent::SensorDegraded(SensorId::Ppg)));
    assert!(!rig.service.buffer().is_filled());
    assert_eq!(rig.service.vitals().heart_rate, Measurement::Invalid);

    // Re-probe is timed from the start-up probe at t = 0.
    rig.hw.ppg_faulty = false;
    rig.run_until(5_000);
    assert_eq!(rig.hw.ppg_probes, 1);
    rig.tick();
    assert_eq!(rig.hw.ppg_probes, 2);
    assert!(rig.service.availability().is_available(SensorId::Ppg));
    assert!(rig.sink.contains(&AppEvent::SensorOnline(SensorId::Ppg)));
}

#[test]
fn implausible_temperature_streak_degrades_then_recovers() {
    let mut rig = Rig::new(MockSensors::new());
    rig.link.peers = 1;
    rig.tick();
    assert_eq!(rig.service.temperature(), Measurement::Valid(36.5));

    // Off-wrist: the part answers, the value is out of range.
    rig.hw.celsius = Ok(20.0);
    rig.run(19);
    assert!(rig.service.availability().is_available(SensorId::Temperature));
    rig.tick();
    assert_eq!(
        rig.service.availability().state(SensorId::Temperature),
        SensorState::Degraded
    );
    assert!(rig.service.availability().is_quiet(SensorId::Temperature));
    assert!(rig.sink.contains(&AppEvent::SensorDegraded(SensorId::Temperature)));
    assert_eq!(rig.service.temperature(), Measurement::Invalid);

    rig.hw.celsius = Ok(36.5);
    rig.run_until(5_000);
    assert_eq!(rig.hw.temperature_probes, 1);
    assert_eq!(rig.service.temperature(), Measurement::Invalid);
    assert_eq!(
        rig.link.last_payload(TelemetryChannel::Temperature),
        Some(&[0u8, 0][..])
    );

    rig.tick();
    assert_eq!(rig.hw.temperature_probes, 2);
    assert!(rig.service.availability().is_available(SensorId::Temperature));
    assert!(rig.sink.contains(&AppEvent::SensorOnline(SensorId::Temperature)));

    rig.tick();
    assert_eq!(rig.service.temperature(), Measurement::Valid(36.5));
}
