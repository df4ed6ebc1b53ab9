//! Integration tests for the BLE connection lifecycle.
//!
//! Link events travel the same way they do on target: pushed into a
//! `LinkEventChannel` and drained by `TelemetryService::tick`.

use synklinx::adapters::ble::BleTelemetryAdapter;
use synklinx::app::events::AppEvent;
use synklinx::app::ports::TelemetryLink;
use synklinx::app::service::TelemetryService;
use synklinx::app::telemetry::TelemetryChannel;
use synklinx::config::SystemConfig;
use synklinx::events::{LinkEvent, LinkEventChannel, push_link_event};
use synklinx::fsm::StateId;
use synklinx::sensors::buffer::WINDOW_LEN;
use synklinx::vitals::algorithm::PeakRatioAlgorithm;

use crate::mock_hw::{MockLink, MockSensors, RecordingSink, pulse};

fn make_service() -> TelemetryService<PeakRatioAlgorithm> {
    let config = SystemConfig::default();
    TelemetryService::new(&config, PeakRatioAlgorithm::new(config.ppg_sample_rate_hz))
}

fn connect(events: &LinkEventChannel, at_ms: u64) {
    assert!(push_link_event(events, LinkEvent::Connected { at_ms }));
}

fn disconnect(events: &LinkEventChannel, at_ms: u64) {
    assert!(push_link_event(events, LinkEvent::Disconnected { at_ms }));
}

// ── Start-up ──────────────────────────────────────────────────

#[test]
fn start_advertises_once_and_waits() {
    let mut service = make_service();
    let (mut hw, mut link, mut sink) = (MockSensors::new(), MockLink::new(), RecordingSink::new());

    service.start(0, &mut hw, &mut link, &mut sink);
    assert_eq!(link.adverts, 1);
    assert_eq!(service.link_state(), StateId::Disconnected);
}

// ── Connect / disconnect ──────────────────────────────────────

#[test]
fn connect_then_disconnect_resets_window_and_readvertises() {
    let events = LinkEventChannel::new();
    let mut service = make_service();
    let (mut hw, mut link, mut sink) = (MockSensors::new(), MockLink::new(), RecordingSink::new());
    service.start(0, &mut hw, &mut link, &mut sink);

    connect(&events, 0);
    link.peers = 1;
    hw.queue(pulse(20, WINDOW_LEN));
    for i in 0..WINDOW_LEN as u64 {
        service.tick(i * 5, &events, &mut hw, &mut link, &mut sink);
    }
    assert_eq!(service.link_state(), StateId::Connected);
    assert!(service.buffer().is_filled());
    assert!(service.vitals().heart_rate.is_valid());
    assert!(sink.contains(&AppEvent::LinkStateChanged {
        from: StateId::Disconnected,
        to: StateId::Connected,
    }));

    disconnect(&events, 400);
    link.peers = 0;
    service.tick(400, &events, &mut hw, &mut link, &mut sink);

    assert_eq!(service.link_state(), StateId::Disconnected);
    assert_eq!(link.adverts, 2);
    assert!(!service.buffer().is_filled());
    assert_eq!(service.buffer().cursor(), 0);
    assert!(!service.vitals().heart_rate.is_valid());
}

#[test]
fn disconnect_while_disconnected_still_resets_and_advertises() {
    let events = LinkEventChannel::new();
    let mut service = make_service();
    let (mut hw, mut link, mut sink) = (MockSensors::new(), MockLink::new(), RecordingSink::new());
    service.start(0, &mut hw, &mut link, &mut sink);
    hw.queue(pulse(20, 10));
    for i in 0..10u64 {
        service.tick(i * 5, &events, &mut hw, &mut link, &mut sink);
    }
    assert_eq!(service.buffer().cursor(), 10);

    disconnect(&events, 100);
    service.tick(100, &events, &mut hw, &mut link, &mut sink);

    assert_eq!(service.link_state(), StateId::Disconnected);
    assert_eq!(service.buffer().cursor(), 0);
    assert_eq!(link.adverts, 2);
}

#[test]
fn reconnect_inside_debounce_window_is_ignored() {
    let events = LinkEventChannel::new();
    let mut service = make_service();
    let (mut hw, mut link, mut sink) = (MockSensors::new(), MockLink::new(), RecordingSink::new());
    service.start(0, &mut hw, &mut link, &mut sink);

    connect(&events, 100);
    disconnect(&events, 300);
    connect(&events, 600);
    service.tick(600, &events, &mut hw, &mut link, &mut sink);
    assert_eq!(service.link_state(), StateId::Disconnected);
    assert_eq!(service.lifecycle().last_connect_ms(), Some(100));

    connect(&events, 1_100);
    service.tick(1_100, &events, &mut hw, &mut link, &mut sink);
    assert_eq!(service.link_state(), StateId::Connected);
    assert_eq!(service.lifecycle().last_connect_ms(), Some(1_100));
}

#[test]
fn events_are_handled_in_arrival_order() {
    let events = LinkEventChannel::new();
    let mut service = make_service();
    let (mut hw, mut link, mut sink) = (MockSensors::new(), MockLink::new(), RecordingSink::new());
    service.start(0, &mut hw, &mut link, &mut sink);

    connect(&events, 0);
    disconnect(&events, 10);
    service.tick(10, &events, &mut hw, &mut link, &mut sink);

    let changes: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::LinkStateChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect();
    assert_eq!(changes, vec![StateId::Connected, StateId::Disconnected]);
    assert_eq!(service.lifecycle().transitions(), 2);
}

// ── Radio adapter (host simulation) ───────────────────────────

// Only test in this binary that touches the process-wide peer counter.
#[test]
fn ble_adapter_round_trip() {
    let events = LinkEventChannel::new();
    let config = SystemConfig::default();
    let mut service = make_service();
    let mut hw = MockSensors::new();
    let mut sink = RecordingSink::new();
    let mut ble = BleTelemetryAdapter::new(config.device_name.clone());
    ble.start().unwrap();

    service.start(0, &mut hw, &mut ble, &mut sink);
    assert_eq!(ble.sim_adverts(), 1);

    ble.sim_connect(&events, 50);
    assert_eq!(ble.connected_count(), 1);
    let frame = service.tick(50, &events, &mut hw, &mut ble, &mut sink);
    assert!(frame.is_some());
    assert_eq!(service.link_state(), StateId::Connected);
    assert_eq!(ble.sim_notifications(), 3);
    assert_eq!(ble.sim_last_payload(TelemetryChannel::Temperature), &[0x42, 0x0E]);

    ble.sim_disconnect(&events, 80);
    service.tick(80, &events, &mut hw, &mut ble, &mut sink);
    assert_eq!(ble.connected_count(), 0);
    assert_eq!(service.link_state(), StateId::Disconnected);
    assert_eq!(ble.sim_adverts(), 2);

    // No peer, no more notifications.
    service.tick(400, &events, &mut hw, &mut ble, &mut sink);
    assert_eq!(ble.sim_notifications(), 3);
}
