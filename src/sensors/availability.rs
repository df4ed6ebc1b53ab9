//! Sensor availability tracking.
//!
//! Each sensor runs a three-state machine:
//!
//! ```text
//!            probe ok                      fault streak ≥ threshold
//!  ABSENT ─────────────▶ AVAILABLE ────────────────────────────▶ DEGRADED
//!    ▲  │                   ▲                                       │
//!    └──┘ probe failed      └──────────── probe ok ─────────────────┘
//!         (retry every reprobe_interval)      (retry every reprobe_interval)
//! ```
//!
//! Only `Available` sensors are read.  The other two states yield invalid
//! readings and are re-probed on a fixed period.  This module does not touch
//! hardware: the caller performs the probe and reports its outcome.

use log::{debug, info, warn};

use super::SensorId;
use crate::config::SystemConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorState {
    /// Never detected, or every probe so far failed.
    Absent,
    /// Detected and producing reads.
    Available,
    /// Was available, then produced too many consecutive faulty reads.
    Degraded,
}

/// How one read from an available sensor went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Good,
    /// The part answered with a value outside the plausible range.
    Implausible,
    /// The driver reported an error.
    Failed,
}

/// Reported when a sensor crosses between usable and unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorTransition {
    Online,
    Degraded,
}

#[derive(Debug, Clone, Copy)]
struct SensorHealth {
    state: SensorState,
    last_probe_ms: u64,
    fault_streak: u16,
    /// At least one read in the current streak was a driver error.
    streak_has_bus_fault: bool,
    /// Degraded on implausible values alone (e.g. off-wrist); the flap is
    /// logged at debug level.
    quiet: bool,
}

impl SensorHealth {
    const fn new() -> Self {
        Self {
            state: SensorState::Absent,
            last_probe_ms: 0,
            fault_streak: 0,
            streak_has_bus_fault: false,
            quiet: false,
        }
    }
}

pub struct SensorAvailability {
    sensors: [SensorHealth; SensorId::COUNT],
    reprobe_interval_ms: u64,
    fault_threshold: u16,
}

impl SensorAvailability {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            sensors: [SensorHealth::new(); SensorId::COUNT],
            reprobe_interval_ms: u64::from(config.reprobe_interval_ms),
            fault_threshold: config.degraded_fault_threshold,
        }
    }

    pub fn state(&self, id: SensorId) -> SensorState {
        self.sensors[id.index()].state
    }

    pub fn is_available(&self, id: SensorId) -> bool {
        self.state(id) == SensorState::Available
    }

    /// True when `id` is unusable and its re-probe period has elapsed.
    pub fn due_for_reprobe(&self, id: SensorId, now_ms: u64) -> bool {
        let s = &self.sensors[id.index()];
        s.state != SensorState::Available
            && now_ms.saturating_sub(s.last_probe_ms) >= self.reprobe_interval_ms
    }

    /// Record the outcome of a probe attempt made at `now_ms`.
    pub fn record_probe(&mut self, id: SensorId, ok: bool, now_ms: u64) -> Option<SensorTransition> {
        let s = &mut self.sensors[id.index()];
        s.last_probe_ms = now_ms;
        if !ok || s.state == SensorState::Available {
            return None;
        }
        if s.quiet {
            debug!("{} available again", id.name());
        } else {
            info!("{} available (was {:?})", id.name(), s.state);
        }
        s.state = SensorState::Available;
        s.fault_streak = 0;
        s.streak_has_bus_fault = false;
        Some(SensorTransition::Online)
    }

    /// Record how a read from an available sensor went.  Implausible
    /// values and driver errors both extend the fault streak.
    ///
    /// Reads reported for a sensor that is not `Available` are ignored.
    pub fn record_read(&mut self, id: SensorId, outcome: ReadOutcome) -> Option<SensorTransition> {
        let threshold = self.fault_threshold;
        let s = &mut self.sensors[id.index()];
        if s.state != SensorState::Available {
            return None;
        }
        if outcome == ReadOutcome::Good {
            s.fault_streak = 0;
            s.streak_has_bus_fault = false;
            return None;
        }
        s.fault_streak = s.fault_streak.saturating_add(1);
        s.streak_has_bus_fault |= outcome == ReadOutcome::Failed;
        if s.fault_streak < threshold {
            return None;
        }
        s.quiet = !s.streak_has_bus_fault;
        if s.quiet {
            debug!(
                "{} degraded after {} implausible reads, falling back to re-probe",
                id.name(),
                s.fault_streak
            );
        } else {
            warn!(
                "{} degraded after {} consecutive faulty reads, falling back to re-probe",
                id.name(),
                s.fault_streak
            );
        }
        s.state = SensorState::Degraded;
        s.fault_streak = 0;
        s.streak_has_bus_fault = false;
        Some(SensorTransition::Degraded)
    }

    /// True if the last degrade came from implausible values only.
    pub fn is_quiet(&self, id: SensorId) -> bool {
        self.sensors[id.index()].quiet
    }

    pub fn fault_streak(&self, id: SensorId) -> u16 {
        self.sensors[id.index()].fault_streak
    }
}
