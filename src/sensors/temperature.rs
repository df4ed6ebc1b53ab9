//! Skin/ambient temperature reader.
//!
//! Takes one instantaneous reading per call from the
//! [`TemperatureSensorPort`] and passes it through the temperature
//! plausibility gate.  A bus error or an implausible value is reported as
//! `Invalid` for this tick only; there is no retry.

use log::debug;

use crate::app::ports::TemperatureSensorPort;
use crate::config::SystemConfig;
use crate::plausibility::{Measurement, PlausibilityGate};
use crate::sensors::availability::ReadOutcome;

pub struct TemperatureReader {
    gate: PlausibilityGate<f32>,
}

impl TemperatureReader {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            gate: PlausibilityGate::new(config.temperature_min_c, config.temperature_max_c),
        }
    }

    /// Read and gate one value.  The outcome tells an implausible value
    /// apart from a driver error.
    pub fn read(&self, sensor: &mut impl TemperatureSensorPort) -> (Measurement<f32>, ReadOutcome) {
        match sensor.read_celsius() {
            Ok(celsius) => {
                let gated = self.gate(celsius);
                if gated.is_valid() {
                    (gated, ReadOutcome::Good)
                } else {
                    debug!("temperature {:.2}\u{00b0}C outside plausible range", celsius);
                    (gated, ReadOutcome::Implausible)
                }
            }
            Err(e) => {
                debug!("temperature read failed: {}", e);
                (Measurement::Invalid, ReadOutcome::Failed)
            }
        }
    }

    /// Gate a raw Celsius value.
    pub fn gate(&self, celsius: f32) -> Measurement<f32> {
        self.gate.accept(celsius)
    }
}
