//! Vital-sign estimation.
//!
//! [`VitalEstimator`] runs a [`VitalsAlgorithm`] over a full
//! [`SampleBuffer`] window and gates its output:
//!
//! | Quantity   | Accepted range (default) |
//! |------------|--------------------------|
//! | Heart rate | 40 ..= 200 bpm           |
//! | SpO2       | 70 ..= 100 %             |
//!
//! The algorithm's own validity flag and the range check are combined; either
//! failing yields [`Measurement::Invalid`] for that quantity only.

pub mod algorithm;

use crate::app::ports::VitalsAlgorithm;
use crate::config::SystemConfig;
use crate::plausibility::{Measurement, VitalGates};
use crate::sensors::buffer::SampleBuffer;

/// Raw algorithm output, before gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawVitals {
    pub heart_rate: i32,
    pub heart_rate_valid: bool,
    pub spo2: i32,
    pub spo2_valid: bool,
}

/// Gated heart rate and SpO2.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VitalReading {
    pub heart_rate: Measurement<u8>,
    pub spo2: Measurement<u8>,
}

pub struct VitalEstimator<A: VitalsAlgorithm> {
    algorithm: A,
    gates: VitalGates,
}

impl<A: VitalsAlgorithm> VitalEstimator<A> {
    pub fn new(algorithm: A, config: &SystemConfig) -> Self {
        Self {
            algorithm,
            gates: VitalGates::from_config(config),
        }
    }

    /// Estimate over the buffer's window, oldest sample first.
    ///
    /// An unfilled buffer yields an all-invalid reading without invoking the
    /// algorithm.
    pub fn estimate(&self, buffer: &SampleBuffer) -> VitalReading {
        if !buffer.is_filled() {
            return VitalReading::default();
        }
        let (infrared, red) = buffer.chronological();
        self.gate(self.algorithm.estimate(&infrared, &red))
    }

    /// Apply both range gates to raw algorithm output.
    pub fn gate(&self, raw: RawVitals) -> VitalReading {
        // Gate bounds sit inside 0..=255, so the narrowing is lossless.
        VitalReading {
            heart_rate: self
                .gates
                .heart_rate
                .check(raw.heart_rate, raw.heart_rate_valid)
                .map(|bpm| bpm as u8),
            spo2: self
                .gates
                .spo2
                .check(raw.spo2, raw.spo2_valid)
                .map(|pct| pct as u8),
        }
    }

    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }
}
