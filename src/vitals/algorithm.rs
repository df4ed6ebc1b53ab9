//! Reference HR/SpO2 estimation routine.
//!
//! A small peak-interval / ratio-of-ratios estimator, good enough for a
//! clean finger-on-sensor signal and deterministic for testing.  Any vendor
//! routine can replace it by implementing [`VitalsAlgorithm`].
//!
//! - **Heart rate**: local maxima of the infrared channel above its
//!   mid-level, separated by a refractory distance; HR = 60 · fs / mean
//!   peak interval.  Needs at least two peaks.
//! - **SpO2**: R = (AC_red / DC_red) / (AC_ir / DC_ir) with AC the
//!   peak-to-trough swing and DC the mid-level of each channel, mapped with
//!   the linear calibration SpO2 = 110 − 25·R.

use crate::app::ports::VitalsAlgorithm;

use super::RawVitals;

/// Fastest pulse the peak detector will resolve (sets the refractory distance).
const MAX_DETECTABLE_BPM: f32 = 250.0;

/// Windows shorter than this cannot contain two separable peaks.
const MIN_WINDOW_LEN: usize = 4;

const SPO2_INTERCEPT: f32 = 110.0;
const SPO2_SLOPE: f32 = 25.0;

#[derive(Debug, Clone, Copy)]
pub struct PeakRatioAlgorithm {
    sample_rate_hz: f32,
}

impl PeakRatioAlgorithm {
    pub fn new(sample_rate_hz: u16) -> Self {
        Self {
            sample_rate_hz: f32::from(sample_rate_hz),
        }
    }

    fn heart_rate(&self, infrared: &[u32], extent: Extent) -> Option<i32> {
        if extent.swing() == 0 {
            return None;
        }
        let threshold = extent.mid();
        let refractory = ((self.sample_rate_hz * 60.0 / MAX_DETECTABLE_BPM) as usize).max(1);

        let mut first: Option<usize> = None;
        let mut last: Option<usize> = None;
        let mut count = 0usize;

        for i in 1..infrared.len() - 1 {
            let x = infrared[i];
            let is_peak = x as f32 > threshold && x >= infrared[i - 1] && x > infrared[i + 1];
            if !is_peak {
                continue;
            }
            match last {
                Some(prev) if i - prev < refractory => {
                    // Same beat: keep the taller sample as its peak.
                    if x > infrared[prev] {
                        last = Some(i);
                        if count == 1 {
                            first = Some(i);
                        }
                    }
                }
                _ => {
                    first.get_or_insert(i);
                    last = Some(i);
                    count += 1;
                }
            }
        }

        let (first, last) = (first?, last?);
        if count < 2 {
            return None;
        }
        let mean_interval = (last - first) as f32 / (count - 1) as f32;
        Some((60.0 * self.sample_rate_hz / mean_interval).round() as i32)
    }

    fn spo2(&self, infrared: Extent, red: Extent) -> Option<i32> {
        let (ir_ac, ir_dc) = (infrared.swing() as f32, infrared.mid());
        let (red_ac, red_dc) = (red.swing() as f32, red.mid());
        if ir_ac == 0.0 || red_ac == 0.0 || ir_dc == 0.0 || red_dc == 0.0 {
            return None;
        }
        let ratio = (red_ac / red_dc) / (ir_ac / ir_dc);
        let spo2 = SPO2_INTERCEPT - SPO2_SLOPE * ratio;
        (0.0..=100.0).contains(&spo2).then(|| spo2.round() as i32)
    }
}

impl VitalsAlgorithm for PeakRatioAlgorithm {
    fn estimate(&self, infrared: &[u32], red: &[u32]) -> RawVitals {
        let n = infrared.len().min(red.len());
        if n < MIN_WINDOW_LEN {
            return RawVitals::default();
        }
        let (infrared, red) = (&infrared[..n], &red[..n]);
        let ir_extent = Extent::of(infrared);
        let red_extent = Extent::of(red);

        let heart_rate = self.heart_rate(infrared, ir_extent);
        let spo2 = self.spo2(ir_extent, red_extent);

        RawVitals {
            heart_rate: heart_rate.unwrap_or(0),
            heart_rate_valid: heart_rate.is_some(),
            spo2: spo2.unwrap_or(0),
            spo2_valid: spo2.is_some(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Extent {
    min: u32,
    max: u32,
}

impl Extent {
    fn of(samples: &[u32]) -> Self {
        let min = samples.iter().copied().min().unwrap_or(0);
        let max = samples.iter().copied().max().unwrap_or(0);
        Self { min, max }
    }

    fn swing(self) -> u32 {
        self.max - self.min
    }

    fn mid(self) -> f32 {
        (self.min as f32 + self.max as f32) / 2.0
    }
}
