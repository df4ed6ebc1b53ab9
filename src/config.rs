//! System configuration parameters
//!
//! All tunable parameters for the SynkLinx telemetry loop.  The timing
//! constants (notify cadence, reconnect debounce, re-probe period) have no
//! hardware justification of their own, so they live here rather than being
//! baked into the components that use them.

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Longest advertised name that still fits a legacy advertising packet
/// next to the flags and a 128-bit service UUID.
pub const DEVICE_NAME_MAX_LEN: usize = 8;

pub const DEFAULT_DEVICE_NAME: &str = "SynkLinx";

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// GAP device name advertised to peers
    pub device_name: String<DEVICE_NAME_MAX_LEN>,

    // --- Timing ---
    /// Minimum spacing between two telemetry notifications (milliseconds)
    pub notify_interval_ms: u32,
    /// Connect events closer than this to the last accepted one are dropped
    pub reconnect_debounce_ms: u32,
    /// Re-probe period for an absent or degraded sensor (milliseconds)
    pub reprobe_interval_ms: u32,
    /// Cooperative yield between loop iterations (milliseconds)
    pub loop_delay_ms: u32,

    // --- Sensor health ---
    /// Consecutive faulty reads before an available sensor is marked degraded
    pub degraded_fault_threshold: u16,

    // --- PPG ---
    /// Effective PPG sample rate after on-chip averaging (Hz)
    pub ppg_sample_rate_hz: u16,

    // --- Plausibility ranges (inclusive) ---
    pub heart_rate_min_bpm: u8,
    pub heart_rate_max_bpm: u8,
    pub spo2_min_percent: u8,
    pub spo2_max_percent: u8,
    pub temperature_min_c: f32,
    pub temperature_max_c: f32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut device_name = String::new();
        // DEFAULT_DEVICE_NAME is exactly DEVICE_NAME_MAX_LEN bytes.
        let _ = device_name.push_str(DEFAULT_DEVICE_NAME);

        Self {
            device_name,

            // Timing
            notify_interval_ms: 250, // 4 Hz
            reconnect_debounce_ms: 1000,
            reprobe_interval_ms: 5000,
            loop_delay_ms: 5,

            // Sensor health
            degraded_fault_threshold: 20,

            // PPG
            ppg_sample_rate_hz: 25,

            // Plausibility
            heart_rate_min_bpm: 40,
            heart_rate_max_bpm: 200,
            spo2_min_percent: 70,
            spo2_max_percent: 100,
            temperature_min_c: 30.0,
            temperature_max_c: 45.0,
        }
    }
}

impl SystemConfig {
    /// Reject parameter combinations the pipeline cannot honour.
    ///
    /// Values are rejected, never clamped.
    pub fn validate(&self) -> Result<()> {
        if self.device_name.is_empty() {
            return Err(Error::Config("device_name must not be empty"));
        }
        if self.notify_interval_ms == 0 {
            return Err(Error::Config("notify_interval_ms must be non-zero"));
        }
        if self.loop_delay_ms >= self.notify_interval_ms {
            return Err(Error::Config("loop_delay_ms must be below notify_interval_ms"));
        }
        if self.reprobe_interval_ms == 0 {
            return Err(Error::Config("reprobe_interval_ms must be non-zero"));
        }
        if self.degraded_fault_threshold == 0 {
            return Err(Error::Config("degraded_fault_threshold must be non-zero"));
        }
        if self.ppg_sample_rate_hz == 0 {
            return Err(Error::Config("ppg_sample_rate_hz must be non-zero"));
        }
        if self.heart_rate_min_bpm == 0 || self.heart_rate_min_bpm > self.heart_rate_max_bpm {
            return Err(Error::Config("heart rate range is empty or includes 0"));
        }
        if self.spo2_min_percent == 0
            || self.spo2_min_percent > self.spo2_max_percent
            || self.spo2_max_percent > 100
        {
            return Err(Error::Config("SpO2 range must lie within 1..=100"));
        }
        if !self.temperature_min_c.is_finite()
            || !self.temperature_max_c.is_finite()
            || self.temperature_min_c > self.temperature_max_c
        {
            return Err(Error::Config("temperature range is empty or not finite"));
        }
        Ok(())
    }
}
