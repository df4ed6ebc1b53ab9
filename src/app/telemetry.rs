//! Telemetry frames and their BLE wire encoding.
//!
//! Inside the crate every value is a [`Measurement`].  The zero sentinel
//! exists only here, at the serialisation step, because the peer protocol
//! has no other way to say "no reading":
//!
//! | Channel     | Width | Encoding                                  |
//! |-------------|-------|-------------------------------------------|
//! | HeartRate   | 1     | `u8` bpm, 0 = invalid                     |
//! | Spo2        | 1     | `u8` percent, 0 = invalid                 |
//! | Temperature | 2     | `i16` LE, °C × 100 truncated, 0 = invalid |
//!
//! A peer therefore cannot tell "sensor missing" from "implausible reading"
//! from a true zero.  This is a protocol limitation, not a pipeline one.

use heapless::Vec;

use crate::plausibility::Measurement;

/// Widest payload of any channel.
pub const MAX_PAYLOAD_LEN: usize = 2;

/// One notification channel (one GATT characteristic).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryChannel {
    HeartRate,
    Spo2,
    Temperature,
}

impl TelemetryChannel {
    /// Notification order within one round.
    pub const ALL: [TelemetryChannel; 3] = [
        TelemetryChannel::HeartRate,
        TelemetryChannel::Spo2,
        TelemetryChannel::Temperature,
    ];

    pub const fn payload_len(self) -> usize {
        match self {
            Self::HeartRate | Self::Spo2 => 1,
            Self::Temperature => 2,
        }
    }
}

/// The values sent in one notification round.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetryFrame {
    pub heart_rate: Measurement<u8>,
    pub spo2: Measurement<u8>,
    pub temperature_c: Measurement<f32>,
}

impl TelemetryFrame {
    pub fn heart_rate_payload(&self) -> [u8; 1] {
        [self.heart_rate.or_sentinel(0)]
    }

    pub fn spo2_payload(&self) -> [u8; 1] {
        [self.spo2.or_sentinel(0)]
    }

    /// Temperature in hundredths of a degree, truncated toward zero.
    pub fn temperature_centi(&self) -> i16 {
        self.temperature_c.map(|c| (c * 100.0) as i16).or_sentinel(0)
    }

    pub fn temperature_payload(&self) -> [u8; 2] {
        self.temperature_centi().to_le_bytes()
    }

    /// Encoded payload for `channel`.
    pub fn payload(&self, channel: TelemetryChannel) -> Vec<u8, MAX_PAYLOAD_LEN> {
        let mut out = Vec::new();
        // Every payload fits MAX_PAYLOAD_LEN, so extend cannot fail.
        let _ = match channel {
            TelemetryChannel::HeartRate => out.extend_from_slice(&self.heart_rate_payload()),
            TelemetryChannel::Spo2 => out.extend_from_slice(&self.spo2_payload()),
            TelemetryChannel::Temperature => out.extend_from_slice(&self.temperature_payload()),
        };
        out
    }
}
