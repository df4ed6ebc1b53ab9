//! Plausibility gating.
//!
//! Every derived or raw value passes through a [`PlausibilityGate`] before
//! it can reach the radio.  A value is accepted only if its producer flagged
//! it valid **and** it lies inside an inclusive physiologic range; anything
//! else becomes [`Measurement::Invalid`].  No gate ever returns an error or
//! retries.
//!
//! ## Measurement lifecycle
//!
//! 1. A producer (estimation routine, temperature driver) yields a raw value
//!    and, optionally, its own validity flag.
//! 2. The gate collapses "flagged invalid" and "out of range" into the same
//!    `Invalid` outcome.
//! 3. The tagged value travels through the pipeline unchanged.
//! 4. Only the wire encoder in [`app::telemetry`](crate::app::telemetry)
//!    turns `Invalid` into the zero sentinel the BLE protocol expects.

use crate::config::SystemConfig;

/// A gated reading: either a plausible value or nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement<T> {
    Valid(T),
    Invalid,
}

impl<T> Default for Measurement<T> {
    fn default() -> Self {
        Self::Invalid
    }
}

impl<T: Copy> Measurement<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn value(self) -> Option<T> {
        match self {
            Self::Valid(v) => Some(v),
            Self::Invalid => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Measurement<U> {
        match self {
            Self::Valid(v) => Measurement::Valid(f(v)),
            Self::Invalid => Measurement::Invalid,
        }
    }

    /// Collapse to a wire value, substituting `sentinel` for `Invalid`.
    pub fn or_sentinel(self, sentinel: T) -> T {
        self.value().unwrap_or(sentinel)
    }
}

/// Inclusive range check with a producer-validity input.
#[derive(Debug, Clone, Copy)]
pub struct PlausibilityGate<T> {
    min: T,
    max: T,
}

impl<T: PartialOrd + Copy> PlausibilityGate<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    /// Accept `value` only if `flagged_valid` and `min <= value <= max`.
    ///
    /// Incomparable values (NaN) are rejected.
    pub fn check(&self, value: T, flagged_valid: bool) -> Measurement<T> {
        if flagged_valid && value >= self.min && value <= self.max {
            Measurement::Valid(value)
        } else {
            Measurement::Invalid
        }
    }

    /// Range-only check for producers without their own validity flag.
    pub fn accept(&self, value: T) -> Measurement<T> {
        self.check(value, true)
    }
}

/// The three gates the pipeline applies, built from configuration.
#[derive(Debug, Clone, Copy)]
pub struct VitalGates {
    pub heart_rate: PlausibilityGate<i32>,
    pub spo2: PlausibilityGate<i32>,
    pub temperature: PlausibilityGate<f32>,
}

impl VitalGates {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            heart_rate: PlausibilityGate::new(
                i32::from(config.heart_rate_min_bpm),
                i32::from(config.heart_rate_max_bpm),
            ),
            spo2: PlausibilityGate::new(
                i32::from(config.spo2_min_percent),
                i32::from(config.spo2_max_percent),
            ),
            temperature: PlausibilityGate::new(config.temperature_min_c, config.temperature_max_c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gates() -> VitalGates {
        VitalGates::from_config(&SystemConfig::default())
    }

    #[test]
    fn heart_rate_bounds_are_inclusive() {
        let g = gates().heart_rate;
        assert_eq!(g.check(40, true), Measurement::Valid(40));
        assert_eq!(g.check(200, true), Measurement::Valid(200));
        assert_eq!(g.check(39, true), Measurement::Invalid);
        assert_eq!(g.check(201, true), Measurement::Invalid);
    }

    #[test]
    fn producer_flag_overrides_range() {
        let g = gates().heart_rate;
        assert_eq!(g.check(75, false), Measurement::Invalid);
    }

    #[test]
    fn spo2_gate() {
        let g = gates().spo2;
        assert_eq!(g.check(98, true), Measurement::Valid(98));
        assert_eq!(g.check(69, true), Measurement::Invalid);
        assert_eq!(g.check(101, true), Measurement::Invalid);
        assert_eq!(g.check(-1, true), Measurement::Invalid);
    }

    #[test]
    fn temperature_gate_rejects_nan() {
        let g = gates().temperature;
        assert_eq!(g.accept(36.5), Measurement::Valid(36.5));
        assert_eq!(g.accept(90.0), Measurement::Invalid);
        assert_eq!(g.accept(f32::NAN), Measurement::Invalid);
    }

    #[test]
    fn sentinel_only_at_collapse() {
        let m: Measurement<u8> = Measurement::Invalid;
        assert_eq!(m.or_sentinel(0), 0);
        assert_eq!(Measurement::Valid(72u8).or_sentinel(0), 72);
        assert_eq!(Measurement::Valid(72i32).map(|v| v as u8), Measurement::Valid(72u8));
    }
}
