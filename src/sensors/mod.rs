//! Sensor subsystem: acquisition window, temperature reader, and the
//! availability tracker shared by both sensors.
//!
//! Register-level drivers live in [`crate::drivers`]; this module only deals
//! with what the pipeline does with their output.

pub mod availability;
pub mod buffer;
pub mod temperature;

/// Identity of every sensor the pipeline tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SensorId {
    /// MAX30102 pulse-oximetry front end.
    Ppg = 0,
    /// MCP9808 digital thermometer.
    Temperature = 1,
}

impl SensorId {
    pub const COUNT: usize = 2;
    pub const ALL: [SensorId; Self::COUNT] = [SensorId::Ppg, SensorId::Temperature];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Part name used in log output.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ppg => "MAX30102",
            Self::Temperature => "MCP9808",
        }
    }
}
