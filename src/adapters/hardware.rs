//! Hardware adapter: bridges the sensor bus to domain port traits.
//!
//! Owns the I2C bus and both register-level drivers, exposing them through
//! [`PpgSensorPort`] and [`TemperatureSensorPort`].  This is the only module
//! in the system that touches sensor hardware.  Generic over any
//! `embedded-hal` 1.0 bus, so host tests can drive it with a mock.

use embedded_hal::i2c::I2c;

use crate::app::ports::{PpgSensorPort, TemperatureSensorPort};
use crate::drivers::max3010x::Max3010x;
use crate::drivers::mcp9808::Mcp9808;
use crate::error::SensorError;
use crate::sensors::buffer::PpgSample;

/// Concrete adapter that combines both sensors behind port traits.
pub struct HardwareAdapter<I2C> {
    i2c: I2C,
    ppg: Max3010x,
    thermometer: Mcp9808,
}

impl<I2C: I2c> HardwareAdapter<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            ppg: Max3010x::new(),
            thermometer: Mcp9808::new(),
        }
    }
}

// ── PpgSensorPort implementation ──────────────────────────────

impl<I2C: I2c> PpgSensorPort for HardwareAdapter<I2C> {
    fn probe_ppg(&mut self) -> Result<(), SensorError> {
        self.ppg.probe(&mut self.i2c)
    }

    fn poll_sample(&mut self) -> Result<Option<PpgSample>, SensorError> {
        self.ppg.poll_sample(&mut self.i2c)
    }
}

// ── TemperatureSensorPort implementation ──────────────────────

impl<I2C: I2c> TemperatureSensorPort for HardwareAdapter<I2C> {
    fn probe_temperature(&mut self) -> Result<(), SensorError> {
        self.thermometer.probe(&mut self.i2c)
    }

    fn read_celsius(&mut self) -> Result<f32, SensorError> {
        self.thermometer.read_celsius(&mut self.i2c)
    }
}
