//! MCP9808 digital temperature sensor (I2C, 0x18).
//!
//! Continuous conversion at 0.0625 °C resolution.  All registers except
//! the resolution register are 16-bit, MSB first.

use embedded_hal::i2c::I2c;
use log::{debug, info};

use super::map_bus_error;
use crate::error::SensorError;

pub const ADDRESS: u8 = 0x18;
pub const MANUFACTURER_ID: u16 = 0x0054;
pub const DEVICE_ID: u8 = 0x04;

pub mod reg {
    pub const CONFIG: u8 = 0x01;
    pub const AMBIENT_TEMP: u8 = 0x05;
    pub const MANUFACTURER_ID: u8 = 0x06;
    pub const DEVICE_ID: u8 = 0x07;
    pub const RESOLUTION: u8 = 0x08;
}

/// 0.0625 °C, ≈ 250 ms per conversion.
const RESOLUTION_0_0625: u8 = 0x03;

const TEMP_SIGN: u16 = 0x1000;
const TEMP_MAGNITUDE: u16 = 0x0FFF;

#[derive(Debug, Default)]
pub struct Mcp9808 {
    configured: bool,
}

impl Mcp9808 {
    pub const fn new() -> Self {
        Self { configured: false }
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Verify the manufacturer and device IDs, wake the part and set the
    /// resolution.
    pub fn probe<I: I2c>(&mut self, i2c: &mut I) -> Result<(), SensorError> {
        self.configured = false;

        let manufacturer = read_u16(i2c, reg::MANUFACTURER_ID).map_err(|_| SensorError::NotDetected)?;
        let device = read_u16(i2c, reg::DEVICE_ID)?;
        if manufacturer != MANUFACTURER_ID || (device >> 8) as u8 != DEVICE_ID {
            debug!(
                "0x{:02X}: ids 0x{:04X}/0x{:04X} do not match an MCP9808",
                ADDRESS, manufacturer, device
            );
            return Err(SensorError::NotDetected);
        }

        // Continuous conversion, no alerts, no hysteresis.
        i2c.write(ADDRESS, &[reg::CONFIG, 0x00, 0x00])
            .map_err(map_bus_error)?;
        i2c.write(ADDRESS, &[reg::RESOLUTION, RESOLUTION_0_0625])
            .map_err(map_bus_error)?;

        self.configured = true;
        info!("MCP9808 configured: 0.0625 \u{00b0}C resolution");
        Ok(())
    }

    pub fn read_celsius<I: I2c>(&mut self, i2c: &mut I) -> Result<f32, SensorError> {
        if !self.configured {
            return Err(SensorError::NotInitialised);
        }
        Ok(decode_temperature(read_u16(i2c, reg::AMBIENT_TEMP)?))
    }
}

fn read_u16<I: I2c>(i2c: &mut I, register: u8) -> Result<u16, SensorError> {
    let mut buf = [0u8; 2];
    i2c.write_read(ADDRESS, &[register], &mut buf)
        .map_err(map_bus_error)?;
    Ok(u16::from_be_bytes(buf))
}

/// Ambient-temperature register to °C.  The three alert flag bits above
/// the sign bit are ignored.
pub fn decode_temperature(raw: u16) -> f32 {
    let magnitude = f32::from(raw & TEMP_MAGNITUDE) / 16.0;
    if raw & TEMP_SIGN != 0 {
        magnitude - 256.0
    } else {
        magnitude
    }
}
