//! MAX30102 pulse-oximetry front end (I2C, 0x57).
//!
//! Configured for SpO2 mode (red + IR LEDs), 100 samples/s with 4-sample
//! on-chip averaging, so the FIFO fills at an effective 25 Hz.  Each FIFO
//! entry is 6 bytes: red then IR, 3 bytes each, 18 significant bits.
//!
//! The driver borrows the bus per call so it can share one I2C peripheral
//! with the MCP9808.

use embedded_hal::i2c::I2c;
use log::{debug, info};

use super::map_bus_error;
use crate::error::SensorError;
use crate::sensors::buffer::PpgSample;

pub const ADDRESS: u8 = 0x57;
pub const PART_ID: u8 = 0x15;

/// Register map (subset used here).
pub mod reg {
    pub const FIFO_WR_PTR: u8 = 0x04;
    pub const OVF_COUNTER: u8 = 0x05;
    pub const FIFO_RD_PTR: u8 = 0x06;
    pub const FIFO_DATA: u8 = 0x07;
    pub const FIFO_CONFIG: u8 = 0x08;
    pub const MODE_CONFIG: u8 = 0x09;
    pub const SPO2_CONFIG: u8 = 0x0A;
    pub const LED1_PA: u8 = 0x0C;
    pub const LED2_PA: u8 = 0x0D;
    pub const PART_ID: u8 = 0xFF;
}

const MODE_RESET: u8 = 0x40;
const MODE_SPO2: u8 = 0x03;

const FIFO_SMP_AVE_4: u8 = 0b010 << 5;
const FIFO_ROLLOVER_EN: u8 = 0x10;

const SPO2_ADC_RGE_16384: u8 = 0b11 << 5;
/// 100 sps rather than the 400 sps the part can run at with a 411 us
/// pulse: with 4x averaging the FIFO fills at 25 Hz, the rate the
/// estimator window and its peak spacing assume.
const SPO2_SR_100: u8 = 0b001 << 2;
const SPO2_PW_411: u8 = 0b11;

/// Samples per second arriving in the FIFO after on-chip averaging.
pub const OUTPUT_RATE_HZ: u16 = 100 / 4;

/// ≈ 12.6 mA per LED.
const LED_AMPLITUDE: u8 = 0x3C;

const FIFO_DEPTH: u8 = 32;
const BYTES_PER_SAMPLE: usize = 6;
const SAMPLE_MASK: u32 = 0x3_FFFF;

/// Reads of MODE_CONFIG allowed for the soft reset to self-clear.
const RESET_POLL_LIMIT: usize = 10;

#[derive(Debug, Default)]
pub struct Max3010x {
    configured: bool,
}

impl Max3010x {
    pub const fn new() -> Self {
        Self { configured: false }
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Check the part ID, soft-reset and apply the sampling configuration.
    pub fn probe<I: I2c>(&mut self, i2c: &mut I) -> Result<(), SensorError> {
        self.configured = false;

        let mut id = [0u8];
        i2c.write_read(ADDRESS, &[reg::PART_ID], &mut id)
            .map_err(|_| SensorError::NotDetected)?;
        if id[0] != PART_ID {
            debug!("0x{:02X}: part id 0x{:02X}, expected 0x{:02X}", ADDRESS, id[0], PART_ID);
            return Err(SensorError::NotDetected);
        }

        write_reg(i2c, reg::MODE_CONFIG, MODE_RESET)?;
        let mut mode = [MODE_RESET];
        for _ in 0..RESET_POLL_LIMIT {
            i2c.write_read(ADDRESS, &[reg::MODE_CONFIG], &mut mode)
                .map_err(map_bus_error)?;
            if mode[0] & MODE_RESET == 0 {
                break;
            }
        }
        if mode[0] & MODE_RESET != 0 {
            return Err(SensorError::NotInitialised);
        }

        write_reg(i2c, reg::FIFO_CONFIG, FIFO_SMP_AVE_4 | FIFO_ROLLOVER_EN)?;
        write_reg(i2c, reg::MODE_CONFIG, MODE_SPO2)?;
        write_reg(i2c, reg::SPO2_CONFIG, SPO2_ADC_RGE_16384 | SPO2_SR_100 | SPO2_PW_411)?;
        write_reg(i2c, reg::LED1_PA, LED_AMPLITUDE)?;
        write_reg(i2c, reg::LED2_PA, LED_AMPLITUDE)?;
        self.clear_fifo(i2c)?;

        self.configured = true;
        info!("MAX30102 configured: SpO2 mode, 100 sps / avg 4, 411 us, 16384 nA");
        Ok(())
    }

    /// Number of unread samples in the FIFO.
    pub fn available<I: I2c>(&mut self, i2c: &mut I) -> Result<u8, SensorError> {
        // WR_PTR, OVF_COUNTER and RD_PTR are consecutive.
        let mut ptrs = [0u8; 3];
        i2c.write_read(ADDRESS, &[reg::FIFO_WR_PTR], &mut ptrs)
            .map_err(map_bus_error)?;
        let (wr, ovf, rd) = (ptrs[0] & 0x1F, ptrs[1] & 0x1F, ptrs[2] & 0x1F);
        if wr == rd {
            // Equal pointers mean empty unless the FIFO wrapped.
            return Ok(if ovf > 0 { FIFO_DEPTH } else { 0 });
        }
        Ok(wr.wrapping_sub(rd) & 0x1F)
    }

    /// Pop one sample if the FIFO holds any.
    pub fn poll_sample<I: I2c>(&mut self, i2c: &mut I) -> Result<Option<PpgSample>, SensorError> {
        if !self.configured {
            return Err(SensorError::NotInitialised);
        }
        if self.available(i2c)? == 0 {
            return Ok(None);
        }
        let mut raw = [0u8; BYTES_PER_SAMPLE];
        i2c.write_read(ADDRESS, &[reg::FIFO_DATA], &mut raw)
            .map_err(map_bus_error)?;
        Ok(Some(decode_sample(&raw)))
    }

    fn clear_fifo<I: I2c>(&mut self, i2c: &mut I) -> Result<(), SensorError> {
        write_reg(i2c, reg::FIFO_WR_PTR, 0)?;
        write_reg(i2c, reg::OVF_COUNTER, 0)?;
        write_reg(i2c, reg::FIFO_RD_PTR, 0)
    }
}

fn write_reg<I: I2c>(i2c: &mut I, register: u8, value: u8) -> Result<(), SensorError> {
    i2c.write(ADDRESS, &[register, value]).map_err(map_bus_error)
}

/// Split one 6-byte FIFO entry into an IR/red pair.
pub fn decode_sample(raw: &[u8; BYTES_PER_SAMPLE]) -> PpgSample {
    let word = |b: &[u8]| (u32::from(b[0]) << 16 | u32::from(b[1]) << 8 | u32::from(b[2])) & SAMPLE_MASK;
    PpgSample {
        red: word(&raw[0..3]),
        infrared: word(&raw[3..6]),
    }
}
