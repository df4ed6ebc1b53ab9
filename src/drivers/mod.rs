//! Register-level sensor drivers.
//!
//! Both drivers are written against `embedded-hal` 1.0 [`I2c`] and borrow
//! the bus per call, so one `I2cDriver` serves both parts.  On ESP-IDF the
//! bus is `esp_idf_svc::hal::i2c::I2cDriver`; tests use [`mock_bus::MockBus`].
//!
//! [`I2c`]: embedded_hal::i2c::I2c

pub mod max3010x;
pub mod mcp9808;

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
use log::debug;

use crate::error::SensorError;

/// Collapse a HAL bus error into the crate's sensor error.
///
/// An address NACK means nothing answered, which is reported as
/// `NotDetected` so callers can tell "unplugged" from "bus trouble".
pub(crate) fn map_bus_error<E: embedded_hal::i2c::Error>(e: E) -> SensorError {
    match e.kind() {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address) => SensorError::NotDetected,
        kind => {
            debug!("I2C error: {:?}", kind);
            SensorError::BusFailed
        }
    }
}
