//! Unified error types for the SynkLinx firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! bootstrap and adapter error handling uniform.  All variants are `Copy` so
//! they can be passed through the pipeline without allocation.
//!
//! Note that the telemetry pipeline itself never propagates these: sensor and
//! link failures are collapsed into `Measurement::Invalid` at the boundary
//! where they occur.  Errors only travel between drivers and the code that
//! decides how to degrade.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be probed or read.
    Sensor(SensorError),
    /// The radio link rejected an operation.
    Comms(CommsError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// A bus transaction with a detected device failed (data NACK,
    /// arbitration loss, timeout).
    BusFailed,
    /// Nothing acknowledged the address, or the identity registers did not
    /// match the expected part.
    NotDetected,
    /// The driver was used before a successful probe.
    NotInitialised,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusFailed => write!(f, "I2C transaction failed"),
            Self::NotDetected => write!(f, "device not detected"),
            Self::NotInitialised => write!(f, "sensor not initialised"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    BleInitFailed,
    /// Notification attempted with no subscribed peer.
    NotConnected,
    /// The GATT attribute for the channel is not registered yet.
    ChannelUnavailable,
    NotifyFailed,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BleInitFailed => write!(f, "BLE init failed"),
            Self::NotConnected => write!(f, "no connected peer"),
            Self::ChannelUnavailable => write!(f, "characteristic not registered"),
            Self::NotifyFailed => write!(f, "BLE notify failed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
