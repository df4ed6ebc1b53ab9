//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for the SynkLinx telemetry
//! loop: acquisition, estimation, gating, notification cadence and link
//! lifecycle orchestration.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
pub mod telemetry;
