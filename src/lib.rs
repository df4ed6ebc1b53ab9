//! SynkLinx firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod fsm;
pub mod plausibility;
pub mod scheduler;
pub mod sensors;
pub mod vitals;

pub mod pins;

// Hardware-facing modules compile on the host too; the actual ESP-IDF
// implementations are guarded by cfg attributes inside.
pub mod adapters;
pub mod drivers;

mod esp_link_shims;
