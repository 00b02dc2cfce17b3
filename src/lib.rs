//! SwingGate firmware library.
//!
//! Exposes the gate logic, drivers and adapters for integration testing
//! and host simulation.  ESP-IDF-specific code is guarded by the `espidf`
//! feature within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod gate;
pub mod pins;
pub mod scheduler;

#[cfg(feature = "espidf")]
mod esp_link_shims;
