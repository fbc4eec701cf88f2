//! HeatRelay firmware library.
//!
//! Exposes the relay controller, the pin registry and the host-side
//! adapters for integration testing and simulation.  All ESP-IDF-specific
//! code is guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod expiry;
pub mod pins;
