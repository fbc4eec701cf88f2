//! Application core: relay business rules, zero direct I/O.
//!
//! This module contains the rules for the two switched loads: on/off,
//! boost and holiday suppression.  All interaction with hardware,
//! configuration and time happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod controller;
pub mod events;
pub mod load;
pub mod ports;
