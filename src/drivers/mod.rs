//! Hardware-facing drivers.

pub mod pin_registry;
