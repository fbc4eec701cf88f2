//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ RelayController (domain)
//! ```
//!
//! Driven adapters (GPIO driver, config store, clock, event sinks)
//! implement these traits.  The [`RelayController`](super::controller::RelayController)
//! consumes them via generics, so the domain core never touches hardware
//! directly.

use std::sync::Arc;

use embedded_hal::digital::{ErrorKind, InputPin, OutputPin};

use crate::config::ConfigValue;
use crate::pins::PhysicalAddress;

// ───────────────────────────────────────────────────────────────
// GPIO port (driven adapter: domain ↔ hardware lines)
// ───────────────────────────────────────────────────────────────

/// Low-level GPIO driver.
///
/// Opening a line hands back an owned handle; dropping the handle releases
/// the line.  Reads and writes go through the `embedded-hal` digital traits
/// on the handle and are expected to be synchronous and atomic.
pub trait GpioPort {
    type Input: InputPin;
    type Output: OutputPin;

    /// Claim `address` as a digital input.
    fn open_input(&mut self, address: PhysicalAddress) -> Result<Self::Input, ErrorKind>;

    /// Claim `address` as a digital output.
    fn open_output(&mut self, address: PhysicalAddress) -> Result<Self::Output, ErrorKind>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ← persistent config)
// ───────────────────────────────────────────────────────────────

/// Key lookup into the persisted configuration.
///
/// Called on every holiday check, never cached, so edits made by a front
/// end take effect on the next request.
pub trait ConfigSource {
    fn get(&self, key: &str) -> Option<ConfigValue>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Wall-clock time source.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`RelayEvent`](super::events::RelayEvent)s
/// through this port.  Adapters decide where they go (serial log, MQTT,
/// web socket, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::RelayEvent);
}

impl<T: ConfigSource + ?Sized> ConfigSource for &T {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        (**self).get(key)
    }
}

impl<T: ConfigSource + ?Sized> ConfigSource for Arc<T> {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        (**self).get(key)
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_millis(&self) -> i64 {
        (**self).now_millis()
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now_millis(&self) -> i64 {
        (**self).now_millis()
    }
}
