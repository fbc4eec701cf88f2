//! Boost expiry poller.
//!
//! The controller records when a boost should end but never ends it on
//! its own.  This poller is the external scheduler that gives boost its
//! "temporary" meaning: every interval it asks the controller to expire
//! any boost whose off time has passed, which clears the boost and
//! switches the load off.
//!
//! ```text
//!  ┌──────────────────┐  every interval   ┌─────────────────────┐
//!  │ BoostExpiryPoller│ ────────────────▶ │ RelayController     │
//!  │  (main loop)     │   expire_boost()  │  .expire_boost(L)   │
//!  └──────────────────┘                   └─────────────────────┘
//! ```

use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::app::controller::RelayController;
use crate::app::load::Load;
use crate::app::ports::{Clock, ConfigSource, EventSink, GpioPort};
use crate::config::SystemConfig;
use crate::error::Result;

pub struct BoostExpiryPoller {
    interval: Duration,
}

impl BoostExpiryPoller {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(Duration::from_millis(u64::from(config.expiry_poll_interval_ms)))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One pass over both loads.  Returns the loads whose boost ended.
    pub fn poll<G, C, K, S>(&self, controller: &RelayController<G, C, K, S>) -> Result<Vec<Load>>
    where
        G: GpioPort,
        C: ConfigSource,
        K: Clock,
        S: EventSink,
    {
        let mut expired = Vec::new();
        for load in Load::ALL {
            if controller.expire_boost(load)? {
                info!("BoostExpiryPoller: {} boost ended", load);
                expired.push(load);
            }
        }
        Ok(expired)
    }

    /// Poll forever.  Hardware faults are logged, not retried: a boost
    /// whose relay write failed has already been cleared.
    pub fn run<G, C, K, S>(&self, controller: &RelayController<G, C, K, S>) -> !
    where
        G: GpioPort,
        C: ConfigSource,
        K: Clock,
        S: EventSink,
    {
        info!("BoostExpiryPoller: polling every {:?}", self.interval);
        loop {
            if let Err(e) = self.poll(controller) {
                warn!("BoostExpiryPoller: pass failed: {}", e);
            }
            thread::sleep(self.interval);
        }
    }
}
