//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing controller events to the `log`
//! facade (serial console on the device, stderr in simulation).  A web
//! socket or MQTT adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::RelayEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`RelayEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &RelayEvent) {
        match *event {
            RelayEvent::Reset => info!("RELAY | reset, all loads off"),
            RelayEvent::Opened => info!("RELAY | pins opened"),
            RelayEvent::Closed => info!("RELAY | pins closed"),
            RelayEvent::Switched { load, on } => {
                info!("RELAY | {} {}", load, if on { "ON" } else { "OFF" });
            }
            RelayEvent::TurnOnRejected { load } => {
                warn!("RULE  | {} turn-on refused: holiday", load);
            }
            RelayEvent::TurnOffRejected { load } => {
                warn!("RULE  | {} turn-off refused: boost active", load);
            }
            RelayEvent::BoostStarted { load, off_time_ms } => {
                info!("BOOST | {} until {}", load, off_time_ms);
            }
            RelayEvent::BoostCancelled { load } => info!("BOOST | {} cancelled", load),
            RelayEvent::BoostExpired { load } => info!("BOOST | {} expired", load),
            RelayEvent::BoostSuppressed { load } => {
                warn!("BOOST | {} suppressed: holiday", load);
            }
        }
    }
}
