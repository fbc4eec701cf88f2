//! Inbound commands to the controller.
//!
//! These represent actions requested by the outside world (web front end,
//! serial console, scheduler) that the
//! [`RelayController`](super::controller::RelayController) interprets and
//! acts upon.

use serde::{Deserialize, Serialize};

use super::load::Load;

/// Commands that external adapters can send into the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum RelayCommand {
    /// Switch a load on (refused during a holiday).
    TurnOn { load: Load },

    /// Switch a load off (refused while boosted).
    TurnOff { load: Load },

    /// Toggle boost.  `None` takes the length from the `boostTime` key.
    ToggleBoost { load: Load, minutes: Option<u32> },
}

impl RelayCommand {
    /// Parse one JSON command, e.g. `{"command":"turnOn","load":"water"}`.
    pub fn from_json(text: &str) -> Option<Self> {
        match serde_json::from_str(text.trim()) {
            Ok(cmd) => Some(cmd),
            Err(e) => {
                log::warn!("RelayCommand: rejected '{}': {}", text.trim(), e);
                None
            }
        }
    }
}
