//! Outbound controller events.
//!
//! The [`RelayController`](super::controller::RelayController) emits these
//! through the [`EventSink`](super::ports::EventSink) port on every state
//! change and every refused request.  Adapters on the other side decide
//! what to do with them.

use super::load::Load;

/// Structured events emitted by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayEvent {
    /// Both loads were forced off at construction.
    Reset,

    /// Relay pins claimed as outputs.
    Opened,

    /// Relay pins released.
    Closed,

    /// A relay was switched.
    Switched { load: Load, on: bool },

    /// `turn_on` refused because a holiday is in progress.
    TurnOnRejected { load: Load },

    /// `turn_off` refused because the load is boosted.
    TurnOffRejected { load: Load },

    /// Boost entered; due to end at `off_time_ms` (epoch ms).
    BoostStarted { load: Load, off_time_ms: i64 },

    /// Boost toggled off by a caller.
    BoostCancelled { load: Load },

    /// Boost ended by the expiry poller.
    BoostExpired { load: Load },

    /// Boost requested during a holiday; the load was forced off instead.
    BoostSuppressed { load: Load },
}
