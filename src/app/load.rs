//! Per-load relay state.
//!
//! ```text
//!  from     │ event        │ to       │ guard
//!  ─────────┼──────────────┼──────────┼──────────────────────────
//!  Off      │ turn_on      │ On       │ not holiday
//!  Off      │ turn_on      │ Off      │ holiday (refused)
//!  Off / On │ toggle_boost │ Boosted  │ not holiday
//!  Off / On │ toggle_boost │ Off      │ holiday (forced off)
//!  On       │ turn_off     │ Off      │
//!  Boosted  │ turn_off     │ Boosted  │ refused
//!  Boosted  │ toggle_boost │ Off      │ cancel, then off
//! ```
//!
//! `turn_off` is refused while boosted, and `turn_on` is refused during a
//! holiday.  A load can only be boosted while it is on: the boost deadline
//! lives inside the `Boosted` phase.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::pins::{self, LogicalPin};

/// The two switched circuits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Load {
    Heating,
    Water,
}

impl Load {
    pub const ALL: [Load; 2] = [Load::Heating, Load::Water];

    /// Relay pin that switches this load.
    pub const fn relay_pin(self) -> LogicalPin {
        match self {
            Self::Heating => pins::HEATING_RELAY,
            Self::Water => pins::WATER_RELAY,
        }
    }
}

impl fmt::Display for Load {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heating => write!(f, "heating"),
            Self::Water => write!(f, "water"),
        }
    }
}

/// Where a load sits in its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Off,
    On,
    /// On with a boost override; `off_time_ms` is when the boost is due to
    /// end (epoch ms).  Nothing inside the controller acts on it.
    Boosted { off_time_ms: i64 },
}

impl LoadPhase {
    pub fn is_on(self) -> bool {
        !matches!(self, Self::Off)
    }

    pub fn is_boosted(self) -> bool {
        matches!(self, Self::Boosted { .. })
    }

    pub fn boost_off_time(self) -> Option<i64> {
        match self {
            Self::Boosted { off_time_ms } => Some(off_time_ms),
            _ => None,
        }
    }
}

/// Serialisable view of one load for front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadStatus {
    pub load: Load,
    pub is_on: bool,
    pub boost_active: bool,
    pub boost_off_time: Option<i64>,
}

impl LoadStatus {
    pub fn new(load: Load, phase: LoadPhase) -> Self {
        Self {
            load,
            is_on: phase.is_on(),
            boost_active: phase.is_boosted(),
            boost_off_time: phase.boost_off_time(),
        }
    }
}

/// Boost deadline `minutes` after `now_ms`.
pub fn boost_deadline(now_ms: i64, minutes: u32) -> i64 {
    now_ms.saturating_add(i64::from(minutes) * 60_000)
}
