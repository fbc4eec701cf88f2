//! System configuration parameters
//!
//! The controller reads three keys from its [`ConfigSource`] on demand:
//! the holiday window bounds and the default boost length.  Values are
//! stored as short decimal strings so any key/value backend can hold them.
//!
//! [`ConfigSource`]: crate::app::ports::ConfigSource

use core::fmt::Write;

use serde::{Deserialize, Serialize};

/// Start of the holiday window, epoch milliseconds.
pub const HOLIDAY_FROM_KEY: &str = "holidayFrom";
/// End of the holiday window, epoch milliseconds.
pub const HOLIDAY_UNTIL_KEY: &str = "holidayUntil";
/// Default boost length in minutes.
pub const BOOST_TIME_KEY: &str = "boostTime";
/// Boost expiry poll interval in milliseconds.
pub const EXPIRY_POLL_KEY: &str = "expiryPollMs";

/// Longest stored value: fits `i64::MIN` in decimal.
pub const CONFIG_VALUE_LEN: usize = 24;

// ---------------------------------------------------------------------------
// Config values
// ---------------------------------------------------------------------------

/// A single stored configuration value with typed accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigValue(heapless::String<CONFIG_VALUE_LEN>);

impl ConfigValue {
    /// Build a value from text.  Returns `None` if it does not fit.
    pub fn new(text: &str) -> Option<Self> {
        let mut s = heapless::String::new();
        s.push_str(text.trim()).ok()?;
        Some(Self(s))
    }

    pub fn from_i64(value: i64) -> Self {
        let mut s = heapless::String::new();
        // Capacity covers every i64.
        let _ = write!(s, "{value}");
        Self(s)
    }

    pub fn from_i32(value: i32) -> Self {
        Self::from_i64(value as i64)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret as a 64-bit integer (epoch millis).
    pub fn as_i64(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    /// Interpret as a 32-bit integer (minutes).
    pub fn as_i32(&self) -> Option<i32> {
        self.0.parse().ok()
    }
}

// ---------------------------------------------------------------------------
// System configuration
// ---------------------------------------------------------------------------

/// Persisted controller configuration, as written by a front end.
///
/// `None` for a holiday bound means the key is absent, which disables the
/// holiday window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfig {
    /// Holiday window start (epoch ms).
    pub holiday_from: Option<i64>,
    /// Holiday window end (epoch ms).
    pub holiday_until: Option<i64>,
    /// Default boost length (minutes).
    pub boost_time: Option<i32>,
    /// Boost expiry poll interval (milliseconds).
    pub expiry_poll_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            holiday_from: None,
            holiday_until: None,
            boost_time: Some(30),
            expiry_poll_interval_ms: 10_000, // 0.1 Hz
        }
    }
}
