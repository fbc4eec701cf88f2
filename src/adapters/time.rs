//! Wall-clock time adapter.
//!
//! Implements [`Clock`] from the system real-time clock.  On the device
//! the RTC is set by SNTP; until then it counts from 1970, which
//! [`SystemClock::is_synced`] detects.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::app::ports::Clock;

/// 2020-01-01T00:00:00Z.  Anything earlier means the clock was never set.
const EPOCH_2020_MS: i64 = 1_577_836_800_000;

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }

    /// Whether the wall clock looks set.  Holiday and boost times are
    /// meaningless before it is.
    pub fn is_synced(&self) -> bool {
        self.now_millis() >= EPOCH_2020_MS
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
            // Clock set before 1970.
            Err(e) => -i64::try_from(e.duration().as_millis()).unwrap_or(i64::MAX),
        }
    }
}
