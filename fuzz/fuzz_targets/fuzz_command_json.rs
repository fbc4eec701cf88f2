//! Fuzz target: `RelayCommand::from_json`
//!
//! Feeds arbitrary text to the console command parser and drives any
//! command it accepts through a simulated controller.
//!
//! Invariants checked:
//! - No panics under any input
//! - After every command a boosted load is also on
//!
//! cargo fuzz run fuzz_command_json

#![no_main]

use std::sync::atomic::{AtomicI64, Ordering};

use heatrelay::adapters::log_sink::LogEventSink;
use heatrelay::adapters::nvs::NvsConfigStore;
use heatrelay::adapters::sim_gpio::SimGpio;
use heatrelay::app::commands::RelayCommand;
use heatrelay::app::controller::RelayController;
use heatrelay::app::load::Load;
use heatrelay::app::ports::Clock;
use heatrelay::config::{BOOST_TIME_KEY, ConfigValue};
use libfuzzer_sys::fuzz_target;

struct FixedClock(AtomicI64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    let store = NvsConfigStore::new();
    store
        .set(BOOST_TIME_KEY, &ConfigValue::from_i32(30))
        .unwrap();
    let controller = RelayController::new(
        SimGpio::new(),
        store,
        FixedClock(AtomicI64::new(1_000)),
        LogEventSink::new(),
    )
    .unwrap();

    for line in text.lines() {
        if let Some(cmd) = RelayCommand::from_json(line) {
            let _ = controller.handle_command(cmd);
        }
        for load in Load::ALL {
            if controller.is_boost_on(load) {
                assert!(controller.is_on(load), "{load} boosted but off");
            }
        }
    }
});
