//! Integration tests for the RelayController rules.
//!
//! Each test drives the controller over the simulated GPIO bus and checks
//! both the returned result and what reached the relay lines.

use std::sync::Arc;
use std::thread;

use heatrelay::adapters::sim_gpio::SimGpio;
use heatrelay::app::commands::RelayCommand;
use heatrelay::app::events::RelayEvent;
use heatrelay::app::load::{Load, LoadPhase};
use heatrelay::config::{BOOST_TIME_KEY, HOLIDAY_FROM_KEY, HOLIDAY_UNTIL_KEY};
use heatrelay::error::{ConfigError, Error, GpioOp};
use heatrelay::expiry::BoostExpiryPoller;
use heatrelay::pins::{HEATING_RELAY, WATER_RELAY};

use crate::mock_hw::Rig;

const MINUTE: i64 = 60_000;

fn relay_level(rig: &Rig, load: Load) -> Option<bool> {
    rig.gpio
        .output_level(load.relay_pin().address().expect("relay pins are mapped"))
}

// ── Construction ──────────────────────────────────────────────

#[test]
fn construction_forces_both_loads_off() {
    let rig = Rig::new();
    for load in Load::ALL {
        assert!(!rig.controller.is_on(load));
        assert!(!rig.controller.is_boost_on(load));
        assert_eq!(rig.controller.boost_off_time(load), None);
        assert_eq!(relay_level(&rig, load), Some(false), "{load} relay not driven low");
    }
    assert_eq!(rig.sink.last(), Some(RelayEvent::Reset));
}

#[test]
fn construction_fails_when_relay_line_cannot_open() {
    let gpio = SimGpio::new();
    gpio.fail_opens(HEATING_RELAY.address().unwrap(), true);
    let result = heatrelay::app::controller::RelayController::new(
        gpio,
        Arc::new(crate::mock_hw::MockConfig::new()),
        Arc::new(crate::mock_hw::ManualClock::new(0)),
        crate::mock_hw::RecordingSink::new(),
    );
    assert!(matches!(
        result,
        Err(Error::HardwareFault {
            pin: HEATING_RELAY,
            op: GpioOp::OpenOutput,
            ..
        })
    ));
}

#[test]
fn open_and_close_manage_relay_handles() {
    let rig = Rig::new();
    rig.controller.open().unwrap();
    assert!(rig.controller.with_pins(|p| p.is_out_pin(HEATING_RELAY) && p.is_out_pin(WATER_RELAY)));

    rig.controller.close().unwrap();
    assert_eq!(rig.gpio.total_live_handles(), 0);
    assert!(rig.controller.with_pins(|p| !p.is_out_pin(HEATING_RELAY)));
    assert_eq!(rig.sink.last(), Some(RelayEvent::Closed));
}

// ── Holiday ───────────────────────────────────────────────────

#[test]
fn holiday_refuses_turn_on() {
    let rig = Rig::new();
    rig.config.set_holiday(1_000, 2_000);
    rig.clock.set(1_500);

    assert!(rig.controller.is_holiday_period());
    assert!(!rig.controller.turn_heating_on().unwrap());
    assert!(!rig.controller.is_heating_on());
    assert_eq!(relay_level(&rig, Load::Heating), Some(false));
    assert_eq!(
        rig.sink.last(),
        Some(RelayEvent::TurnOnRejected {
            load: Load::Heating
        })
    );
}

#[test]
fn no_holiday_keys_means_no_holiday() {
    let rig = Rig::new();
    for now in [i64::MIN, 0, 1_500, i64::MAX] {
        rig.clock.set(now);
        assert!(!rig.controller.is_holiday_period());
    }
    assert!(rig.controller.turn_water_on().unwrap());
    assert!(rig.controller.is_water_on());
    assert_eq!(relay_level(&rig, Load::Water), Some(true));
}

#[test]
fn one_holiday_key_alone_is_no_holiday() {
    let rig = Rig::new();
    rig.config.set_millis(HOLIDAY_FROM_KEY, 1_000);
    assert!(!rig.controller.is_holiday_period());

    rig.config.remove(HOLIDAY_FROM_KEY);
    rig.config.set_millis(HOLIDAY_UNTIL_KEY, 2_000);
    assert!(!rig.controller.is_holiday_period());
}

#[test]
fn holiday_bounds_are_exclusive() {
    let rig = Rig::new();
    rig.config.set_holiday(1_000, 2_000);

    rig.clock.set(1_000);
    assert!(!rig.controller.is_holiday_period());
    rig.clock.set(2_000);
    assert!(!rig.controller.is_holiday_period());
    rig.clock.set(1_001);
    assert!(rig.controller.is_holiday_period());
    rig.clock.set(1_999);
    assert!(rig.controller.is_holiday_period());
}

#[test]
fn garbled_holiday_value_is_ignored() {
    let rig = Rig::new();
    rig.config.set(HOLIDAY_FROM_KEY, "last tuesday");
    rig.config.set_millis(HOLIDAY_UNTIL_KEY, 2_000);
    assert!(!rig.controller.is_holiday_period());
    assert!(rig.controller.turn_heating_on().unwrap());
}

#[test]
fn holiday_edits_apply_to_next_request() {
    let rig = Rig::new();
    assert!(rig.controller.turn_heating_on().unwrap());
    assert!(rig.controller.turn_heating_off().unwrap());

    rig.config.set_holiday(1_000, 2_000);
    assert!(!rig.controller.turn_heating_on().unwrap());

    rig.config.remove(HOLIDAY_UNTIL_KEY);
    assert!(rig.controller.turn_heating_on().unwrap());
}

#[test]
fn holiday_does_not_switch_off_a_running_load() {
    let rig = Rig::new();
    assert!(rig.controller.turn_heating_on().unwrap());
    rig.config.set_holiday(1_000, 2_000);
    assert!(rig.controller.turn_heating_on().unwrap());
    assert!(rig.controller.is_heating_on());
}

// ── On / off ──────────────────────────────────────────────────

#[test]
fn turn_on_then_off() {
    let rig = Rig::new();
    assert!(rig.controller.turn_heating_on().unwrap());
    assert_eq!(relay_level(&rig, Load::Heating), Some(true));
    assert!(rig.controller.turn_heating_off().unwrap());
    assert!(!rig.controller.is_heating_on());
    assert_eq!(relay_level(&rig, Load::Heating), Some(false));
}

#[test]
fn loads_are_independent() {
    let rig = Rig::new();
    assert!(rig.controller.turn_water_on().unwrap());
    assert!(!rig.controller.is_heating_on());
    assert_eq!(relay_level(&rig, Load::Heating), Some(false));

    assert!(rig.controller.toggle_heating_boost(10).unwrap());
    assert!(!rig.controller.is_water_boost_on());
    assert!(rig.controller.turn_water_off().unwrap());
    assert!(rig.controller.is_heating_on());
}

#[test]
fn turn_off_is_refused_while_boosted() {
    let rig = Rig::new();
    assert!(rig.controller.toggle_heating_boost(30).unwrap());

    assert!(!rig.controller.turn_heating_off().unwrap());
    assert!(rig.controller.is_heating_on());
    assert!(rig.controller.is_heating_boost_on());
    assert_eq!(relay_level(&rig, Load::Heating), Some(true));
    assert_eq!(
        rig.sink.last(),
        Some(RelayEvent::TurnOffRejected {
            load: Load::Heating
        })
    );
}

#[test]
fn write_fault_leaves_state_unchanged() {
    let rig = Rig::new();
    rig.gpio.fail_io(WATER_RELAY.address().unwrap(), true);

    let err = rig.controller.turn_water_on().unwrap_err();
    assert!(matches!(
        err,
        Error::HardwareFault {
            pin: WATER_RELAY,
            op: GpioOp::Write,
            ..
        }
    ));
    assert!(!rig.controller.is_water_on());

    rig.gpio.fail_io(WATER_RELAY.address().unwrap(), false);
    assert!(rig.controller.turn_water_on().unwrap());
}

// ── Boost ─────────────────────────────────────────────────────

#[test]
fn water_boost_records_deadline() {
    let rig = Rig::new();
    let call_time = rig.controller.now_millis();

    assert!(rig.controller.toggle_water_boost(30).unwrap());
    assert!(rig.controller.is_water_on());
    assert!(rig.controller.is_water_boost_on());
    assert_eq!(
        rig.controller.water_boost_off_time(),
        Some(call_time + 30 * MINUTE)
    );
    assert!(rig.sink.contains(RelayEvent::BoostStarted {
        load: Load::Water,
        off_time_ms: call_time + 30 * MINUTE,
    }));
}

#[test]
fn boosting_a_running_load_keeps_relay_on() {
    let rig = Rig::new();
    assert!(rig.controller.turn_heating_on().unwrap());
    rig.gpio.clear_history();

    assert!(rig.controller.toggle_heating_boost(15).unwrap());
    assert!(rig.gpio.history().is_empty(), "no second write expected");
    assert_eq!(
        rig.controller.phase(Load::Heating),
        LoadPhase::Boosted {
            off_time_ms: 1_500 + 15 * MINUTE
        }
    );
}

#[test]
fn double_toggle_returns_to_off() {
    let rig = Rig::new();
    assert!(rig.controller.toggle_heating_boost(30).unwrap());
    assert!(!rig.controller.toggle_heating_boost(30).unwrap());

    assert!(!rig.controller.is_heating_on());
    assert!(!rig.controller.is_heating_boost_on());
    assert_eq!(rig.controller.heating_boost_off_time(), None);
    assert_eq!(relay_level(&rig, Load::Heating), Some(false));
    assert!(rig.sink.contains(RelayEvent::BoostCancelled {
        load: Load::Heating
    }));
}

#[test]
fn double_toggle_of_running_load_also_ends_off() {
    let rig = Rig::new();
    assert!(rig.controller.turn_water_on().unwrap());
    assert!(rig.controller.toggle_water_boost(5).unwrap());
    assert!(!rig.controller.toggle_water_boost(5).unwrap());
    assert!(!rig.controller.is_water_on());
}

#[test]
fn holiday_suppresses_boost_and_forces_off() {
    let rig = Rig::new();
    assert!(rig.controller.turn_heating_on().unwrap());
    rig.config.set_holiday(1_000, 2_000);

    assert!(!rig.controller.toggle_heating_boost(30).unwrap());
    assert!(!rig.controller.is_heating_on());
    assert!(!rig.controller.is_heating_boost_on());
    assert!(rig.sink.contains(RelayEvent::BoostSuppressed {
        load: Load::Heating
    }));
}

#[test]
fn cancelling_boost_during_holiday_still_switches_off() {
    let rig = Rig::new();
    assert!(rig.controller.toggle_water_boost(30).unwrap());
    rig.config.set_holiday(1_000, 2_000);

    assert!(!rig.controller.toggle_water_boost(30).unwrap());
    assert!(!rig.controller.is_water_on());
}

#[test]
fn default_boost_reads_boost_time_key() {
    let rig = Rig::new();
    rig.config.set_boost_time(45);
    assert!(rig.controller.toggle_heating_boost_default().unwrap());
    assert_eq!(
        rig.controller.heating_boost_off_time(),
        Some(1_500 + 45 * MINUTE)
    );
}

#[test]
fn default_boost_without_key_is_an_error() {
    let rig = Rig::new();
    rig.config.remove(BOOST_TIME_KEY);
    let err = rig.controller.toggle_water_boost_default().unwrap_err();
    assert_eq!(err, Error::Config(ConfigError::MissingKey(BOOST_TIME_KEY)));
    assert!(!rig.controller.is_water_on());
}

#[test]
fn default_boost_with_bad_key_is_an_error() {
    let rig = Rig::new();
    rig.config.set(BOOST_TIME_KEY, "-5");
    assert_eq!(
        rig.controller.toggle_heating_boost_default().unwrap_err(),
        Error::Config(ConfigError::Invalid(BOOST_TIME_KEY))
    );
    rig.config.set(BOOST_TIME_KEY, "half an hour");
    assert_eq!(
        rig.controller.toggle_heating_boost_default().unwrap_err(),
        Error::Config(ConfigError::Invalid(BOOST_TIME_KEY))
    );
}

#[test]
fn boost_is_not_expired_by_the_controller_itself() {
    let rig = Rig::new();
    assert!(rig.controller.toggle_heating_boost(1).unwrap());
    rig.clock.advance(24 * 60 * MINUTE);
    assert!(rig.controller.is_heating_boost_on());
    assert!(rig.controller.is_heating_on());
}

// ── Expiry ────────────────────────────────────────────────────

#[test]
fn expire_boost_waits_for_off_time() {
    let rig = Rig::new();
    assert!(rig.controller.toggle_water_boost(10).unwrap());

    rig.clock.advance(10 * MINUTE - 1);
    assert!(!rig.controller.expire_boost(Load::Water).unwrap());
    assert!(rig.controller.is_water_boost_on());

    rig.clock.advance(1);
    assert!(rig.controller.expire_boost(Load::Water).unwrap());
    assert!(!rig.controller.is_water_on());
    assert!(!rig.controller.is_water_boost_on());
    assert_eq!(relay_level(&rig, Load::Water), Some(false));
    assert!(rig.sink.contains(RelayEvent::BoostExpired { load: Load::Water }));
}

#[test]
fn expire_boost_ignores_unboosted_loads() {
    let rig = Rig::new();
    assert!(rig.controller.turn_heating_on().unwrap());
    rig.clock.advance(i64::from(u32::MAX));
    assert!(!rig.controller.expire_boost(Load::Heating).unwrap());
    assert!(rig.controller.is_heating_on());
}

#[test]
fn poller_expires_only_due_boosts() {
    let rig = Rig::new();
    assert!(rig.controller.toggle_heating_boost(5).unwrap());
    assert!(rig.controller.toggle_water_boost(60).unwrap());
    let poller = BoostExpiryPoller::new(std::time::Duration::from_millis(100));

    assert!(poller.poll(&rig.controller).unwrap().is_empty());

    rig.clock.advance(5 * MINUTE);
    assert_eq!(poller.poll(&rig.controller).unwrap(), vec![Load::Heating]);
    assert!(!rig.controller.is_heating_on());
    assert!(rig.controller.is_water_boost_on());

    rig.clock.advance(55 * MINUTE);
    assert_eq!(poller.poll(&rig.controller).unwrap(), vec![Load::Water]);
    assert!(!rig.controller.is_water_on());
}

// ── Commands and status ───────────────────────────────────────

#[test]
fn handle_command_dispatches() {
    let rig = Rig::new();
    let on = RelayCommand::from_json(r#"{"command":"turnOn","load":"heating"}"#).unwrap();
    assert!(rig.controller.handle_command(on).unwrap());
    assert!(rig.controller.is_heating_on());

    let boost = RelayCommand::ToggleBoost {
        load: Load::Water,
        minutes: None,
    };
    assert!(rig.controller.handle_command(boost).unwrap());
    assert_eq!(
        rig.controller.water_boost_off_time(),
        Some(1_500 + 30 * MINUTE)
    );

    let off = RelayCommand::TurnOff { load: Load::Water };
    assert!(!rig.controller.handle_command(off).unwrap());
}

#[test]
fn status_reports_both_loads() {
    let rig = Rig::new();
    assert!(rig.controller.toggle_water_boost(30).unwrap());
    let json = serde_json::to_string(&rig.controller.status()).unwrap();
    assert_eq!(
        json,
        concat!(
            r#"[{"load":"heating","isOn":false,"boostActive":false,"boostOffTime":null},"#,
            r#"{"load":"water","isOn":true,"boostActive":true,"boostOffTime":1801500}]"#
        )
    );
}

// ── Concurrency ───────────────────────────────────────────────

#[test]
fn concurrent_callers_keep_boost_implies_on() {
    let rig = Rig::new();
    let controller = Arc::new(rig.controller);

    let workers: Vec<_> = (0..8)
        .map(|i| {
            let c = Arc::clone(&controller);
            thread::spawn(move || {
                let load = if i % 2 == 0 { Load::Heating } else { Load::Water };
                for n in 0..200 {
                    match (i + n) % 4 {
                        0 => {
                            c.turn_on(load).unwrap();
                        }
                        1 => {
                            c.turn_off(load).unwrap();
                        }
                        2 => {
                            c.toggle_boost(load, 1).unwrap();
                        }
                        _ => {
                            for s in c.status() {
                                assert!(!s.boost_active || s.is_on, "{:?}", s);
                            }
                        }
                    }
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    for load in Load::ALL {
        let level = rig
            .gpio
            .output_level(load.relay_pin().address().unwrap());
        assert_eq!(level, Some(controller.is_on(load)), "{load} relay out of sync");
    }
}
