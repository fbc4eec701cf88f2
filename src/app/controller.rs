//! Relay controller, the hexagonal core.
//!
//! [`RelayController`] owns the pin registry and the state of both loads,
//! and enforces the boost and holiday rules.  Configuration, time, GPIO
//! and event output all flow through port traits, so the whole controller
//! runs against mock adapters in tests.
//!
//! ```text
//!  ConfigSource ──▶ ┌─────────────────────────┐ ──▶ EventSink
//!         Clock ──▶ │    RelayController      │
//!                   │  heating · water rules  │
//!                   └────────────┬────────────┘
//!                                ▼
//!                   PinRegistry ──▶ GpioPort
//! ```
//!
//! ## Concurrency
//!
//! One controller is shared by reference between callers (web handlers,
//! the boost expiry poller).  Load state, the registry and the event sink
//! sit behind a single mutex, and every check-then-act sequence runs with
//! it held.  Pin reconfiguration is therefore serialised at this boundary,
//! including when one line serves more than one role.
//!
//! ## Boost expiry
//!
//! The boost off time is recorded but never acted on here.  An external
//! poller ([`crate::expiry::BoostExpiryPoller`]) calls
//! [`RelayController::expire_boost`] once it has passed.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{info, warn};

use crate::config::{BOOST_TIME_KEY, HOLIDAY_FROM_KEY, HOLIDAY_UNTIL_KEY};
use crate::drivers::pin_registry::PinRegistry;
use crate::error::{ConfigError, Result};
use crate::pins::{RELAY_OFF, RELAY_ON};

use super::commands::RelayCommand;
use super::events::RelayEvent;
use super::load::{Load, LoadPhase, LoadStatus, boost_deadline};
use super::ports::{Clock, ConfigSource, EventSink, GpioPort};

// ───────────────────────────────────────────────────────────────
// RelayController
// ───────────────────────────────────────────────────────────────

pub struct RelayController<G, C, K, S>
where
    G: GpioPort,
    C: ConfigSource,
    K: Clock,
    S: EventSink,
{
    config: C,
    clock: K,
    inner: Mutex<Inner<G, S>>,
}

/// Everything guarded by the controller lock.
struct Inner<G: GpioPort, S: EventSink> {
    pins: PinRegistry<G>,
    heating: LoadPhase,
    water: LoadPhase,
    sink: S,
}

impl<G, C, K, S> RelayController<G, C, K, S>
where
    G: GpioPort,
    C: ConfigSource,
    K: Clock,
    S: EventSink,
{
    /// Build the controller and force both relays off.
    ///
    /// The hardware may have been left energised by a previous run, so
    /// both relay pins are driven low regardless of what they were.
    pub fn new(gpio: G, config: C, clock: K, sink: S) -> Result<Self> {
        let mut inner = Inner {
            pins: PinRegistry::new(gpio),
            heating: LoadPhase::Off,
            water: LoadPhase::Off,
            sink,
        };
        for load in Load::ALL {
            inner.switch_off(load)?;
        }
        inner.sink.emit(&RelayEvent::Reset);
        info!("RelayController: heating and water forced off");

        Ok(Self {
            config,
            clock,
            inner: Mutex::new(inner),
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Claim both relay pins as outputs.  Call once at startup.
    pub fn open(&self) -> Result<()> {
        let mut inner = self.lock();
        for load in Load::ALL {
            inner.pins.set_as_output(load.relay_pin())?;
        }
        inner.sink.emit(&RelayEvent::Opened);
        info!("RelayController: relay pins claimed");
        Ok(())
    }

    /// Release both relay pins.  Call once at shutdown.
    pub fn close(&self) -> Result<()> {
        let mut inner = self.lock();
        for load in Load::ALL {
            inner.pins.close(load.relay_pin())?;
        }
        inner.sink.emit(&RelayEvent::Closed);
        info!("RelayController: relay pins released");
        Ok(())
    }

    // ── Rules ─────────────────────────────────────────────────

    /// Switch `load` on.  Returns `Ok(false)` if a holiday refuses it.
    pub fn turn_on(&self, load: Load) -> Result<bool> {
        let mut inner = self.lock();
        if inner.phase(load).is_on() {
            return Ok(true);
        }
        if self.holiday_at(self.clock.now_millis()) {
            inner.sink.emit(&RelayEvent::TurnOnRejected { load });
            return Ok(false);
        }
        inner.switch_on(load)?;
        Ok(true)
    }

    /// Switch `load` off.  Returns `Ok(false)` if a boost refuses it.
    pub fn turn_off(&self, load: Load) -> Result<bool> {
        self.lock().turn_off(load)
    }

    /// Toggle the boost override on `load` for `minutes`.
    ///
    /// * boosted → boost cancelled, load switched off;
    /// * holiday → load forced off, no boost;
    /// * otherwise → load on and boosted until `now + minutes`.
    ///
    /// Returns whether the load ends up on.
    pub fn toggle_boost(&self, load: Load, minutes: u32) -> Result<bool> {
        let mut inner = self.lock();
        let now = self.clock.now_millis();

        match inner.phase(load) {
            LoadPhase::Boosted { .. } => {
                *inner.phase_mut(load) = LoadPhase::On;
                inner.sink.emit(&RelayEvent::BoostCancelled { load });
                inner.turn_off(load)?;
            }
            _ if self.holiday_at(now) => {
                inner.sink.emit(&RelayEvent::BoostSuppressed { load });
                inner.turn_off(load)?;
            }
            phase => {
                let off_time_ms = boost_deadline(now, minutes);
                if !phase.is_on() {
                    inner.switch_on(load)?;
                }
                *inner.phase_mut(load) = LoadPhase::Boosted { off_time_ms };
                inner.sink.emit(&RelayEvent::BoostStarted { load, off_time_ms });
            }
        }
        Ok(inner.phase(load).is_on())
    }

    /// [`toggle_boost`](Self::toggle_boost) with the length taken from the
    /// `boostTime` key.
    pub fn toggle_boost_default(&self, load: Load) -> Result<bool> {
        let minutes = self.default_boost_minutes()?;
        self.toggle_boost(load, minutes)
    }

    /// End the boost on `load` if its off time has passed: the boost is
    /// cleared and the load switched off.  Returns whether it expired.
    pub fn expire_boost(&self, load: Load) -> Result<bool> {
        let mut inner = self.lock();
        let now = self.clock.now_millis();
        match inner.phase(load) {
            LoadPhase::Boosted { off_time_ms } if now >= off_time_ms => {
                *inner.phase_mut(load) = LoadPhase::On;
                inner.sink.emit(&RelayEvent::BoostExpired { load });
                inner.turn_off(load)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Whether `now` lies strictly inside the configured holiday window.
    /// With either bound missing there is no holiday.
    pub fn is_holiday_period(&self) -> bool {
        self.holiday_at(self.clock.now_millis())
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.  Returns the operation's result.
    pub fn handle_command(&self, cmd: RelayCommand) -> Result<bool> {
        match cmd {
            RelayCommand::TurnOn { load } => self.turn_on(load),
            RelayCommand::TurnOff { load } => self.turn_off(load),
            RelayCommand::ToggleBoost {
                load,
                minutes: Some(minutes),
            } => self.toggle_boost(load, minutes),
            RelayCommand::ToggleBoost {
                load,
                minutes: None,
            } => self.toggle_boost_default(load),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_on(&self, load: Load) -> bool {
        self.lock().phase(load).is_on()
    }

    pub fn is_boost_on(&self, load: Load) -> bool {
        self.lock().phase(load).is_boosted()
    }

    /// When the current boost is due to end (epoch ms); `None` unless boosted.
    pub fn boost_off_time(&self, load: Load) -> Option<i64> {
        self.lock().phase(load).boost_off_time()
    }

    pub fn phase(&self, load: Load) -> LoadPhase {
        self.lock().phase(load)
    }

    /// Snapshot of both loads, taken under one lock.
    pub fn status(&self) -> [LoadStatus; 2] {
        let inner = self.lock();
        Load::ALL.map(|load| LoadStatus::new(load, inner.phase(load)))
    }

    /// Current wall-clock time as seen by the controller.
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Run `f` on the pin registry under the controller lock, e.g. to read
    /// a front-panel switch.  Reading a relay line reassigns it to input.
    pub fn with_pins<R>(&self, f: impl FnOnce(&mut PinRegistry<G>) -> R) -> R {
        f(&mut self.lock().pins)
    }

    // ── Per-load wrappers ─────────────────────────────────────

    pub fn turn_heating_on(&self) -> Result<bool> {
        self.turn_on(Load::Heating)
    }

    pub fn turn_heating_off(&self) -> Result<bool> {
        self.turn_off(Load::Heating)
    }

    pub fn turn_water_on(&self) -> Result<bool> {
        self.turn_on(Load::Water)
    }

    pub fn turn_water_off(&self) -> Result<bool> {
        self.turn_off(Load::Water)
    }

    pub fn toggle_heating_boost(&self, minutes: u32) -> Result<bool> {
        self.toggle_boost(Load::Heating, minutes)
    }

    pub fn toggle_heating_boost_default(&self) -> Result<bool> {
        self.toggle_boost_default(Load::Heating)
    }

    pub fn toggle_water_boost(&self, minutes: u32) -> Result<bool> {
        self.toggle_boost(Load::Water, minutes)
    }

    pub fn toggle_water_boost_default(&self) -> Result<bool> {
        self.toggle_boost_default(Load::Water)
    }

    pub fn is_heating_on(&self) -> bool {
        self.is_on(Load::Heating)
    }

    pub fn is_water_on(&self) -> bool {
        self.is_on(Load::Water)
    }

    pub fn is_heating_boost_on(&self) -> bool {
        self.is_boost_on(Load::Heating)
    }

    pub fn is_water_boost_on(&self) -> bool {
        self.is_boost_on(Load::Water)
    }

    pub fn heating_boost_off_time(&self) -> Option<i64> {
        self.boost_off_time(Load::Heating)
    }

    pub fn water_boost_off_time(&self) -> Option<i64> {
        self.boost_off_time(Load::Water)
    }

    // ── Internal ──────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, Inner<G, S>> {
        // State is only updated after the hardware write it depends on,
        // so a panicked holder cannot leave it half-written.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn holiday_at(&self, now: i64) -> bool {
        match (
            self.config_millis(HOLIDAY_FROM_KEY),
            self.config_millis(HOLIDAY_UNTIL_KEY),
        ) {
            (Some(from), Some(until)) => now > from && now < until,
            _ => false,
        }
    }

    fn config_millis(&self, key: &'static str) -> Option<i64> {
        let value = self.config.get(key)?;
        let millis = value.as_i64();
        if millis.is_none() {
            warn!("config: '{}' = '{}' is not epoch millis, ignored", key, value.as_str());
        }
        millis
    }

    fn default_boost_minutes(&self) -> Result<u32> {
        let value = self
            .config
            .get(BOOST_TIME_KEY)
            .ok_or(ConfigError::MissingKey(BOOST_TIME_KEY))?;
        let minutes = value
            .as_i32()
            .and_then(|m| u32::try_from(m).ok())
            .ok_or(ConfigError::Invalid(BOOST_TIME_KEY))?;
        Ok(minutes)
    }
}

impl<G: GpioPort, S: EventSink> Inner<G, S> {
    fn phase(&self, load: Load) -> LoadPhase {
        match load {
            Load::Heating => self.heating,
            Load::Water => self.water,
        }
    }

    fn phase_mut(&mut self, load: Load) -> &mut LoadPhase {
        match load {
            Load::Heating => &mut self.heating,
            Load::Water => &mut self.water,
        }
    }

    fn turn_off(&mut self, load: Load) -> Result<bool> {
        match self.phase(load) {
            LoadPhase::Off => Ok(true),
            LoadPhase::Boosted { .. } => {
                self.sink.emit(&RelayEvent::TurnOffRejected { load });
                Ok(false)
            }
            LoadPhase::On => {
                self.switch_off(load)?;
                Ok(true)
            }
        }
    }

    /// Energise the relay; the phase only changes once the write succeeded.
    fn switch_on(&mut self, load: Load) -> Result<()> {
        self.pins.set_value(load.relay_pin(), RELAY_ON)?;
        *self.phase_mut(load) = LoadPhase::On;
        self.sink.emit(&RelayEvent::Switched { load, on: true });
        Ok(())
    }

    fn switch_off(&mut self, load: Load) -> Result<()> {
        self.pins.set_value(load.relay_pin(), RELAY_OFF)?;
        *self.phase_mut(load) = LoadPhase::Off;
        self.sink.emit(&RelayEvent::Switched { load, on: false });
        Ok(())
    }
}
