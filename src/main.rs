//! HeatRelay firmware entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                   │
//! │                                                          │
//! │  EspGpio        NvsConfigStore   SystemClock  LogEventSink│
//! │  (GpioPort)     (ConfigSource)   (Clock)      (EventSink) │
//! │                                                          │
//! │  ─────────────── Port Trait Boundary ───────────────     │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────┐      │
//! │  │        RelayController (pure rules)            │      │
//! │  │  heating · water · boost · holiday             │      │
//! │  └────────────────────────────────────────────────┘      │
//! │                                                          │
//! │  Console thread (JSON commands) · BoostExpiryPoller      │
//! └──────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::io::BufRead;
use std::sync::Arc;
use std::thread;

use anyhow::Result;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{info, warn};

use heatrelay::adapters::gpio::EspGpio;
use heatrelay::adapters::log_sink::LogEventSink;
use heatrelay::adapters::nvs::NvsConfigStore;
use heatrelay::adapters::time::SystemClock;
use heatrelay::app::commands::RelayCommand;
use heatrelay::app::controller::RelayController;
use heatrelay::config::SystemConfig;
use heatrelay::expiry::BoostExpiryPoller;

type Controller = RelayController<EspGpio, NvsConfigStore, SystemClock, LogEventSink>;

const CONSOLE_STACK_SIZE: usize = 8 * 1024;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("HeatRelay v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Config store ───────────────────────────────────────
    let store = NvsConfigStore::new(EspDefaultNvsPartition::take()?)?;
    let mut config = store.load();
    if config.boost_time.is_none() {
        config.boost_time = SystemConfig::default().boost_time;
        match store.save(&config) {
            Ok(()) => info!("Config: seeded default boost time"),
            Err(e) => warn!("Config: seeding defaults failed ({})", e),
        }
    }

    let clock = SystemClock::new();
    if !clock.is_synced() {
        warn!("Clock not set yet; holiday and boost times will be off until SNTP syncs");
    }

    // ── 3. Controller (forces both relays off) ────────────────
    let controller: Arc<Controller> = Arc::new(RelayController::new(
        EspGpio::new(),
        store,
        clock,
        LogEventSink::new(),
    )?);
    controller.open()?;

    // ── 4. Serial console ─────────────────────────────────────
    let console = Arc::clone(&controller);
    thread::Builder::new()
        .name("console".into())
        .stack_size(CONSOLE_STACK_SIZE)
        .spawn(move || run_console(&console))?;

    // ── 5. Boost expiry (never returns) ───────────────────────
    BoostExpiryPoller::from_config(&config).run(&controller)
}

/// Read newline-delimited JSON commands from the UART console.
fn run_console(controller: &Controller) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { continue };
        if line.trim().is_empty() {
            continue;
        }
        let Some(cmd) = RelayCommand::from_json(&line) else {
            continue;
        };
        match controller.handle_command(cmd) {
            Ok(result) => info!("Console: {:?} -> {}", cmd, result),
            Err(e) => warn!("Console: {:?} failed: {}", cmd, e),
        }
        match serde_json::to_string(&controller.status()) {
            Ok(status) => info!("Console: status {}", status),
            Err(e) => warn!("Console: status encode failed: {}", e),
        }
    }
}
