//! NVS (Non-Volatile Storage) configuration adapter.
//!
//! Implements [`ConfigSource`] for the relay controller and lets a front
//! end persist a validated [`SystemConfig`].
//!
//! Each key holds one postcard-encoded [`ConfigValue`].  A value that no
//! longer decodes is reported as absent, which for the holiday keys means
//! "no holiday".
//!
//! # Backends
//!
//! - **`target_os = "espidf"`**: the default NVS partition, namespace
//!   `heatrelay`.
//! - **`not(target_os = "espidf")`**: in-memory map for host-side testing
//!   and simulation.

use log::{info, warn};

use crate::app::ports::ConfigSource;
use crate::config::{
    BOOST_TIME_KEY, ConfigValue, EXPIRY_POLL_KEY, HOLIDAY_FROM_KEY, HOLIDAY_UNTIL_KEY,
    SystemConfig,
};
use crate::error::ConfigError;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;
#[cfg(not(target_os = "espidf"))]
use std::sync::RwLock;

#[cfg(target_os = "espidf")]
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
#[cfg(target_os = "espidf")]
use std::sync::Mutex;

#[cfg(target_os = "espidf")]
const CONFIG_NAMESPACE: &str = "heatrelay";

/// Largest encoded value: length prefix plus [`crate::config::CONFIG_VALUE_LEN`].
#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 32;

pub struct NvsConfigStore {
    #[cfg(not(target_os = "espidf"))]
    store: RwLock<HashMap<String, Vec<u8>>>,
    #[cfg(target_os = "espidf")]
    nvs: Mutex<EspNvs<NvsDefault>>,
}

#[cfg(not(target_os = "espidf"))]
impl Default for NvsConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NvsConfigStore {
    /// Create an empty simulation store.
    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        info!("NvsConfigStore: simulation backend");
        Self {
            store: RwLock::new(HashMap::new()),
        }
    }

    /// Open the controller namespace on the default NVS partition.
    #[cfg(target_os = "espidf")]
    pub fn new(partition: EspDefaultNvsPartition) -> Result<Self, ConfigError> {
        let nvs = EspNvs::new(partition, CONFIG_NAMESPACE, true).map_err(|e| {
            warn!("NvsConfigStore: open '{}' failed: {}", CONFIG_NAMESPACE, e);
            ConfigError::IoError
        })?;
        info!("NvsConfigStore: ESP-IDF NVS namespace '{}'", CONFIG_NAMESPACE);
        Ok(Self {
            nvs: Mutex::new(nvs),
        })
    }

    // ── Key access ────────────────────────────────────────────

    /// Store `value` under `key`.
    pub fn set(&self, key: &str, value: &ConfigValue) -> Result<(), ConfigError> {
        let bytes = postcard::to_allocvec(value).map_err(|_| ConfigError::Corrupted)?;
        self.write_raw(key, &bytes)
    }

    /// Delete `key`.  Succeeds even if the key didn't exist.
    pub fn remove(&self, key: &str) -> Result<(), ConfigError> {
        self.remove_raw(key)
    }

    // ── Whole-config access ───────────────────────────────────

    /// Validate and persist `config`.  `None` fields delete their key.
    pub fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        self.set_or_remove(HOLIDAY_FROM_KEY, config.holiday_from.map(ConfigValue::from_i64))?;
        self.set_or_remove(HOLIDAY_UNTIL_KEY, config.holiday_until.map(ConfigValue::from_i64))?;
        self.set_or_remove(BOOST_TIME_KEY, config.boost_time.map(ConfigValue::from_i32))?;
        self.set(
            EXPIRY_POLL_KEY,
            &ConfigValue::from_i64(i64::from(config.expiry_poll_interval_ms)),
        )?;
        info!("NvsConfigStore: config saved");
        Ok(())
    }

    /// Read the stored configuration.  Absent keys read as `None`; an absent
    /// poll interval falls back to the default.
    pub fn load(&self) -> SystemConfig {
        let millis = |key| self.get(key).and_then(|v| v.as_i64());
        SystemConfig {
            holiday_from: millis(HOLIDAY_FROM_KEY),
            holiday_until: millis(HOLIDAY_UNTIL_KEY),
            boost_time: self.get(BOOST_TIME_KEY).and_then(|v| v.as_i32()),
            expiry_poll_interval_ms: millis(EXPIRY_POLL_KEY)
                .and_then(|ms| u32::try_from(ms).ok())
                .unwrap_or_else(|| SystemConfig::default().expiry_poll_interval_ms),
        }
    }

    fn set_or_remove(&self, key: &str, value: Option<ConfigValue>) -> Result<(), ConfigError> {
        match value {
            Some(v) => self.set(key, &v),
            None => self.remove(key),
        }
    }

    // ── Backends ──────────────────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    fn read_raw(&self, key: &str) -> Option<Vec<u8>> {
        let store = self.store.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        store.get(key).cloned()
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut store = self.store.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        store.insert(key.to_owned(), data.to_vec());
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn remove_raw(&self, key: &str) -> Result<(), ConfigError> {
        let mut store = self.store.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        store.remove(key);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn read_raw(&self, key: &str) -> Option<Vec<u8>> {
        let nvs = self.nvs.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut buf = [0u8; MAX_BLOB_SIZE];
        match nvs.get_raw(key, &mut buf) {
            Ok(found) => found.map(<[u8]>::to_vec),
            Err(e) => {
                warn!("NvsConfigStore: read '{}' failed: {}", key, e);
                None
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn write_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut nvs = self.nvs.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        nvs.set_raw(key, data).map(|_| ()).map_err(|e| {
            warn!("NvsConfigStore: write '{}' failed: {}", key, e);
            ConfigError::IoError
        })
    }

    #[cfg(target_os = "espidf")]
    fn remove_raw(&self, key: &str) -> Result<(), ConfigError> {
        let mut nvs = self.nvs.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        nvs.remove(key).map(|_| ()).map_err(|e| {
            warn!("NvsConfigStore: remove '{}' failed: {}", key, e);
            ConfigError::IoError
        })
    }
}

impl ConfigSource for NvsConfigStore {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        let bytes = self.read_raw(key)?;
        match postcard::from_bytes(&bytes) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("NvsConfigStore: '{}' is corrupted, treating as absent", key);
                None
            }
        }
    }
}

fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    match (cfg.holiday_from, cfg.holiday_until) {
        (Some(from), Some(until)) if from >= until => {
            return Err(ConfigError::ValidationFailed(
                "holidayFrom must be before holidayUntil",
            ));
        }
        (Some(_), None) | (None, Some(_)) => {
            return Err(ConfigError::ValidationFailed(
                "holidayFrom and holidayUntil must be set together",
            ));
        }
        _ => {}
    }
    if let Some(mins) = cfg.boost_time {
        if !(1..=1440).contains(&mins) {
            return Err(ConfigError::ValidationFailed("boostTime must be 1..=1440 minutes"));
        }
    }
    if !(100..=600_000).contains(&cfg.expiry_poll_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "expiryPollMs must be 100..=600000",
        ));
    }
    Ok(())
}
