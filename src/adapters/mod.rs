//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to               |
//! |------------|--------------|---------------------------|
//! | `gpio`     | GpioPort     | ESP-IDF pin drivers       |
//! | `sim_gpio` | GpioPort     | In-memory bus (host only) |
//! | `log_sink` | EventSink    | Serial log output         |
//! | `nvs`      | ConfigSource | NVS / in-memory store     |
//! | `time`     | Clock        | System real-time clock    |

#[cfg(target_os = "espidf")]
pub mod gpio;
pub mod log_sink;
pub mod nvs;
#[cfg(not(target_os = "espidf"))]
pub mod sim_gpio;
pub mod time;
