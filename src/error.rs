//! Unified error types for the relay controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! caller's error handling uniform.  All variants are `Copy`.
//!
//! Business-rule refusals (holiday on `turn_on`, boost on `turn_off`) are
//! **not** errors; they come back as `Ok(false)`.

use core::fmt;

use embedded_hal::digital::ErrorKind;

use crate::pins::LogicalPin;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The pin has no physical address on this board.
    UnmappedPin(LogicalPin),
    /// The GPIO driver failed an open, read or write.  Never retried:
    /// the effect of a failed relay write is unknown.
    HardwareFault {
        pin: LogicalPin,
        op: GpioOp,
        kind: ErrorKind,
    },
    /// A required configuration key is missing or invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnmappedPin(pin) => write!(f, "pin {pin} has no physical address"),
            Self::HardwareFault { pin, op, kind } => {
                write!(f, "hardware fault on {pin} during {op}: {kind}")
            }
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// GPIO operations
// ---------------------------------------------------------------------------

/// The driver primitive that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioOp {
    OpenInput,
    OpenOutput,
    Read,
    Write,
}

impl fmt::Display for GpioOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenInput => write!(f, "open as input"),
            Self::OpenOutput => write!(f, "open as output"),
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The key has no stored value.
    MissingKey(&'static str),
    /// The stored value does not parse as the expected type or range.
    Invalid(&'static str),
    /// A value was rejected before persisting.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Stored blob failed to decode or encode.
    Corrupted,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingKey(key) => write!(f, "missing key '{key}'"),
            Self::Invalid(key) => write!(f, "invalid value for '{key}'"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::Corrupted => write!(f, "stored value corrupted"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
