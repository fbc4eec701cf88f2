//! GPIO pin assignments for the relay controller board.
//!
//! Single source of truth: the controller and the pin registry reference
//! this module rather than hard-coding pin numbers.  Change a role here and
//! it propagates everywhere.
//!
//! Logical pins are named by 26-way header position and SoC GPIO number.
//! The driver addresses lines by its own numbering, so every logical pin is
//! translated through [`LogicalPin::address`] before it reaches hardware.

use core::fmt;

// ---------------------------------------------------------------------------
// Logical pins
// ---------------------------------------------------------------------------

/// Every GPIO-capable pin on the 26-way header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogicalPin {
    Pin3Gpio0 = 0,
    Pin5Gpio1 = 1,
    Pin7Gpio4 = 2,
    Pin8Gpio14 = 3,
    Pin10Gpio15 = 4,
    Pin11Gpio17 = 5,
    Pin12Gpio18 = 6,
    Pin13Gpio21 = 7,
    Pin15Gpio22 = 8,
    Pin16Gpio23 = 9,
    Pin18Gpio24 = 10,
    Pin19Gpio10 = 11,
    Pin21Gpio9 = 12,
    Pin22Gpio25 = 13,
    Pin23Gpio11 = 14,
    Pin24Gpio8 = 15,
    Pin26Gpio7 = 16,
}

impl LogicalPin {
    /// Total number of logical pins, used to size per-pin tables.
    pub const COUNT: usize = 17;

    /// All logical pins in table order.
    pub const ALL: [LogicalPin; Self::COUNT] = [
        Self::Pin3Gpio0,
        Self::Pin5Gpio1,
        Self::Pin7Gpio4,
        Self::Pin8Gpio14,
        Self::Pin10Gpio15,
        Self::Pin11Gpio17,
        Self::Pin12Gpio18,
        Self::Pin13Gpio21,
        Self::Pin15Gpio22,
        Self::Pin16Gpio23,
        Self::Pin18Gpio24,
        Self::Pin19Gpio10,
        Self::Pin21Gpio9,
        Self::Pin22Gpio25,
        Self::Pin23Gpio11,
        Self::Pin24Gpio8,
        Self::Pin26Gpio7,
    ];

    /// Position of this pin in per-pin tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Translate to the driver's line number.
    ///
    /// Returns `None` for pins the board does not route to the driver.
    /// Header pins 3 and 5 carry the I²C bus and are never handed out.
    pub const fn address(self) -> Option<PhysicalAddress> {
        let line = match self {
            Self::Pin3Gpio0 | Self::Pin5Gpio1 => return None,
            Self::Pin7Gpio4 => 7,
            Self::Pin8Gpio14 => 15,
            Self::Pin10Gpio15 => 16,
            Self::Pin11Gpio17 => 0,
            Self::Pin12Gpio18 => 1,
            Self::Pin13Gpio21 => 2,
            Self::Pin15Gpio22 => 3,
            Self::Pin16Gpio23 => 4,
            Self::Pin18Gpio24 => 5,
            Self::Pin19Gpio10 => 12,
            Self::Pin21Gpio9 => 13,
            Self::Pin22Gpio25 => 6,
            Self::Pin23Gpio11 => 14,
            Self::Pin24Gpio8 => 10,
            Self::Pin26Gpio7 => 11,
        };
        Some(PhysicalAddress(line))
    }
}

impl fmt::Display for LogicalPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ---------------------------------------------------------------------------
// Physical addresses
// ---------------------------------------------------------------------------

/// Driver-level line number of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhysicalAddress(u8);

impl PhysicalAddress {
    pub const fn number(self) -> u8 {
        self.0
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Board roles
// ---------------------------------------------------------------------------

/// Relay 2, heating circuit.  Active HIGH.
pub const HEATING_RELAY: LogicalPin = LogicalPin::Pin18Gpio24;
/// Relay 1, hot-water (boiler) circuit.  Active HIGH.
pub const WATER_RELAY: LogicalPin = LogicalPin::Pin23Gpio11;

/// Front-panel switch 1.  Shares its line with the heating relay, so
/// reading it reassigns the pin to input.
pub const SWITCH_1: LogicalPin = LogicalPin::Pin18Gpio24;
/// Front-panel switch 2.
pub const SWITCH_2: LogicalPin = LogicalPin::Pin26Gpio7;

/// Relay level that energises a load.
pub const RELAY_ON: bool = true;
/// Relay level that de-energises a load.
pub const RELAY_OFF: bool = false;
