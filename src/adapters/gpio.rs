//! ESP-IDF GPIO backend.
//!
//! Implements [`GpioPort`] over `esp-idf-hal` pin drivers.  The registry
//! owns at most one driver per line and drops it before claiming the line
//! again, which is what makes conjuring the pin from its number sound.

use esp_idf_hal::gpio::{AnyIOPin, Input, Output, PinDriver};
use esp_idf_svc::sys::EspError;
use embedded_hal::digital::ErrorKind;
use log::{info, warn};

use crate::app::ports::GpioPort;
use crate::pins::PhysicalAddress;

/// GPIO driver backed by the ESP-IDF pin matrix.
pub struct EspGpio;

impl EspGpio {
    pub fn new() -> Self {
        info!("EspGpio: ESP-IDF pin drivers");
        Self
    }
}

impl Default for EspGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioPort for EspGpio {
    type Input = PinDriver<'static, AnyIOPin, Input>;
    type Output = PinDriver<'static, AnyIOPin, Output>;

    fn open_input(&mut self, address: PhysicalAddress) -> Result<Self::Input, ErrorKind> {
        // SAFETY: the registry holds at most one handle per address.
        let pin = unsafe { AnyIOPin::new(i32::from(address.number())) };
        PinDriver::input(pin).map_err(|e| driver_error(address, e))
    }

    fn open_output(&mut self, address: PhysicalAddress) -> Result<Self::Output, ErrorKind> {
        // SAFETY: as above.
        let pin = unsafe { AnyIOPin::new(i32::from(address.number())) };
        PinDriver::output(pin).map_err(|e| driver_error(address, e))
    }
}

fn driver_error(address: PhysicalAddress, e: EspError) -> ErrorKind {
    warn!("EspGpio: line {} open failed: {}", address.number(), e);
    ErrorKind::Other
}
