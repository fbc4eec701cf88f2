//! GPIO pin registry.
//!
//! Multiplexes the board's logical pins between input and output roles.
//! Every operation first brings the pin into the mode it needs, doing the
//! smallest open/close sequence that gets there, then touches the line.
//!
//! ## Mode transitions
//!
//! ```text
//!  current \ requested │ Unassigned │ Input  │ Output
//!  ────────────────────┼────────────┼────────┼────────
//!  Unassigned          │ Keep       │ Open   │ Open
//!  Input               │ Release    │ Keep   │ Reopen
//!  Output              │ Release    │ Reopen │ Keep
//! ```
//!
//! `Reopen` drops the old handle before the driver is asked for the new
//! one, so a line never has two live handles.  If that open fails the pin
//! is left `Unassigned`.
//!
//! ## Dual-target design
//!
//! The registry is generic over [`GpioPort`]: ESP-IDF pin drivers on the
//! device, the simulation bus on host/test.

use embedded_hal::digital::{Error as _, InputPin, OutputPin, PinState};
use log::debug;

use crate::app::ports::GpioPort;
use crate::error::{Error, GpioOp, Result};
use crate::pins::{LogicalPin, PhysicalAddress};

// ---------------------------------------------------------------------------
// Modes and transitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Unassigned,
    Input,
    Output,
}

/// What the registry must do to move a pin between modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Already in the requested mode.
    Keep,
    /// Nothing open yet; open the requested handle.
    Open,
    /// Close the current handle, then open the requested one.
    Reopen,
    /// Close the current handle and leave the pin unassigned.
    Release,
}

/// The transition table, keyed by `(current, requested)`.
pub const fn transition(current: PinMode, requested: PinMode) -> Step {
    use PinMode::{Input, Output, Unassigned};
    match (current, requested) {
        (Unassigned, Unassigned) | (Input, Input) | (Output, Output) => Step::Keep,
        (Unassigned, Input | Output) => Step::Open,
        (Input, Output) | (Output, Input) => Step::Reopen,
        (Input | Output, Unassigned) => Step::Release,
    }
}

/// An open line.  The variant is the pin's mode.
enum PinHandle<I, O> {
    Input(I),
    Output(O),
}

impl<I, O> PinHandle<I, O> {
    fn mode(&self) -> PinMode {
        match self {
            Self::Input(_) => PinMode::Input,
            Self::Output(_) => PinMode::Output,
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Owns the GPIO driver and the handle table for every logical pin.
///
/// A slot holds a handle exactly when the pin is not `Unassigned`, and the
/// handle's kind is the pin's mode.  Slots start empty and are filled on
/// first use.
pub struct PinRegistry<G: GpioPort> {
    gpio: G,
    slots: [Option<PinHandle<G::Input, G::Output>>; LogicalPin::COUNT],
}

impl<G: GpioPort> PinRegistry<G> {
    pub fn new(gpio: G) -> Self {
        Self {
            gpio,
            slots: core::array::from_fn(|_| None),
        }
    }

    // ── Mode control ──────────────────────────────────────────

    /// Put `pin` in output mode, closing an input handle first.
    /// Calling it on a pin that is already an output does nothing.
    pub fn set_as_output(&mut self, pin: LogicalPin) -> Result<LogicalPin> {
        self.apply(pin, PinMode::Output)?;
        Ok(pin)
    }

    /// Put `pin` in input mode, closing an output handle first.
    pub fn set_as_input(&mut self, pin: LogicalPin) -> Result<LogicalPin> {
        self.apply(pin, PinMode::Input)?;
        Ok(pin)
    }

    /// Release whichever handle `pin` holds.  No-op when unassigned.
    pub fn close(&mut self, pin: LogicalPin) -> Result<()> {
        self.apply(pin, PinMode::Unassigned)
    }

    /// Release every open handle.  Returns how many were released.
    pub fn close_all(&mut self) -> usize {
        let mut released = 0;
        for (slot, pin) in self.slots.iter_mut().zip(LogicalPin::ALL) {
            if slot.take().is_some() {
                debug!("gpio: {} released", pin);
                released += 1;
            }
        }
        released
    }

    // ── Digital I/O ───────────────────────────────────────────

    /// Drive `pin` to `value`, switching it to output first if needed.
    pub fn set_value(&mut self, pin: LogicalPin, value: bool) -> Result<LogicalPin> {
        self.apply(pin, PinMode::Output)?;
        match &mut self.slots[pin.index()] {
            Some(PinHandle::Output(out)) => out
                .set_state(PinState::from(value))
                .map_err(|e| hardware_fault(pin, GpioOp::Write, e.kind()))?,
            _ => unreachable!("{pin} not an output after switching to output"),
        }
        debug!("gpio: {} <- {}", pin, value);
        Ok(pin)
    }

    /// Read the live input level of `pin`, switching it to input first if
    /// needed.  A pin that was an output reads its input line, not the
    /// last value written.
    pub fn get_value(&mut self, pin: LogicalPin) -> Result<bool> {
        self.apply(pin, PinMode::Input)?;
        let level = match &mut self.slots[pin.index()] {
            Some(PinHandle::Input(input)) => input
                .is_high()
                .map_err(|e| hardware_fault(pin, GpioOp::Read, e.kind()))?,
            _ => unreachable!("{pin} not an input after switching to input"),
        };
        Ok(level)
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current mode of `pin`.  Unmapped pins are always `Unassigned`.
    pub fn mode(&self, pin: LogicalPin) -> PinMode {
        self.slots[pin.index()]
            .as_ref()
            .map_or(PinMode::Unassigned, PinHandle::mode)
    }

    pub fn is_in_pin(&self, pin: LogicalPin) -> bool {
        self.mode(pin) == PinMode::Input
    }

    pub fn is_out_pin(&self, pin: LogicalPin) -> bool {
        self.mode(pin) == PinMode::Output
    }

    // ── Internal ──────────────────────────────────────────────

    /// Run the transition table for `pin`.  Unmapped pins fail before any
    /// slot is touched.
    fn apply(&mut self, pin: LogicalPin, requested: PinMode) -> Result<()> {
        let address = pin.address().ok_or(Error::UnmappedPin(pin))?;
        let slot = &mut self.slots[pin.index()];
        let current = slot.as_ref().map_or(PinMode::Unassigned, PinHandle::mode);

        match transition(current, requested) {
            Step::Keep => return Ok(()),
            Step::Release => {
                *slot = None;
                debug!("gpio: {} released ({:?} -> Unassigned)", pin, current);
                return Ok(());
            }
            Step::Reopen => {
                *slot = None;
                debug!("gpio: {} released for {:?}", pin, requested);
            }
            Step::Open => {}
        }

        *slot = Some(open(&mut self.gpio, pin, address, requested)?);
        debug!("gpio: {} ({}) opened as {:?}", pin, address, requested);
        Ok(())
    }
}

fn open<G: GpioPort>(
    gpio: &mut G,
    pin: LogicalPin,
    address: PhysicalAddress,
    mode: PinMode,
) -> Result<PinHandle<G::Input, G::Output>> {
    match mode {
        PinMode::Input => gpio
            .open_input(address)
            .map(PinHandle::Input)
            .map_err(|kind| hardware_fault(pin, GpioOp::OpenInput, kind)),
        PinMode::Output => gpio
            .open_output(address)
            .map(PinHandle::Output)
            .map_err(|kind| hardware_fault(pin, GpioOp::OpenOutput, kind)),
        PinMode::Unassigned => unreachable!("transition table never opens Unassigned"),
    }
}

fn hardware_fault(pin: LogicalPin, op: GpioOp, kind: embedded_hal::digital::ErrorKind) -> Error {
    log::warn!("gpio: {} failed to {}: {}", pin, op, kind);
    Error::HardwareFault { pin, op, kind }
}
