//! Simulated GPIO bus for host builds.
//!
//! Implements [`GpioPort`] over an in-memory bus so the registry and the
//! controller run unchanged on a workstation.  Every open, release, read
//! and write is recorded; tests drive input levels and inject faults
//! through the same shared bus.
//!
//! Cloning a [`SimGpio`] yields another view of the same bus.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};

use crate::app::ports::GpioPort;
use crate::pins::PhysicalAddress;

/// One recorded bus operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimOp {
    OpenInput(PhysicalAddress),
    OpenOutput(PhysicalAddress),
    Release(PhysicalAddress),
    Write(PhysicalAddress, bool),
    Read(PhysicalAddress),
}

#[derive(Debug, Default)]
struct Line {
    input_level: bool,
    output_level: Option<bool>,
    live_handles: usize,
    opens: usize,
    fail_opens: bool,
    fail_io: bool,
}

#[derive(Debug, Default)]
struct Bus {
    lines: HashMap<PhysicalAddress, Line>,
    history: Vec<SimOp>,
}

/// Shared in-memory GPIO bus.
#[derive(Debug, Clone, Default)]
pub struct SimGpio {
    bus: Arc<Mutex<Bus>>,
}

impl SimGpio {
    pub fn new() -> Self {
        Self::default()
    }

    fn bus(&self) -> MutexGuard<'_, Bus> {
        lock(&self.bus)
    }

    // ── Stimulus ──────────────────────────────────────────────

    /// Level an input handle on `address` will read.
    pub fn set_input_level(&self, address: PhysicalAddress, high: bool) {
        self.bus().lines.entry(address).or_default().input_level = high;
    }

    /// Make every open on `address` fail.
    pub fn fail_opens(&self, address: PhysicalAddress, fail: bool) {
        self.bus().lines.entry(address).or_default().fail_opens = fail;
    }

    /// Make every read and write on `address` fail.
    pub fn fail_io(&self, address: PhysicalAddress, fail: bool) {
        self.bus().lines.entry(address).or_default().fail_io = fail;
    }

    // ── Observation ───────────────────────────────────────────

    /// Last level written to `address`, if it was ever driven.
    pub fn output_level(&self, address: PhysicalAddress) -> Option<bool> {
        self.bus().lines.get(&address).and_then(|l| l.output_level)
    }

    /// Handles currently open on `address`.
    pub fn live_handles(&self, address: PhysicalAddress) -> usize {
        self.bus().lines.get(&address).map_or(0, |l| l.live_handles)
    }

    /// Handles currently open on the whole bus.
    pub fn total_live_handles(&self) -> usize {
        self.bus().lines.values().map(|l| l.live_handles).sum()
    }

    /// Successful opens on `address` since the bus was created.
    pub fn open_count(&self, address: PhysicalAddress) -> usize {
        self.bus().lines.get(&address).map_or(0, |l| l.opens)
    }

    /// Every operation in order.
    pub fn history(&self) -> Vec<SimOp> {
        self.bus().history.clone()
    }

    pub fn clear_history(&self) {
        self.bus().history.clear();
    }

    fn open(&self, address: PhysicalAddress, op: SimOp) -> Result<SimLine, ErrorKind> {
        let mut bus = self.bus();
        let line = bus.lines.entry(address).or_default();
        if line.fail_opens {
            return Err(ErrorKind::Other);
        }
        line.live_handles += 1;
        line.opens += 1;
        bus.history.push(op);
        Ok(SimLine {
            address,
            bus: Arc::clone(&self.bus),
        })
    }
}

fn lock(bus: &Mutex<Bus>) -> MutexGuard<'_, Bus> {
    bus.lock().unwrap_or_else(PoisonError::into_inner)
}

impl GpioPort for SimGpio {
    type Input = SimInput;
    type Output = SimOutput;

    fn open_input(&mut self, address: PhysicalAddress) -> Result<SimInput, ErrorKind> {
        self.open(address, SimOp::OpenInput(address)).map(SimInput)
    }

    fn open_output(&mut self, address: PhysicalAddress) -> Result<SimOutput, ErrorKind> {
        self.open(address, SimOp::OpenOutput(address)).map(SimOutput)
    }
}

// ── Handles ───────────────────────────────────────────────────

/// Claim on one line; releasing it is recorded on drop.
#[derive(Debug)]
struct SimLine {
    address: PhysicalAddress,
    bus: Arc<Mutex<Bus>>,
}

impl Drop for SimLine {
    fn drop(&mut self) {
        let mut bus = lock(&self.bus);
        if let Some(line) = bus.lines.get_mut(&self.address) {
            line.live_handles = line.live_handles.saturating_sub(1);
        }
        bus.history.push(SimOp::Release(self.address));
    }
}

#[derive(Debug)]
pub struct SimInput(SimLine);

#[derive(Debug)]
pub struct SimOutput(SimLine);

impl ErrorType for SimInput {
    type Error = ErrorKind;
}

impl ErrorType for SimOutput {
    type Error = ErrorKind;
}

impl InputPin for SimInput {
    fn is_high(&mut self) -> Result<bool, ErrorKind> {
        let mut bus = lock(&self.0.bus);
        let address = self.0.address;
        let line = bus.lines.entry(address).or_default();
        if line.fail_io {
            return Err(ErrorKind::Other);
        }
        let level = line.input_level;
        bus.history.push(SimOp::Read(address));
        Ok(level)
    }

    fn is_low(&mut self) -> Result<bool, ErrorKind> {
        self.is_high().map(|high| !high)
    }
}

impl SimOutput {
    fn drive(&mut self, high: bool) -> Result<(), ErrorKind> {
        let mut bus = lock(&self.0.bus);
        let address = self.0.address;
        let line = bus.lines.entry(address).or_default();
        if line.fail_io {
            return Err(ErrorKind::Other);
        }
        line.output_level = Some(high);
        bus.history.push(SimOp::Write(address, high));
        Ok(())
    }
}

impl OutputPin for SimOutput {
    fn set_low(&mut self) -> Result<(), ErrorKind> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), ErrorKind> {
        self.drive(true)
    }
}
