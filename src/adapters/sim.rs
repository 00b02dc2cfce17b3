//! In-memory clock and GPIO for host simulation and tests.
//!
//! Clones share state, so a test keeps one handle to a [`SimPin`] while the
//! driver under test owns another, and drives or inspects the level from
//! outside.  Everything here is single-threaded (`Rc`).

use core::cell::Cell;
use std::rc::Rc;

use embedded_hal::digital::{Error, ErrorKind, ErrorType, InputPin, OutputPin};

use crate::app::ports::Clock;

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Manually advanced millisecond clock.
#[derive(Debug, Clone, Default)]
pub struct SimClock(Rc<Cell<u32>>);

impl SimClock {
    pub fn new(start_ms: u32) -> Self {
        Self(Rc::new(Cell::new(start_ms)))
    }

    /// Move time forward, wrapping at `u32::MAX`.
    pub fn advance(&self, ms: u32) {
        self.0.set(self.0.get().wrapping_add(ms));
    }

    pub fn set(&self, ms: u32) {
        self.0.set(ms);
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u32 {
        self.0.get()
    }
}

// ---------------------------------------------------------------------------
// GPIO
// ---------------------------------------------------------------------------

/// Injected GPIO failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimPinError;

impl Error for SimPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Default)]
struct PinState {
    level: Cell<bool>,
    failing: Cell<bool>,
    rising_edges: Cell<u32>,
}

/// Shared-level digital pin usable as input or output.
#[derive(Debug, Clone, Default)]
pub struct SimPin(Rc<PinState>);

impl SimPin {
    pub fn new(high: bool) -> Self {
        let pin = Self::default();
        pin.0.level.set(high);
        pin
    }

    /// Drive the level from outside (sensor or switch side).
    pub fn set(&self, high: bool) {
        self.0.level.set(high);
    }

    pub fn is_set_high(&self) -> bool {
        self.0.level.get()
    }

    /// Make every subsequent read and write fail until cleared.
    pub fn set_failing(&self, failing: bool) {
        self.0.failing.set(failing);
    }

    /// Low-to-high transitions driven through [`OutputPin`].
    pub fn rising_edges(&self) -> u32 {
        self.0.rising_edges.get()
    }

    fn check(&self) -> Result<(), SimPinError> {
        if self.0.failing.get() {
            Err(SimPinError)
        } else {
            Ok(())
        }
    }
}

impl ErrorType for SimPin {
    type Error = SimPinError;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, SimPinError> {
        self.check()?;
        Ok(self.0.level.get())
    }

    fn is_low(&mut self) -> Result<bool, SimPinError> {
        self.check()?;
        Ok(!self.0.level.get())
    }
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), SimPinError> {
        self.check()?;
        self.0.level.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), SimPinError> {
        self.check()?;
        if !self.0.level.get() {
            self.0.rising_edges.set(self.0.rising_edges.get() + 1);
        }
        self.0.level.set(true);
        Ok(())
    }
}
