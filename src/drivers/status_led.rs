//! Red/green status LED pair.
//!
//! ## Pattern table
//!
//! | Gate state | Pattern        |
//! |-----------|----------------|
//! | CLOSED    | solid red      |
//! | OPEN      | solid green    |
//! | OPENING   | blinking green |
//! | CLOSING   | blinking red   |
//! | UNKNOWN   | both blinking  |
//!
//! Blinking patterns toggle every `blink_interval_ms`, driven by a periodic
//! entry on the LED's own [`TimerQueue`].  Every blink starts in the "on"
//! phase.

use embedded_hal::digital::OutputPin;
use log::{debug, error};

use crate::gate::GateState;
use crate::scheduler::TimerQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedPattern {
    Off,
    SolidRed,
    SolidGreen,
    BlinkRed,
    BlinkGreen,
    BlinkBoth,
}

impl LedPattern {
    /// Pattern for a gate state.
    pub fn for_state(state: GateState) -> Self {
        match state {
            GateState::Closed => Self::SolidRed,
            GateState::Open => Self::SolidGreen,
            GateState::Opening => Self::BlinkGreen,
            GateState::Closing => Self::BlinkRed,
            GateState::Unknown => Self::BlinkBoth,
        }
    }

    pub fn is_blinking(self) -> bool {
        matches!(self, Self::BlinkRed | Self::BlinkGreen | Self::BlinkBoth)
    }

    /// `(red, green)` levels for the given blink phase.
    pub fn levels(self, phase_on: bool) -> (bool, bool) {
        match self {
            Self::Off => (false, false),
            Self::SolidRed => (true, false),
            Self::SolidGreen => (false, true),
            Self::BlinkRed => (phase_on, false),
            Self::BlinkGreen => (false, phase_on),
            Self::BlinkBoth => (phase_on, phase_on),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LedTask {
    Blink,
}

pub struct StatusLed<P: OutputPin> {
    red: P,
    green: P,
    pattern: LedPattern,
    phase_on: bool,
    blink_interval_ms: u32,
    timer: TimerQueue<LedTask, 1>,
    levels: (bool, bool),
}

impl<P: OutputPin> StatusLed<P> {
    /// Take both LED lines; they start off.
    pub fn new(red: P, green: P, blink_interval_ms: u32) -> Self {
        let mut led = Self {
            red,
            green,
            pattern: LedPattern::Off,
            phase_on: false,
            blink_interval_ms,
            timer: TimerQueue::new(),
            levels: (true, true),
        };
        led.write();
        led
    }

    /// Render `state`.  Re-showing the current pattern keeps its phase.
    pub fn show(&mut self, state: GateState, now_ms: u32) {
        self.set_pattern(LedPattern::for_state(state), now_ms);
    }

    pub fn set_pattern(&mut self, pattern: LedPattern, now_ms: u32) {
        if pattern == self.pattern {
            return;
        }
        debug!("LED: {:?} -> {:?}", self.pattern, pattern);

        self.timer.clear();
        self.pattern = pattern;
        self.phase_on = true;
        if pattern.is_blinking() {
            // Capacity is 1 and the queue was just cleared.
            let _ = self.timer.every(now_ms, self.blink_interval_ms, LedTask::Blink);
        }
        self.write();
    }

    /// Advance the blink phase.  Call once per loop iteration.
    pub fn tick(&mut self, now_ms: u32) {
        let mut flips = 0u32;
        self.timer.tick(now_ms, |task| match task {
            LedTask::Blink => flips += 1,
        });
        if flips % 2 == 1 {
            self.phase_on = !self.phase_on;
            self.write();
        }
    }

    pub fn all_off(&mut self) {
        self.set_pattern(LedPattern::Off, 0);
    }

    pub fn pattern(&self) -> LedPattern {
        self.pattern
    }

    /// Last `(red, green)` levels written.
    pub fn levels(&self) -> (bool, bool) {
        self.levels
    }

    fn write(&mut self) {
        let (red, green) = self.pattern.levels(self.phase_on);
        if red != self.levels.0 && set_level(&mut self.red, red).is_err() {
            error!("LED: failed to drive red line");
        }
        if green != self.levels.1 && set_level(&mut self.green, green).is_err() {
            error!("LED: failed to drive green line");
        }
        self.levels = (red, green);
    }
}

fn set_level<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), P::Error> {
    if high { pin.set_high() } else { pin.set_low() }
}
