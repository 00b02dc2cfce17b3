//! Pulse-driven relay pair for the gate motor controller.
//!
//! The gate opener takes a momentary contact on one of two lines.  Exactly
//! one line may be high at a time and every pulse must end after
//! `pulse_ms`, so release is guarded twice:
//!
//! 1. a one-shot entry on the actuator's own [`TimerQueue`], and
//! 2. an elapsed-time check on every [`RelayActuator::poll`] that fires even
//!    if the scheduled release never does.
//!
//! Both paths end in [`RelayActuator::release`], which drives both lines low
//! unconditionally.

use core::fmt;

use embedded_hal::digital::OutputPin;
use log::{error, info, warn};

use crate::error::PinError;
use crate::scheduler::{TimerId, TimerQueue};

/// Which relay line to pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Open,
    Close,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
        }
    }
}

/// Reasons [`RelayActuator::activate`] refused to pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayError {
    /// A pulse is already in progress; it was left undisturbed.
    AlreadyActive,
    /// The selected line could not be driven high.  Both lines were
    /// forced low again.
    Pin(PinError),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyActive => write!(f, "relay already active"),
            Self::Pin(e) => write!(f, "relay line fault: {e}"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActivePulse {
    direction: Direction,
    started_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelayTask {
    Release,
}

/// Two mutually exclusive, self-releasing relay outputs.
pub struct RelayActuator<P: OutputPin> {
    open_pin: P,
    close_pin: P,
    pulse_ms: u32,
    active: Option<ActivePulse>,
    timer: TimerQueue<RelayTask, 2>,
    release_timer: Option<TimerId>,
}

impl<P: OutputPin> RelayActuator<P> {
    /// Take ownership of both relay lines and drive them to idle (low).
    pub fn new(open_pin: P, close_pin: P, pulse_ms: u32) -> Self {
        let mut relay = Self {
            open_pin,
            close_pin,
            pulse_ms,
            active: None,
            timer: TimerQueue::new(),
            release_timer: None,
        };
        relay.drive_both_low();
        relay
    }

    /// Start a pulse on `direction`'s line.
    ///
    /// Refused while another pulse is running.  On success the opposite line
    /// is driven low first, then the selected line high, and release is
    /// scheduled `pulse_ms` from `now_ms`.
    pub fn activate(&mut self, direction: Direction, now_ms: u32) -> Result<(), RelayError> {
        if let Some(active) = self.active {
            warn!(
                "Relay: {} pulse requested while {} pulse active, ignored",
                direction.as_str(),
                active.direction.as_str()
            );
            return Err(RelayError::AlreadyActive);
        }

        let (selected, other) = match direction {
            Direction::Open => (&mut self.open_pin, &mut self.close_pin),
            Direction::Close => (&mut self.close_pin, &mut self.open_pin),
        };
        if other.set_low().is_err() {
            error!("Relay: failed to idle opposite line before {} pulse", direction.as_str());
        }
        if selected.set_high().is_err() {
            error!("Relay: failed to drive {} line high", direction.as_str());
            self.drive_both_low();
            return Err(RelayError::Pin(PinError::Write));
        }

        self.active = Some(ActivePulse {
            direction,
            started_ms: now_ms,
        });
        self.release_timer = self.timer.after(now_ms, self.pulse_ms, RelayTask::Release);
        if self.release_timer.is_none() {
            warn!("Relay: release not scheduled, relying on poll timeout");
        }

        info!("Relay: {} relay activated", direction.as_str());
        Ok(())
    }

    /// Run both release guards.  Call once per poll cycle.
    pub fn poll(&mut self, now_ms: u32) {
        let mut release_due = false;
        self.timer.tick(now_ms, |task| match task {
            RelayTask::Release => release_due = true,
        });
        if release_due {
            self.release_timer = None;
            self.release(now_ms);
            return;
        }

        if let Some(active) = self.active {
            if now_ms.wrapping_sub(active.started_ms) >= self.pulse_ms {
                warn!("Relay: scheduled release missed, forcing {} line off", active.direction.as_str());
                self.release(now_ms);
            }
        }
    }

    /// Drive both lines low and clear the busy flag.  Safe to call at any
    /// time, including when idle.
    pub fn release(&mut self, now_ms: u32) {
        self.drive_both_low();
        if let Some(id) = self.release_timer.take() {
            self.timer.cancel(id);
        }
        if let Some(active) = self.active.take() {
            info!(
                "Relay: {} relay released after {} ms",
                active.direction.as_str(),
                now_ms.wrapping_sub(active.started_ms)
            );
        }
    }

    /// `true` strictly between a successful [`activate`](Self::activate) and
    /// the following release.
    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Direction of the running pulse, if any.
    pub fn active_direction(&self) -> Option<Direction> {
        self.active.map(|a| a.direction)
    }

    /// How long the current pulse has been held, if one is running.
    pub fn active_for_ms(&self, now_ms: u32) -> Option<u32> {
        self.active.map(|a| now_ms.wrapping_sub(a.started_ms))
    }

    pub fn pulse_ms(&self) -> u32 {
        self.pulse_ms
    }

    /// Suspend or resume the scheduled release path.  With it suspended only
    /// the poll timeout can end a pulse.
    pub fn set_scheduled_release_enabled(&mut self, enabled: bool) {
        self.timer.set_enabled(enabled);
    }

    fn drive_both_low(&mut self) {
        if self.open_pin.set_low().is_err() {
            error!("Relay: failed to drive open line low");
        }
        if self.close_pin.set_low().is_err() {
            error!("Relay: failed to drive close line low");
        }
    }
}
