//! Debounced gate position sensor.
//!
//! The sensor is a limit switch engaged only at the fully-closed position.
//! A raw level change is accepted once it has held for the settle window.

use embedded_hal::digital::InputPin;
use log::{debug, error};

/// Settle-window debouncer for a single boolean signal.
///
/// Shared by the position sensor and the manual button.
#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    stable: bool,
    /// Candidate level and the time it was first seen.
    pending: Option<(bool, u32)>,
    window_ms: u32,
}

impl Debouncer {
    pub fn new(initial: bool, window_ms: u32) -> Self {
        Self {
            stable: initial,
            pending: None,
            window_ms,
        }
    }

    /// Feed one raw sample.  Returns the new stable level when it changes.
    pub fn update(&mut self, raw: bool, now_ms: u32) -> Option<bool> {
        if raw == self.stable {
            self.pending = None;
            return None;
        }

        let since = match self.pending {
            Some((level, since)) if level == raw => since,
            _ => {
                self.pending = Some((raw, now_ms));
                now_ms
            }
        };

        if now_ms.wrapping_sub(since) >= self.window_ms {
            self.stable = raw;
            self.pending = None;
            Some(raw)
        } else {
            None
        }
    }

    /// Overwrite the stable level, discarding any pending candidate.
    pub fn reset(&mut self, level: bool) {
        self.stable = level;
        self.pending = None;
    }

    pub fn stable(&self) -> bool {
        self.stable
    }
}

/// Position sensor with polarity mapping and debouncing.
pub struct DebouncedSensor<P: InputPin> {
    pin: P,
    /// `true` when a high level means "closed".
    closed_when_high: bool,
    debouncer: Debouncer,
    last_raw: bool,
}

impl<P: InputPin> DebouncedSensor<P> {
    pub fn new(pin: P, closed_when_high: bool, debounce_ms: u32) -> Self {
        Self {
            pin,
            closed_when_high,
            debouncer: Debouncer::new(false, debounce_ms),
            last_raw: false,
        }
    }

    /// Take the boot-time reading and trust it without waiting for the
    /// settle window.  A failed read is treated as "not closed".
    pub fn prime(&mut self) -> bool {
        let closed = self.sample().unwrap_or(false);
        self.debouncer.reset(closed);
        closed
    }

    /// Sample the pin and return the debounced "closed" level.
    ///
    /// A failed read keeps the last stable value.
    pub fn read(&mut self, now_ms: u32) -> bool {
        if let Some(raw) = self.sample() {
            if let Some(closed) = self.debouncer.update(raw, now_ms) {
                debug!(
                    "Sensor: settled {}",
                    if closed { "closed" } else { "not closed" }
                );
            }
        }
        self.debouncer.stable()
    }

    /// Last debounced value, without sampling.
    pub fn is_closed(&self) -> bool {
        self.debouncer.stable()
    }

    /// Last raw (undebounced, polarity-mapped) sample.
    pub fn raw_closed(&self) -> bool {
        self.last_raw
    }

    fn sample(&mut self) -> Option<bool> {
        match self.pin.is_high() {
            Ok(high) => {
                self.last_raw = high == self.closed_when_high;
                Some(self.last_raw)
            }
            Err(_) => {
                error!("Sensor: GPIO read failed, holding last value");
                None
            }
        }
    }
}
