//! Debounced manual toggle button.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up.  The main loop samples the
//! pin on every tick; a level change is reported once it has held for the
//! debounce window.  Only the press edge drives the gate; releases are
//! reported for logging.

use embedded_hal::digital::InputPin;
use log::{debug, error};

use crate::gate::sensor::Debouncer;

/// Debounced button edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Pressed,
    Released,
}

pub struct ButtonDriver<P: InputPin> {
    pin: P,
    /// Debounced "pressed" level.
    debouncer: Debouncer,
}

impl<P: InputPin> ButtonDriver<P> {
    /// Wrap `pin`.  The current level becomes the starting state so a
    /// button held at boot does not fire a press.
    pub fn new(mut pin: P, debounce_ms: u32) -> Self {
        let pressed = pin.is_low().unwrap_or(false);
        if pressed {
            debug!("Button: held at boot, waiting for release");
        }
        Self {
            pin,
            debouncer: Debouncer::new(pressed, debounce_ms),
        }
    }

    /// Call from the main loop each tick.  Returns a debounced edge, if any.
    pub fn tick(&mut self, now_ms: u32) -> Option<ButtonEvent> {
        let pressed = match self.pin.is_low() {
            Ok(level) => level,
            Err(_) => {
                error!("Button: GPIO read failed");
                return None;
            }
        };

        self.debouncer.update(pressed, now_ms).map(|pressed| {
            if pressed {
                ButtonEvent::Pressed
            } else {
                ButtonEvent::Released
            }
        })
    }

    pub fn is_pressed(&self) -> bool {
        self.debouncer.stable()
    }
}
