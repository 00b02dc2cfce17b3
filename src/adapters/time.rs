//! Monotonic millisecond clock.
//!
//! - **`espidf`**: wraps `esp_timer_get_time()` from the ESP-IDF
//!   high-resolution timer (microseconds since boot).
//! - **host**: uses `std::time::Instant` for simulation.
//!
//! The value is truncated to `u32` and wraps after ~49.7 days; every
//! consumer compares with `wrapping_sub`.

use crate::app::ports::Clock;

pub struct MonotonicClock {
    #[cfg(not(feature = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(feature = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    #[cfg(feature = "espidf")]
    fn now_ms(&self) -> u32 {
        let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
        (us / 1_000) as u32
    }

    #[cfg(not(feature = "espidf"))]
    fn now_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }
}
