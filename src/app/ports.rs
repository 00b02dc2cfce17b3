//! Port traits: the boundary between the gate logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ GateController / AppService
//! ```
//!
//! Pins come in through `embedded-hal`'s digital traits.  Time and event
//! output come in through the two traits below, so the whole core runs on
//! the host against simulated adapters.

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: hardware timer → domain)
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds since start.
///
/// Only ever used for wrapping elapsed-time comparisons; never persisted.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The service emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, status
/// topic, test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

/// Fan one event stream out to two sinks (e.g. serial log and MQTT).
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &super::events::AppEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}
