//! Per-state inference handlers and the static transition table.
//!
//! Each state is one row: its display name, the states it may legally move
//! to, and a plain `fn` that inspects the latest [`Observation`] and proposes
//! the next state.  The sensor only ever confirms "closed", so every
//! non-closed observation is time-qualified against the travel window.
//!
//! ```text
//!   UNKNOWN ──[closed]──────────────▶ CLOSED ──[not closed / open()]──▶ OPENING
//!      │                                ▲                                 │
//!      └──[not closed ≥ travel]──▶ OPEN │◀──────[not closed ≥ travel]─────┘
//!                                   │   │
//!                          close()  ▼   │[closed]
//!                               CLOSING ┘   (not closed ≥ travel ──▶ OPEN)
//! ```

use super::GateState;

/// What the controller saw on this poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// Debounced sensor: `true` = gate confirmed fully closed.
    pub sensor_closed: bool,
    /// Milliseconds since the current state was entered.
    pub ms_in_state: u32,
    /// Configured full-travel window.
    pub travel_ms: u32,
}

impl Observation {
    fn travel_elapsed(&self) -> bool {
        self.ms_in_state >= self.travel_ms
    }
}

/// Per-tick inference handler.  `Some(next)` requests a transition.
pub type InferFn = fn(&Observation) -> Option<GateState>;

/// Static descriptor for a single gate state.
pub struct StateDescriptor {
    pub id: GateState,
    pub name: &'static str,
    /// Legal destinations from this state.
    pub transitions: &'static [GateState],
    pub on_update: InferFn,
}

/// The transition table, indexed by `GateState as usize`.
pub static STATE_TABLE: [StateDescriptor; GateState::COUNT] = [
    // 0: Unknown
    StateDescriptor {
        id: GateState::Unknown,
        name: "UNKNOWN",
        transitions: &[
            GateState::Closed,
            GateState::Open,
            GateState::Opening,
            GateState::Closing,
        ],
        on_update: unknown_update,
    },
    // 1: Closed
    StateDescriptor {
        id: GateState::Closed,
        name: "CLOSED",
        transitions: &[GateState::Opening, GateState::Unknown],
        on_update: closed_update,
    },
    // 2: Opening
    StateDescriptor {
        id: GateState::Opening,
        name: "OPENING",
        transitions: &[GateState::Open, GateState::Closed, GateState::Unknown],
        on_update: opening_update,
    },
    // 3: Open
    StateDescriptor {
        id: GateState::Open,
        name: "OPEN",
        transitions: &[GateState::Closing, GateState::Closed, GateState::Unknown],
        on_update: open_update,
    },
    // 4: Closing
    StateDescriptor {
        id: GateState::Closing,
        name: "CLOSING",
        transitions: &[GateState::Closed, GateState::Open, GateState::Unknown],
        on_update: closing_update,
    },
];

/// Table row for `state`.
pub fn descriptor(state: GateState) -> &'static StateDescriptor {
    &STATE_TABLE[state as usize]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Handlers
// ═══════════════════════════════════════════════════════════════════════════

fn unknown_update(obs: &Observation) -> Option<GateState> {
    if obs.sensor_closed {
        return Some(GateState::Closed);
    }
    // No closed signal for a full travel cycle: settle on the steady reading.
    obs.travel_elapsed().then_some(GateState::Open)
}

fn closed_update(obs: &Observation) -> Option<GateState> {
    // Any departure from closed is the start of an opening motion.
    (!obs.sensor_closed).then_some(GateState::Opening)
}

fn opening_update(obs: &Observation) -> Option<GateState> {
    if obs.sensor_closed {
        return Some(GateState::Closed);
    }
    obs.travel_elapsed().then_some(GateState::Open)
}

fn open_update(obs: &Observation) -> Option<GateState> {
    obs.sensor_closed.then_some(GateState::Closed)
}

fn closing_update(obs: &Observation) -> Option<GateState> {
    if obs.sensor_closed {
        return Some(GateState::Closed);
    }
    // Close attempt stalled: revert to the pre-command state.
    obs.travel_elapsed().then_some(GateState::Open)
}
