//! Gate position state machine and actuation controller.
//!
//! The only ground truth is a limit switch that asserts "fully closed".
//! Every other position is inferred from that single edge plus the time
//! spent in the current state:
//!
//! ```text
//!   ┌────────────┐  sensor   ┌───────────────────┐  relay pulse  ┌──────────────┐
//!   │ Debounced  │ ────────▶ │  GateController   │ ────────────▶ │ RelayActuator│
//!   │ Sensor     │           │  state + table    │               │ open / close │
//!   └────────────┘           └───────────────────┘               └──────────────┘
//!                                 ▲          │
//!                  open/close/    │          │ state, name, busy flags
//!                  toggle         │          ▼
//!                             button / console / LED / status
//! ```
//!
//! Each [`GateController::update`] runs the relay guards, takes a fresh
//! debounced sample, and feeds an [`Observation`](states::Observation) to
//! the current state's handler in [`states::STATE_TABLE`].  Transitions
//! that are not in the table are logged and discarded.

pub mod relay;
pub mod sensor;
pub mod states;

use core::fmt;

use embedded_hal::digital::{InputPin, OutputPin};
use log::{info, warn};
use serde::Serialize;

use crate::app::ports::Clock;
use crate::config::GateConfig;
use relay::{Direction, RelayActuator, RelayError};
use sensor::DebouncedSensor;
use states::Observation;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Best-known gate position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum GateState {
    Unknown = 0,
    Closed = 1,
    Opening = 2,
    Open = 3,
    Closing = 4,
}

impl GateState {
    /// Number of states, used to size the table.
    pub const COUNT: usize = 5;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Unknown,
        Self::Closed,
        Self::Opening,
        Self::Open,
        Self::Closing,
    ];

    /// Display name exported to LEDs, logs and status reports.
    pub fn as_str(self) -> &'static str {
        states::descriptor(self).name
    }

    pub fn is_moving(self) -> bool {
        matches!(self, Self::Opening | Self::Closing)
    }

    /// Whether the transition table allows `self -> to`.
    pub fn can_transition_to(self, to: Self) -> bool {
        states::descriptor(self).transitions.contains(&to)
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A state change that is not in the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: GateState,
    pub to: GateState,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid transition {} -> {}", self.from, self.to)
    }
}

/// Why an open/close/toggle command had no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The command needs a different current state.
    WrongState(GateState),
    /// A relay pulse is still running.
    RelayBusy,
    /// The gate is opening or closing.
    InMotion,
    /// The relay line could not be driven.
    RelayFault,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongState(s) => write!(f, "gate is {s}"),
            Self::RelayBusy => write!(f, "relay is active"),
            Self::InMotion => write!(f, "gate is moving"),
            Self::RelayFault => write!(f, "relay line fault"),
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Owns the sensor, the relay pair and the inferred position.
pub struct GateController<S: InputPin, P: OutputPin, K: Clock> {
    config: GateConfig,
    sensor: DebouncedSensor<S>,
    relay: RelayActuator<P>,
    clock: K,
    current: GateState,
    previous: GateState,
    /// Clock reading when `current` was entered.
    state_entered_ms: u32,
}

impl<S: InputPin, P: OutputPin, K: Clock> GateController<S, P, K> {
    /// Build the controller and resolve the boot state.
    ///
    /// A closed reading at boot is trusted immediately.  Anything else starts
    /// in `UNKNOWN` with the travel window running, since a fresh "not
    /// closed" is as consistent with mid-motion as with fully open.
    pub fn new(config: GateConfig, sensor: DebouncedSensor<S>, relay: RelayActuator<P>, clock: K) -> Self {
        let now_ms = clock.now_ms();
        let mut gate = Self {
            config,
            sensor,
            relay,
            clock,
            current: GateState::Unknown,
            previous: GateState::Unknown,
            state_entered_ms: now_ms,
        };

        if gate.sensor.prime() {
            info!("Gate: sensor closed at boot");
            let _ = gate.transition(GateState::Closed, now_ms);
        } else {
            info!(
                "Gate: sensor not closed at boot, waiting {} ms for a closed signal",
                gate.config.travel_duration_ms
            );
        }
        gate
    }

    /// One poll cycle: relay guards, sensor sample, inference.
    pub fn update(&mut self) {
        let now_ms = self.clock.now_ms();
        self.relay.poll(now_ms);

        let obs = Observation {
            sensor_closed: self.sensor.read(now_ms),
            ms_in_state: now_ms.wrapping_sub(self.state_entered_ms),
            travel_ms: self.config.travel_duration_ms,
        };

        if let Some(next) = (states::descriptor(self.current).on_update)(&obs) {
            let _ = self.transition(next, now_ms);
        }
    }

    /// Pulse the open relay.  Accepted only from `CLOSED` with the relay idle.
    pub fn open(&mut self) -> Result<(), Rejection> {
        self.command(GateState::Closed, Direction::Open, GateState::Opening)
    }

    /// Pulse the close relay.  Accepted only from `OPEN` with the relay idle.
    pub fn close(&mut self) -> Result<(), Rejection> {
        self.command(GateState::Open, Direction::Close, GateState::Closing)
    }

    /// Open if closed, close if open.
    ///
    /// In `UNKNOWN` the debounced sensor level picks a provisional `CLOSED`
    /// or `OPEN` first.  Rejected while moving.
    pub fn toggle(&mut self) -> Result<(), Rejection> {
        if self.is_moving() {
            info!("Gate: toggle ignored, gate is {}", self.current);
            return Err(Rejection::InMotion);
        }
        if self.relay.is_busy() {
            info!("Gate: toggle ignored, relay is active");
            return Err(Rejection::RelayBusy);
        }

        match self.current {
            GateState::Closed => self.open(),
            GateState::Open => self.close(),
            GateState::Unknown => {
                let now_ms = self.clock.now_ms();
                if self.sensor.is_closed() {
                    info!("Gate: state unknown, sensor closed, treating as CLOSED");
                    let _ = self.transition(GateState::Closed, now_ms);
                    self.open()
                } else {
                    info!("Gate: state unknown, sensor not closed, treating as OPEN");
                    let _ = self.transition(GateState::Open, now_ms);
                    self.close()
                }
            }
            GateState::Opening | GateState::Closing => Err(Rejection::InMotion),
        }
    }

    /// Move directly to `to` if the table allows it.  Diagnostic override;
    /// an invalid request leaves state and timers untouched.
    pub fn force_state(&mut self, to: GateState) -> Result<(), InvalidTransition> {
        let now_ms = self.clock.now_ms();
        self.transition(to, now_ms)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn state(&self) -> GateState {
        self.current
    }

    pub fn previous_state(&self) -> GateState {
        self.previous
    }

    pub fn state_name(&self) -> &'static str {
        self.current.as_str()
    }

    pub fn is_moving(&self) -> bool {
        self.current.is_moving()
    }

    pub fn is_relay_active(&self) -> bool {
        self.relay.is_busy()
    }

    /// Debounced sensor level.
    pub fn sensor_closed(&self) -> bool {
        self.sensor.is_closed()
    }

    /// Last raw sensor sample, before debouncing.
    pub fn sensor_raw(&self) -> bool {
        self.sensor.raw_closed()
    }

    pub fn ms_in_state(&self) -> u32 {
        self.clock.now_ms().wrapping_sub(self.state_entered_ms)
    }

    pub fn now_ms(&self) -> u32 {
        self.clock.now_ms()
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn relay(&self) -> &RelayActuator<P> {
        &self.relay
    }

    /// Direct relay access for diagnostics and fault injection.
    pub fn relay_mut(&mut self) -> &mut RelayActuator<P> {
        &mut self.relay
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn command(
        &mut self,
        required: GateState,
        direction: Direction,
        moving: GateState,
    ) -> Result<(), Rejection> {
        if self.current != required {
            info!(
                "Gate: {} rejected, gate is {} (needs {})",
                direction.as_str(),
                self.current,
                required
            );
            return Err(Rejection::WrongState(self.current));
        }
        if self.relay.is_busy() {
            info!("Gate: {} rejected, relay is active", direction.as_str());
            return Err(Rejection::RelayBusy);
        }

        let now_ms = self.clock.now_ms();
        self.relay.activate(direction, now_ms).map_err(|e| match e {
            RelayError::AlreadyActive => Rejection::RelayBusy,
            RelayError::Pin(_) => Rejection::RelayFault,
        })?;
        let _ = self.transition(moving, now_ms);
        Ok(())
    }

    fn transition(&mut self, to: GateState, now_ms: u32) -> Result<(), InvalidTransition> {
        if to == self.current {
            return Ok(());
        }
        if !self.current.can_transition_to(to) {
            let err = InvalidTransition {
                from: self.current,
                to,
            };
            warn!("Gate: {err}, discarded");
            return Err(err);
        }

        info!("Gate: state changed {} -> {}", self.current, to);
        self.previous = self.current;
        self.current = to;
        self.state_entered_ms = now_ms;
        Ok(())
    }
}
