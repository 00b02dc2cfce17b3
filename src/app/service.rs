//! Application service, the orchestration core.
//!
//! [`AppService`] owns the gate controller, the manual button and the
//! status LEDs.  Events flow out through an [`EventSink`] passed in at
//! call sites, so the whole service runs on the host against simulated
//! pins.
//!
//! ```text
//!   ButtonDriver ──▶ ┌─────────────────────────┐ ──▶ EventSink
//!                    │       AppService         │
//!   GateCommand  ──▶ │  GateController · LEDs   │ ──▶ StatusLed
//!                    └─────────────────────────┘
//! ```
//!
//! Per tick: button edge, gate update, state-change fan-out, LED phase,
//! periodic status.  A button press is dropped at this layer while the
//! gate moves or the relay is held, before the controller's own checks.

use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, info, warn};

use crate::drivers::button::{ButtonDriver, ButtonEvent};
use crate::drivers::status_led::StatusLed;
use crate::gate::{GateController, GateState, Rejection};
use crate::scheduler::TimerQueue;

use super::commands::GateCommand;
use super::events::{AppEvent, StatusReport};
use super::ports::{Clock, EventSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServiceTask {
    PublishStatus,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// Generic over the sensor (`S`), button (`B`), relay (`P`) and LED (`L`)
/// pins and the clock (`K`).
pub struct AppService<S, B, P, L, K>
where
    S: InputPin,
    B: InputPin,
    P: OutputPin,
    L: OutputPin,
    K: Clock,
{
    gate: GateController<S, P, K>,
    button: ButtonDriver<B>,
    led: StatusLed<L>,
    timers: TimerQueue<ServiceTask, 2>,
    device_id: heapless::String<16>,
    /// State last reported through the sink.
    last_state: GateState,
    last_tick_ms: Option<u32>,
}

impl<S, B, P, L, K> AppService<S, B, P, L, K>
where
    S: InputPin,
    B: InputPin,
    P: OutputPin,
    L: OutputPin,
    K: Clock,
{
    /// Assemble the service.  `device_id` is truncated to 16 bytes.
    ///
    /// Does **not** emit anything; call [`start`](Self::start) next.
    pub fn new(
        gate: GateController<S, P, K>,
        button: ButtonDriver<B>,
        led: StatusLed<L>,
        device_id: &str,
    ) -> Self {
        let mut id = heapless::String::new();
        for c in device_id.chars() {
            if id.push(c).is_err() {
                break;
            }
        }
        let last_state = gate.state();
        Self {
            gate,
            button,
            led,
            timers: TimerQueue::new(),
            device_id: id,
            last_state,
            last_tick_ms: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Show the boot state, arm the periodic status report and announce.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        let now_ms = self.gate.now_ms();
        let interval = self.gate.config().status_interval_ms;

        self.timers.clear();
        if self.timers.every(now_ms, interval, ServiceTask::PublishStatus).is_none() {
            warn!("AppService: periodic status not armed");
        }

        self.last_state = self.gate.state();
        self.led.show(self.last_state, now_ms);
        sink.emit(&AppEvent::Started(self.last_state));
        info!("AppService started in {}", self.last_state);
        self.publish_status(sink);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one poll cycle.
    pub fn tick(&mut self, sink: &mut impl EventSink) {
        let now_ms = self.gate.now_ms();

        if let Some(last) = self.last_tick_ms {
            let gap = now_ms.wrapping_sub(last);
            if gap > self.gate.config().loop_overrun_warn_ms {
                warn!("AppService: loop stalled for {} ms", gap);
            }
        }
        self.last_tick_ms = Some(now_ms);

        // 1. Manual button
        match self.button.tick(now_ms) {
            Some(ButtonEvent::Pressed) => self.on_button_press(sink),
            Some(ButtonEvent::Released) => debug!("Button released"),
            None => {}
        }

        // 2. Gate inference (also runs the relay guards)
        self.gate.update();
        self.sync_state(sink);

        // 3. LED phase
        self.led.tick(now_ms);

        // 4. Periodic status
        let mut publish = false;
        self.timers.tick(now_ms, |task| match task {
            ServiceTask::PublishStatus => publish = true,
        });
        if publish {
            self.publish_status(sink);
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply an external command.  A rejection has no effect beyond the
    /// emitted [`AppEvent::CommandRejected`].
    pub fn handle_command(
        &mut self,
        command: GateCommand,
        sink: &mut impl EventSink,
    ) -> Result<(), Rejection> {
        let result = match command {
            GateCommand::Open => self.gate.open(),
            GateCommand::Close => self.gate.close(),
            GateCommand::Toggle => self.gate.toggle(),
        };

        match result {
            Ok(()) => sink.emit(&AppEvent::CommandAccepted(command)),
            Err(reason) => {
                info!("Command {} rejected: {}", command, reason);
                sink.emit(&AppEvent::CommandRejected { command, reason });
            }
        }
        self.sync_state(sink);
        result
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current status snapshot.
    pub fn status(&self) -> StatusReport {
        let secs = self.gate.now_ms() / 1000;
        StatusReport {
            device_id: self.device_id.clone(),
            timestamp: secs,
            state: self.gate.state(),
            sensor_raw: self.gate.sensor_raw(),
            relay_active: self.gate.is_relay_active(),
            moving: self.gate.is_moving(),
            uptime: secs,
        }
    }

    pub fn state(&self) -> GateState {
        self.gate.state()
    }

    pub fn gate(&self) -> &GateController<S, P, K> {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut GateController<S, P, K> {
        &mut self.gate
    }

    pub fn led(&self) -> &StatusLed<L> {
        &self.led
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    // ── Internal ──────────────────────────────────────────────

    fn on_button_press(&mut self, sink: &mut impl EventSink) {
        if self.gate.is_relay_active() {
            info!("Button: relay is active, press ignored");
            return;
        }
        if self.gate.is_moving() {
            info!("Button: gate is {}, press ignored", self.gate.state());
            return;
        }
        info!("Button: toggling gate");
        // Outcome is already reported through the sink.
        let _ = self.handle_command(GateCommand::Toggle, sink);
    }

    /// Fan out a state change: event, LEDs, immediate status.
    fn sync_state(&mut self, sink: &mut impl EventSink) {
        let state = self.gate.state();
        if state == self.last_state {
            return;
        }
        sink.emit(&AppEvent::StateChanged {
            from: self.last_state,
            to: state,
        });
        self.last_state = state;
        self.led.show(state, self.gate.now_ms());
        self.publish_status(sink);
    }

    fn publish_status(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Status(self.status()));
    }
}
