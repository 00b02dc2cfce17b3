//! Simulated hardware rig for integration tests.
//!
//! Holds one handle to every simulated pin so tests can drive the sensor
//! and button and inspect relay/LED lines while the code under test owns
//! the other handles.  Also provides a sink that records every event.

use swinggate::adapters::sim::{SimClock, SimPin};
use swinggate::app::events::{AppEvent, StatusReport};
use swinggate::app::ports::EventSink;
use swinggate::app::service::AppService;
use swinggate::config::GateConfig;
use swinggate::drivers::button::ButtonDriver;
use swinggate::drivers::status_led::StatusLed;
use swinggate::gate::relay::RelayActuator;
use swinggate::gate::sensor::DebouncedSensor;
use swinggate::gate::{GateController, GateState};

pub type Gate = GateController<SimPin, SimPin, SimClock>;
pub type Service = AppService<SimPin, SimPin, SimPin, SimPin, SimClock>;

/// Compressed timing: 2 s travel, 100 ms pulse, 5 ms poll.
pub fn fast_config() -> GateConfig {
    GateConfig {
        travel_duration_ms: 2_000,
        relay_pulse_ms: 100,
        sensor_debounce_ms: 10,
        button_debounce_ms: 10,
        poll_interval_ms: 5,
        led_blink_interval_ms: 50,
        status_interval_ms: 1_000,
        loop_overrun_warn_ms: 500,
        ..GateConfig::default()
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub struct Rig {
    pub config: GateConfig,
    pub clock: SimClock,
    /// High = gate fully closed.
    pub sensor: SimPin,
    /// High = released (active-low button).
    pub button: SimPin,
    pub relay_open: SimPin,
    pub relay_close: SimPin,
    pub led_red: SimPin,
    pub led_green: SimPin,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(config: GateConfig, sensor_closed: bool) -> Self {
        assert!(config.validate().is_ok(), "test config must be valid");
        Self {
            config,
            clock: SimClock::new(0),
            sensor: SimPin::new(sensor_closed),
            button: SimPin::new(true),
            relay_open: SimPin::new(false),
            relay_close: SimPin::new(false),
            led_red: SimPin::new(false),
            led_green: SimPin::new(false),
        }
    }

    pub fn gate(&self) -> Gate {
        GateController::new(
            self.config.clone(),
            DebouncedSensor::new(self.sensor.clone(), true, self.config.sensor_debounce_ms),
            RelayActuator::new(
                self.relay_open.clone(),
                self.relay_close.clone(),
                self.config.relay_pulse_ms,
            ),
            self.clock.clone(),
        )
    }

    pub fn service(&self) -> Service {
        AppService::new(
            self.gate(),
            ButtonDriver::new(self.button.clone(), self.config.button_debounce_ms),
            StatusLed::new(
                self.led_red.clone(),
                self.led_green.clone(),
                self.config.led_blink_interval_ms,
            ),
            "gate-test",
        )
    }

    pub fn now(&self) -> u32 {
        use swinggate::app::ports::Clock;
        self.clock.now_ms()
    }

    pub fn set_sensor_closed(&self, closed: bool) {
        self.sensor.set(closed);
    }

    pub fn press_button(&self) {
        self.button.set(false);
    }

    pub fn release_button(&self) {
        self.button.set(true);
    }

    pub fn relay_lines(&self) -> (bool, bool) {
        (self.relay_open.is_set_high(), self.relay_close.is_set_high())
    }

    pub fn led_levels(&self) -> (bool, bool) {
        (self.led_red.is_set_high(), self.led_green.is_set_high())
    }

    /// Advance `ms` in poll-interval steps, updating the gate each step.
    pub fn run_gate(&self, gate: &mut Gate, ms: u32) {
        self.run(ms, || gate.update());
    }

    /// Advance `ms` in poll-interval steps, ticking the service each step.
    pub fn run_service(&self, svc: &mut Service, sink: &mut impl EventSink, ms: u32) {
        self.run(ms, || svc.tick(&mut *sink));
    }

    fn run(&self, ms: u32, mut step: impl FnMut()) {
        let mut remaining = ms;
        while remaining > 0 {
            let dt = remaining.min(self.config.poll_interval_ms);
            self.clock.advance(dt);
            step();
            remaining -= dt;
        }
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn state_changes(&self) -> Vec<(GateState, GateState)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::StateChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<&StatusReport> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Status(s) => Some(s),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
