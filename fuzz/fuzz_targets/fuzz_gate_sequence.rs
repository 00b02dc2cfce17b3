//! Fuzz target: `GateController` under arbitrary input sequences
//!
//! Each input byte is one step: the low three bits pick an action, the
//! rest parameterise it.  After every step both relay lines must never be
//! high together, a pulse must never outlive its poll backstop, and the
//! state must only move along the transition table.
//!
//! cargo fuzz run fuzz_gate_sequence

#![no_main]

use libfuzzer_sys::fuzz_target;
use swinggate::adapters::sim::{SimClock, SimPin};
use swinggate::app::ports::Clock;
use swinggate::config::GateConfig;
use swinggate::gate::relay::RelayActuator;
use swinggate::gate::sensor::DebouncedSensor;
use swinggate::gate::{GateController, GateState};

fuzz_target!(|data: &[u8]| {
    let config = GateConfig {
        travel_duration_ms: 400,
        relay_pulse_ms: 40,
        sensor_debounce_ms: 4,
        poll_interval_ms: 4,
        ..GateConfig::default()
    };
    let limit = config.relay_pulse_ms + config.poll_interval_ms;

    let boot_closed = data.first().is_some_and(|b| b & 0x80 != 0);
    let clock = SimClock::new(u32::MAX - 1_000);
    let sensor = SimPin::new(boot_closed);
    let open_line = SimPin::new(false);
    let close_line = SimPin::new(false);
    let mut gate = GateController::new(
        config.clone(),
        DebouncedSensor::new(sensor.clone(), true, config.sensor_debounce_ms),
        RelayActuator::new(open_line.clone(), close_line.clone(), config.relay_pulse_ms),
        clock.clone(),
    );

    for &byte in data {
        let before = gate.state();
        let arg = byte >> 3;
        match byte & 0x07 {
            0 | 1 => {
                for _ in 0..=arg {
                    let step_before = gate.state();
                    clock.advance(1);
                    gate.update();
                    let after = gate.state();
                    assert!(step_before == after || step_before.can_transition_to(after));
                    assert!(!(open_line.is_set_high() && close_line.is_set_high()));
                }
            }
            2 => sensor.set(arg & 1 == 1),
            3 => {
                let _ = gate.open();
            }
            4 => {
                let _ = gate.close();
            }
            5 => {
                let _ = gate.toggle();
            }
            6 => {
                let to = GateState::ALL[usize::from(arg) % GateState::COUNT];
                let _ = gate.force_state(to);
            }
            _ => gate.relay_mut().set_scheduled_release_enabled(arg & 1 == 1),
        }

        let after = gate.state();
        assert!(before == after || before.can_transition_to(after));
        assert!(!(open_line.is_set_high() && close_line.is_set_high()));
        if let Some(held) = gate.relay().active_for_ms(clock.now_ms()) {
            assert!(held <= limit);
        }
    }
});
