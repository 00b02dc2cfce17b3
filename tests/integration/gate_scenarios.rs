//! End-to-end gate controller scenarios against simulated pins.
//!
//! Covers boot resolution, the full open/close cycle, instant trust of the
//! closed sensor, travel-window timeouts, command rejection and the relay
//! release backstop.

use swinggate::config::GateConfig;
use swinggate::gate::relay::Direction;
use swinggate::gate::{GateState, InvalidTransition, Rejection};

use crate::mock_hw::{Rig, fast_config};

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_closed_goes_straight_to_closed() {
    let rig = Rig::new(fast_config(), true);
    let gate = rig.gate();
    assert_eq!(gate.state(), GateState::Closed);
    assert!(!gate.is_moving());
    assert!(!gate.is_relay_active());
}

#[test]
fn boot_open_resolves_to_open_exactly_at_travel_window() {
    let rig = Rig::new(fast_config(), false);
    let mut gate = rig.gate();
    let travel = rig.config.travel_duration_ms;
    assert_eq!(gate.state(), GateState::Unknown);

    rig.clock.set(travel - 1);
    gate.update();
    assert_eq!(gate.state(), GateState::Unknown);

    rig.clock.set(travel);
    gate.update();
    assert_eq!(gate.state(), GateState::Open);
}

#[test]
fn boot_unknown_settles_closed_when_gate_arrives() {
    let rig = Rig::new(fast_config(), false);
    let mut gate = rig.gate();
    rig.run_gate(&mut gate, 500);
    rig.set_sensor_closed(true);
    rig.run_gate(&mut gate, 20);
    assert_eq!(gate.state(), GateState::Closed);
}

// ── Full cycle with production timing ─────────────────────────

#[test]
fn close_from_open_then_sensor_confirms_closed() {
    let config = GateConfig::default();
    let rig = Rig::new(config, false);
    let mut gate = rig.gate();

    rig.run_gate(&mut gate, rig.config.travel_duration_ms);
    assert_eq!(gate.state(), GateState::Open);

    gate.close().unwrap();
    assert_eq!(gate.state(), GateState::Closing);
    assert_eq!(rig.relay_lines(), (false, true));
    assert_eq!(rig.relay_close.rising_edges(), 1);

    rig.run_gate(&mut gate, 2_000);
    assert_eq!(gate.state(), GateState::Closing);
    assert!(!gate.is_relay_active(), "pulse must be over long before 2 s");
    assert_eq!(rig.relay_lines(), (false, false));

    rig.set_sensor_closed(true);
    rig.run_gate(&mut gate, 100);
    assert_eq!(gate.state(), GateState::Closed);
    assert_eq!(gate.previous_state(), GateState::Closing);
}

#[test]
fn open_then_travel_window_confirms_open() {
    let rig = Rig::new(fast_config(), true);
    let mut gate = rig.gate();

    gate.open().unwrap();
    assert_eq!(gate.state(), GateState::Opening);
    assert_eq!(rig.relay_lines(), (true, false));
    rig.set_sensor_closed(false);

    // The switch still reads closed until the debounce window passes.
    rig.run_gate(&mut gate, 5);
    assert_eq!(gate.state(), GateState::Closed);
    rig.run_gate(&mut gate, 10);
    assert_eq!(gate.state(), GateState::Opening);

    // Travel window counts from the departure at t = 15.
    rig.run_gate(&mut gate, rig.config.travel_duration_ms - 5);
    assert_eq!(gate.state(), GateState::Opening);
    rig.run_gate(&mut gate, 5);
    assert_eq!(gate.state(), GateState::Open);
}

// ── Inference rules ───────────────────────────────────────────

#[test]
fn closed_sensor_is_trusted_from_every_state() {
    for start in [GateState::Opening, GateState::Open, GateState::Closing] {
        let rig = Rig::new(fast_config(), false);
        let mut gate = rig.gate();
        gate.force_state(start).unwrap();
        assert_eq!(gate.state(), start);

        rig.set_sensor_closed(true);
        rig.run_gate(&mut gate, 20);
        assert_eq!(gate.state(), GateState::Closed, "from {start}");
    }
}

#[test]
fn stalled_close_reverts_to_open() {
    let rig = Rig::new(fast_config(), false);
    let mut gate = rig.gate();
    rig.run_gate(&mut gate, rig.config.travel_duration_ms);
    gate.close().unwrap();

    rig.run_gate(&mut gate, rig.config.travel_duration_ms);
    assert_eq!(gate.state(), GateState::Open);
    assert_eq!(gate.previous_state(), GateState::Closing);
}

#[test]
fn manual_opening_from_closed_is_detected() {
    let rig = Rig::new(fast_config(), true);
    let mut gate = rig.gate();
    rig.set_sensor_closed(false);
    rig.run_gate(&mut gate, 20);
    assert_eq!(gate.state(), GateState::Opening);
    assert!(!gate.is_relay_active(), "no command was issued");
}

#[test]
fn sensor_bounce_shorter_than_debounce_is_ignored() {
    let rig = Rig::new(fast_config(), true);
    let mut gate = rig.gate();
    rig.set_sensor_closed(false);
    rig.run_gate(&mut gate, 5);
    rig.set_sensor_closed(true);
    rig.run_gate(&mut gate, 50);
    assert_eq!(gate.state(), GateState::Closed);
}

// ── Command surface ───────────────────────────────────────────

#[test]
fn open_rejected_while_relay_held() {
    let rig = Rig::new(fast_config(), true);
    let mut gate = rig.gate();
    let now = rig.now();
    gate.relay_mut().activate(Direction::Close, now).unwrap();
    let open_edges = rig.relay_open.rising_edges();

    assert_eq!(gate.open(), Err(Rejection::RelayBusy));
    assert_eq!(gate.state(), GateState::Closed);
    assert_eq!(rig.relay_open.rising_edges(), open_edges);
}

#[test]
fn commands_rejected_in_wrong_state() {
    let rig = Rig::new(fast_config(), true);
    let mut gate = rig.gate();
    assert_eq!(gate.close(), Err(Rejection::WrongState(GateState::Closed)));

    gate.open().unwrap();
    assert_eq!(gate.open(), Err(Rejection::WrongState(GateState::Opening)));
    assert_eq!(gate.close(), Err(Rejection::WrongState(GateState::Opening)));
    assert_eq!(gate.toggle(), Err(Rejection::InMotion));
    assert_eq!(rig.relay_open.rising_edges(), 1);
    assert_eq!(rig.relay_close.rising_edges(), 0);
}

#[test]
fn toggle_alternates_between_open_and_close() {
    let rig = Rig::new(fast_config(), true);
    let mut gate = rig.gate();

    gate.toggle().unwrap();
    assert_eq!(gate.state(), GateState::Opening);
    rig.set_sensor_closed(false);
    rig.run_gate(&mut gate, rig.config.travel_duration_ms + 20);
    assert_eq!(gate.state(), GateState::Open);

    gate.toggle().unwrap();
    assert_eq!(gate.state(), GateState::Closing);
    assert_eq!(rig.relay_close.rising_edges(), 1);
}

#[test]
fn toggle_from_unknown_matches_forced_state_then_command() {
    // Sensor closed: toggle == force CLOSED + open().
    let rig_a = Rig::new(fast_config(), true);
    let mut a = rig_a.gate();
    a.force_state(GateState::Unknown).unwrap();
    a.toggle().unwrap();

    let rig_b = Rig::new(fast_config(), true);
    let mut b = rig_b.gate();
    b.force_state(GateState::Unknown).unwrap();
    b.force_state(GateState::Closed).unwrap();
    b.open().unwrap();

    assert_eq!(a.state(), b.state());
    assert_eq!(a.state(), GateState::Opening);
    assert_eq!(rig_a.relay_lines(), rig_b.relay_lines());
    assert_eq!(a.relay().active_direction(), Some(Direction::Open));

    // Sensor not closed: toggle == force OPEN + close().
    let rig_c = Rig::new(fast_config(), false);
    let mut c = rig_c.gate();
    c.toggle().unwrap();

    let rig_d = Rig::new(fast_config(), false);
    let mut d = rig_d.gate();
    d.force_state(GateState::Open).unwrap();
    d.close().unwrap();

    assert_eq!(c.state(), d.state());
    assert_eq!(c.state(), GateState::Closing);
    assert_eq!(rig_c.relay_lines(), rig_d.relay_lines());
    assert_eq!(c.relay().active_direction(), Some(Direction::Close));
}

#[test]
fn invalid_transition_is_discarded() {
    let rig = Rig::new(fast_config(), true);
    let mut gate = rig.gate();
    rig.run_gate(&mut gate, 50);
    let in_state = gate.ms_in_state();

    let err = gate.force_state(GateState::Closing).unwrap_err();
    assert_eq!(
        err,
        InvalidTransition {
            from: GateState::Closed,
            to: GateState::Closing
        }
    );
    assert_eq!(gate.state(), GateState::Closed);
    assert_eq!(gate.ms_in_state(), in_state);
}

// ── Relay release ─────────────────────────────────────────────

#[test]
fn relay_released_by_schedule_after_one_pulse() {
    let rig = Rig::new(fast_config(), true);
    let mut gate = rig.gate();
    gate.open().unwrap();

    rig.run_gate(&mut gate, rig.config.relay_pulse_ms - 5);
    assert!(gate.is_relay_active());
    rig.run_gate(&mut gate, 5);
    assert!(!gate.is_relay_active());
    assert_eq!(rig.relay_lines(), (false, false));
}

#[test]
fn relay_backstop_releases_when_schedule_never_fires() {
    let rig = Rig::new(fast_config(), true);
    let mut gate = rig.gate();
    gate.relay_mut().set_scheduled_release_enabled(false);
    gate.open().unwrap();

    let limit = rig.config.relay_pulse_ms + rig.config.poll_interval_ms;
    let mut held = 0;
    while gate.is_relay_active() {
        rig.run_gate(&mut gate, 1);
        held += 1;
        assert!(held <= limit, "relay held for {held} ms");
    }
    assert_eq!(rig.relay_lines(), (false, false));
}

#[test]
fn relay_backstop_survives_a_skipped_poll() {
    let rig = Rig::new(fast_config(), true);
    let mut gate = rig.gate();
    gate.relay_mut().set_scheduled_release_enabled(false);
    gate.open().unwrap();

    // Host loop stalls for three pulse widths, then polls once.
    rig.clock.advance(rig.config.relay_pulse_ms * 3);
    gate.update();
    assert!(!gate.is_relay_active());
}

#[test]
fn failing_relay_line_rejects_command() {
    let rig = Rig::new(fast_config(), true);
    let mut gate = rig.gate();
    rig.relay_open.set_failing(true);

    assert_eq!(gate.open(), Err(Rejection::RelayFault));
    assert_eq!(gate.state(), GateState::Closed);
    assert!(!gate.is_relay_active());
}

#[test]
fn failing_sensor_holds_last_reading() {
    let rig = Rig::new(fast_config(), true);
    let mut gate = rig.gate();
    rig.sensor.set_failing(true);
    rig.set_sensor_closed(false);
    rig.run_gate(&mut gate, 500);
    assert_eq!(gate.state(), GateState::Closed);
}
