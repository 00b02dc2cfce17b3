//! AppService driven through simulated button, sensor and console input.

use std::io::Cursor;

use swinggate::adapters::command_inbox::CommandInbox;
use swinggate::adapters::console::read_commands;
use swinggate::app::commands::GateCommand;
use swinggate::app::events::AppEvent;
use swinggate::drivers::status_led::LedPattern;
use swinggate::gate::{GateState, Rejection};

use crate::mock_hw::{RecordingSink, Rig, Service, fast_config};

/// Start a service on a closed gate and clear the boot events.
fn started_closed() -> (Rig, Service, RecordingSink) {
    let rig = Rig::new(fast_config(), true);
    let mut svc = rig.service();
    let mut sink = RecordingSink::new();
    svc.start(&mut sink);
    sink.clear();
    (rig, svc, sink)
}

/// Press the button while the gate leaves the switch.  The press settles
/// at t = 15 ms, the same tick the sensor settles "not closed".
fn press_to_open(rig: &Rig, svc: &mut Service, sink: &mut RecordingSink) {
    rig.press_button();
    rig.set_sensor_closed(false);
    rig.run_service(svc, sink, 15);
}

#[test]
fn start_reports_boot_state() {
    let rig = Rig::new(fast_config(), true);
    let mut svc = rig.service();
    let mut sink = RecordingSink::new();
    svc.start(&mut sink);

    assert_eq!(sink.events[0], AppEvent::Started(GateState::Closed));
    assert_eq!(sink.statuses().len(), 1);
    assert_eq!(svc.led().pattern(), LedPattern::SolidRed);
    assert_eq!(rig.led_levels(), (true, false));
}

#[test]
fn button_press_opens_closed_gate() {
    let (rig, mut svc, mut sink) = started_closed();
    press_to_open(&rig, &mut svc, &mut sink);

    assert_eq!(svc.state(), GateState::Opening);
    assert!(sink.events.contains(&AppEvent::CommandAccepted(GateCommand::Toggle)));
    assert_eq!(sink.state_changes(), vec![(GateState::Closed, GateState::Opening)]);
    assert_eq!(rig.relay_lines(), (true, false));
    assert_eq!(svc.led().pattern(), LedPattern::BlinkGreen);
    assert_eq!(rig.led_levels(), (false, true));
}

#[test]
fn press_while_moving_is_ignored() {
    let (rig, mut svc, mut sink) = started_closed();
    press_to_open(&rig, &mut svc, &mut sink);
    rig.release_button();
    rig.run_service(&mut svc, &mut sink, 200);
    assert_eq!(svc.state(), GateState::Opening);

    rig.press_button();
    rig.run_service(&mut svc, &mut sink, 50);

    assert_eq!(svc.state(), GateState::Opening);
    assert_eq!(rig.relay_open.rising_edges(), 1);
    assert_eq!(rig.relay_close.rising_edges(), 0);
    assert!(
        !sink
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::CommandRejected { .. })),
        "a dropped press never reaches the controller"
    );
}

#[test]
fn full_cycle_drives_leds() {
    let (rig, mut svc, mut sink) = started_closed();
    let travel = rig.config.travel_duration_ms;

    press_to_open(&rig, &mut svc, &mut sink);
    rig.release_button();
    rig.run_service(&mut svc, &mut sink, travel + 20);
    assert_eq!(svc.state(), GateState::Open);
    assert_eq!(svc.led().pattern(), LedPattern::SolidGreen);
    assert_eq!(rig.led_levels(), (false, true));
    assert_eq!(rig.relay_lines(), (false, false));

    rig.press_button();
    rig.run_service(&mut svc, &mut sink, 15);
    assert_eq!(svc.state(), GateState::Closing);
    assert_eq!(rig.relay_lines(), (false, true));
    assert_eq!(rig.led_levels(), (true, false));

    rig.release_button();
    rig.run_service(&mut svc, &mut sink, rig.config.led_blink_interval_ms);
    assert_eq!(svc.led().pattern(), LedPattern::BlinkRed);
    assert_eq!(rig.led_levels(), (false, false));

    rig.set_sensor_closed(true);
    rig.run_service(&mut svc, &mut sink, 20);
    assert_eq!(svc.state(), GateState::Closed);
    assert_eq!(rig.led_levels(), (true, false));

    assert_eq!(
        sink.state_changes(),
        vec![
            (GateState::Closed, GateState::Opening),
            (GateState::Opening, GateState::Open),
            (GateState::Open, GateState::Closing),
            (GateState::Closing, GateState::Closed),
        ]
    );
}

#[test]
fn unknown_boot_blinks_both_until_resolved() {
    let rig = Rig::new(fast_config(), false);
    let mut svc = rig.service();
    let mut sink = RecordingSink::new();
    svc.start(&mut sink);

    assert_eq!(sink.events[0], AppEvent::Started(GateState::Unknown));
    assert_eq!(rig.led_levels(), (true, true));

    rig.run_service(&mut svc, &mut sink, rig.config.travel_duration_ms);
    assert_eq!(svc.state(), GateState::Open);
    assert_eq!(sink.state_changes(), vec![(GateState::Unknown, GateState::Open)]);
    assert_eq!(rig.led_levels(), (false, true));
}

#[test]
fn console_commands_reach_the_gate() {
    let (_rig, mut svc, mut sink) = started_closed();
    let inbox = CommandInbox::new();

    let queued = read_commands(Cursor::new("close\nOPEN\nwiggle\n"), &inbox);
    assert_eq!(queued, 2);

    for command in inbox.drain() {
        let _ = svc.handle_command(command, &mut sink);
    }
    assert!(inbox.is_empty());

    assert!(sink.events.contains(&AppEvent::CommandRejected {
        command: GateCommand::Close,
        reason: Rejection::WrongState(GateState::Closed),
    }));
    assert!(sink.events.contains(&AppEvent::CommandAccepted(GateCommand::Open)));
    assert_eq!(svc.state(), GateState::Opening);
}

#[test]
fn status_json_carries_device_and_state() {
    let (rig, mut svc, mut sink) = started_closed();
    rig.run_service(&mut svc, &mut sink, 3_000);

    let json = svc.status().to_json().unwrap();
    let v: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(v["device_id"], "gate-test");
    assert_eq!(v["state"], "CLOSED");
    assert_eq!(v["sensor_raw"], true);
    assert_eq!(v["relay_active"], false);
    assert_eq!(v["moving"], false);
    assert_eq!(v["timestamp"], 3);
    assert_eq!(v["uptime"], 3);
}

#[test]
fn status_published_on_interval_and_on_change() {
    let (rig, mut svc, mut sink) = started_closed();
    rig.run_service(&mut svc, &mut sink, 3_000);
    assert_eq!(sink.statuses().len(), 3);
    assert!(sink.state_changes().is_empty());

    sink.clear();
    svc.handle_command(GateCommand::Open, &mut sink).unwrap();
    let statuses = sink.statuses();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].state, GateState::Opening);
    assert!(statuses[0].relay_active);
}
