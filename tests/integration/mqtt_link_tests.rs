//! AppService publishing over the MQTT link and taking remote commands
//! from its command topic.

use swinggate::adapters::command_inbox::CommandInbox;
use swinggate::adapters::mqtt::MqttLink;
use swinggate::app::commands::GateCommand;
use swinggate::gate::GateState;

use crate::mock_hw::{RecordingSink, Rig, Service, fast_config};

const STATUS: &str = "gateguardian/status3";
const COMMAND: &str = "gateguardian/command3";

/// Closed gate, started service, link connected and subscribed.
fn connected() -> (Rig, Service, CommandInbox, (RecordingSink, MqttLink)) {
    let rig = Rig::new(fast_config(), true);
    let mut svc = rig.service();
    let inbox = CommandInbox::new();
    let mut link = MqttLink::new(&rig.config, svc.device_id(), inbox.clone());
    link.poll(rig.now());
    link.poll(rig.now());
    assert_eq!(link.sim_subscriptions(), [COMMAND]);

    let mut sinks = (RecordingSink::new(), link);
    svc.start(&mut sinks);
    (rig, svc, inbox, sinks)
}

fn published_states(link: &MqttLink) -> Vec<String> {
    link.sim_published()
        .iter()
        .map(|(topic, json)| {
            assert_eq!(topic, STATUS);
            let v: serde_json::Value = serde_json::from_str(json).unwrap();
            v["state"].as_str().unwrap().to_owned()
        })
        .collect()
}

#[test]
fn boot_and_periodic_status_reach_the_broker() {
    let (rig, mut svc, _inbox, mut sinks) = connected();
    assert_eq!(published_states(&sinks.1), ["CLOSED"]);

    rig.run_service(&mut svc, &mut sinks, 2 * rig.config.status_interval_ms);
    assert_eq!(published_states(&sinks.1), ["CLOSED", "CLOSED", "CLOSED"]);
    assert_eq!(sinks.0.statuses().len(), 3);
}

#[test]
fn remote_open_moves_the_gate_and_publishes_the_change() {
    let (rig, mut svc, inbox, mut sinks) = connected();

    assert_eq!(sinks.1.sim_deliver(COMMAND, b"OPEN"), Some(GateCommand::Open));
    for command in inbox.drain() {
        let _ = svc.handle_command(command, &mut sinks);
    }

    assert_eq!(svc.state(), GateState::Opening);
    assert_eq!(rig.relay_lines(), (true, false));
    assert_eq!(published_states(&sinks.1), ["CLOSED", "OPENING"]);
}

#[test]
fn unknown_or_foreign_messages_do_nothing() {
    let (_rig, _svc, inbox, mut sinks) = connected();
    assert_eq!(sinks.1.sim_deliver(COMMAND, b"STOP"), None);
    assert_eq!(sinks.1.sim_deliver(STATUS, b"OPEN"), None);
    assert_eq!(sinks.1.sim_deliver("gateguardian/other", b"CLOSE"), None);
    assert!(inbox.is_empty());
}

#[test]
fn status_is_skipped_while_the_broker_is_away() {
    let (rig, mut svc, _inbox, mut sinks) = connected();
    sinks.1.sim_drop_connection();
    rig.run_service(&mut svc, &mut sinks, rig.config.status_interval_ms);
    assert_eq!(published_states(&sinks.1), ["CLOSED"]);
    assert_eq!(sinks.0.statuses().len(), 2, "the log still sees every report");

    sinks.1.sim_restore_connection();
    sinks.1.poll(rig.now());
    assert_eq!(sinks.1.sim_subscriptions().len(), 2);
    rig.run_service(&mut svc, &mut sinks, rig.config.status_interval_ms);
    assert_eq!(published_states(&sinks.1), ["CLOSED", "CLOSED"]);
}
