//! MQTT status and command link.
//!
//! Publishes every [`AppEvent::Status`] as the status JSON on the status
//! topic and feeds payloads from the command topic into the
//! [`CommandInbox`], where the control loop picks them up like console
//! input.  Implements [`EventSink`], so the service drives the publish side
//! directly.
//!
//! ```text
//!   AppService ──Status──▶ MqttLink ──publish──▶ broker (status topic)
//!   broker (command topic) ──▶ MqttLink ──submit_raw──▶ CommandInbox
//! ```
//!
//! ## cfg gating
//!
//! - **`espidf`**: `esp_idf_svc::mqtt::client::EspMqttClient`.  Once the
//!   client exists ESP-IDF reconnects it every `mqtt_reconnect_interval_ms`
//!   on its own; [`MqttLink::poll`] re-subscribes after each new session.
//! - **host**: an in-memory broker stand-in that records subscriptions and
//!   publishes.

use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use log::{debug, info, warn};

use super::command_inbox::CommandInbox;
use crate::app::commands::GateCommand;
use crate::app::events::{AppEvent, StatusReport};
use crate::app::ports::EventSink;
use crate::config::GateConfig;
use crate::error::Error;

#[cfg(feature = "espidf")]
use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MqttError {
    NotConnected,
    Connect,
    Subscribe,
    Publish,
    Serialize,
}

impl fmt::Display for MqttError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected to broker"),
            Self::Connect => write!(f, "broker session could not be started"),
            Self::Subscribe => write!(f, "subscribe failed"),
            Self::Publish => write!(f, "publish failed"),
            Self::Serialize => write!(f, "status serialisation failed"),
        }
    }
}

/// Connection flags shared with the client's event callback.
#[derive(Debug, Default)]
struct Session {
    connected: AtomicBool,
    /// Bumped on every broker (re)connect.
    generation: AtomicU32,
}

impl Session {
    fn on_connected(&self) {
        self.connected.store(true, Ordering::Release);
        self.generation.fetch_add(1, Ordering::AcqRel);
        info!("MQTT: connected to broker");
    }

    fn on_disconnected(&self) {
        if self.connected.swap(false, Ordering::AcqRel) {
            warn!("MQTT: connection lost");
        }
    }
}

/// Route one inbound message.  Only payloads on `command_topic` are queued;
/// returns the command that actually reached the inbox.
pub fn route_message(
    topic: Option<&str>,
    payload: &[u8],
    command_topic: &str,
    inbox: &CommandInbox,
) -> Option<GateCommand> {
    if topic != Some(command_topic) {
        debug!("MQTT: ignoring message on {:?}", topic);
        return None;
    }
    match inbox.submit_raw(payload) {
        Ok(command) => {
            info!("MQTT: {} queued", command);
            Some(command)
        }
        Err(Error::InboxFull) => {
            warn!("MQTT: inbox full, command dropped");
            None
        }
        Err(e) => {
            warn!("MQTT: {}: {:?}", e, String::from_utf8_lossy(payload));
            None
        }
    }
}

// ───────────────────────────────────────────────────────────────
// MqttLink
// ───────────────────────────────────────────────────────────────

pub struct MqttLink {
    url: String,
    client_id: String,
    status_topic: String,
    command_topic: String,
    reconnect_interval_ms: u32,
    inbox: CommandInbox,
    session: Arc<Session>,
    subscribed_generation: u32,
    last_attempt_ms: Option<u32>,
    #[cfg(feature = "espidf")]
    client: Option<EspMqttClient<'static>>,
    #[cfg(not(feature = "espidf"))]
    sim: SimBroker,
}

/// Simulated broker.
#[cfg(not(feature = "espidf"))]
#[derive(Debug, Default)]
struct SimBroker {
    open: bool,
    refuse: bool,
    attempts: u32,
    subscriptions: Vec<String>,
    published: Vec<(String, String)>,
}

impl MqttLink {
    /// Commands arriving on the command topic go to `inbox`.  Nothing is
    /// opened until [`connect`](Self::connect) or [`poll`](Self::poll).
    pub fn new(config: &GateConfig, client_id: &str, inbox: CommandInbox) -> Self {
        Self {
            url: config.mqtt_url(),
            client_id: client_id.to_owned(),
            status_topic: config.mqtt_status_topic.clone(),
            command_topic: config.mqtt_command_topic.clone(),
            reconnect_interval_ms: config.mqtt_reconnect_interval_ms,
            inbox,
            session: Arc::new(Session::default()),
            subscribed_generation: 0,
            last_attempt_ms: None,
            #[cfg(feature = "espidf")]
            client: None,
            #[cfg(not(feature = "espidf"))]
            sim: SimBroker::default(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.connected.load(Ordering::Acquire)
    }

    /// Start the broker session.  The connection itself completes in the
    /// background and is reported through [`is_connected`](Self::is_connected).
    pub fn connect(&mut self, now_ms: u32) -> Result<(), MqttError> {
        self.last_attempt_ms = Some(now_ms);
        info!("MQTT: connecting to {} as {}", self.url, self.client_id);
        self.platform_connect()
            .inspect_err(|e| warn!("MQTT: {}, retry in {} ms", e, self.reconnect_interval_ms))
    }

    /// Call once per loop iteration.  Retries a failed session start every
    /// `mqtt_reconnect_interval_ms` and subscribes to the command topic
    /// after each (re)connect.
    pub fn poll(&mut self, now_ms: u32) {
        if !self.has_session() {
            let due = self
                .last_attempt_ms
                .is_none_or(|last| now_ms.wrapping_sub(last) >= self.reconnect_interval_ms);
            if due {
                let _ = self.connect(now_ms);
            }
            return;
        }

        let generation = self.session.generation.load(Ordering::Acquire);
        if self.is_connected() && generation != self.subscribed_generation {
            match self.platform_subscribe() {
                Ok(()) => {
                    self.subscribed_generation = generation;
                    info!("MQTT: subscribed to {}", self.command_topic);
                }
                Err(e) => warn!("MQTT: {} to {}", e, self.command_topic),
            }
        }
    }

    /// Publish `report` as JSON on the status topic.
    pub fn publish_status(&mut self, report: &StatusReport) -> Result<(), MqttError> {
        if !self.is_connected() {
            return Err(MqttError::NotConnected);
        }
        let json = report.to_json().map_err(|_| MqttError::Serialize)?;
        self.platform_publish(&json)?;
        debug!("MQTT: status published to {}", self.status_topic);
        Ok(())
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(feature = "espidf")]
    fn has_session(&self) -> bool {
        self.client.is_some()
    }

    #[cfg(feature = "espidf")]
    fn platform_connect(&mut self) -> Result<(), MqttError> {
        let conf = MqttClientConfiguration {
            client_id: Some(self.client_id.as_str()),
            reconnect_timeout: Some(core::time::Duration::from_millis(u64::from(
                self.reconnect_interval_ms,
            ))),
            ..Default::default()
        };

        let session = self.session.clone();
        let inbox = self.inbox.clone();
        let command_topic = self.command_topic.clone();
        let client = EspMqttClient::new_cb(&self.url, &conf, move |event| match event.payload() {
            EventPayload::Connected(_) => session.on_connected(),
            EventPayload::Disconnected => session.on_disconnected(),
            EventPayload::Received { topic, data, .. } => {
                route_message(topic, data, &command_topic, &inbox);
            }
            EventPayload::Error(e) => warn!("MQTT: client error: {:?}", e),
            _ => {}
        })
        .map_err(|e| {
            warn!("MQTT: client start failed: {}", e);
            MqttError::Connect
        })?;

        self.client = Some(client);
        Ok(())
    }

    #[cfg(feature = "espidf")]
    fn platform_subscribe(&mut self) -> Result<(), MqttError> {
        let client = self.client.as_mut().ok_or(MqttError::NotConnected)?;
        client
            .subscribe(&self.command_topic, QoS::AtMostOnce)
            .map(|_| ())
            .map_err(|_| MqttError::Subscribe)
    }

    #[cfg(feature = "espidf")]
    fn platform_publish(&mut self, json: &str) -> Result<(), MqttError> {
        let client = self.client.as_mut().ok_or(MqttError::NotConnected)?;
        // Queued in the client's outbox; never blocks the control loop.
        client
            .enqueue(&self.status_topic, QoS::AtMostOnce, false, json.as_bytes())
            .map(|_| ())
            .map_err(|_| MqttError::Publish)
    }

    #[cfg(not(feature = "espidf"))]
    fn has_session(&self) -> bool {
        self.sim.open
    }

    #[cfg(not(feature = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), MqttError> {
        self.sim.attempts += 1;
        if self.sim.refuse {
            return Err(MqttError::Connect);
        }
        self.sim.open = true;
        self.session.on_connected();
        Ok(())
    }

    #[cfg(not(feature = "espidf"))]
    fn platform_subscribe(&mut self) -> Result<(), MqttError> {
        self.sim.subscriptions.push(self.command_topic.clone());
        Ok(())
    }

    #[cfg(not(feature = "espidf"))]
    fn platform_publish(&mut self, json: &str) -> Result<(), MqttError> {
        self.sim.published.push((self.status_topic.clone(), json.to_owned()));
        Ok(())
    }

    // ── Simulation controls ───────────────────────────────────

    /// Refuse (or accept again) new broker sessions.
    #[cfg(not(feature = "espidf"))]
    pub fn sim_refuse_connections(&mut self, refuse: bool) {
        self.sim.refuse = refuse;
    }

    #[cfg(not(feature = "espidf"))]
    pub fn sim_connect_attempts(&self) -> u32 {
        self.sim.attempts
    }

    /// Broker dropped the connection; the session object survives.
    #[cfg(not(feature = "espidf"))]
    pub fn sim_drop_connection(&mut self) {
        self.session.on_disconnected();
    }

    /// Client reconnected on its own.
    #[cfg(not(feature = "espidf"))]
    pub fn sim_restore_connection(&mut self) {
        self.session.on_connected();
    }

    /// A message arrives from the broker.
    #[cfg(not(feature = "espidf"))]
    pub fn sim_deliver(&mut self, topic: &str, payload: &[u8]) -> Option<GateCommand> {
        route_message(Some(topic), payload, &self.command_topic, &self.inbox)
    }

    #[cfg(not(feature = "espidf"))]
    pub fn sim_subscriptions(&self) -> &[String] {
        &self.sim.subscriptions
    }

    /// `(topic, payload)` of every publish so far.
    #[cfg(not(feature = "espidf"))]
    pub fn sim_published(&self) -> &[(String, String)] {
        &self.sim.published
    }
}

// ───────────────────────────────────────────────────────────────
// EventSink
// ───────────────────────────────────────────────────────────────

impl EventSink for MqttLink {
    fn emit(&mut self, event: &AppEvent) {
        if let AppEvent::Status(report) = event {
            if let Err(e) = self.publish_status(report) {
                debug!("MQTT: status not sent: {}", e);
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
