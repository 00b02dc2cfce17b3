//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them, such as logging to serial or
//! recording in a test.

use serde::Serialize;

use crate::gate::{GateState, Rejection};

use super::commands::GateCommand;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service has started (carries the boot state).
    Started(GateState),

    /// The inferred gate position changed.
    StateChanged { from: GateState, to: GateState },

    /// A command was accepted and a relay pulse started.
    CommandAccepted(GateCommand),

    /// A command had no effect.
    CommandRejected {
        command: GateCommand,
        reason: Rejection,
    },

    /// Status snapshot, sent on every state change and periodically.
    Status(StatusReport),
}

/// Point-in-time status suitable for logging or transmission.
///
/// Serialises to the flat JSON object consumed by remote dashboards:
///
/// ```json
/// {"device_id":"gate-a1b2c3","timestamp":12,"state":"CLOSED",
///  "sensor_raw":true,"relay_active":false,"moving":false,"uptime":12}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub device_id: heapless::String<16>,
    /// Seconds since boot at the time of the report.
    pub timestamp: u32,
    pub state: GateState,
    /// Latest raw sensor level (`true` = closed).
    pub sensor_raw: bool,
    pub relay_active: bool,
    pub moving: bool,
    /// Seconds since boot.
    pub uptime: u32,
}

impl StatusReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
