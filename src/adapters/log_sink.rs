//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the logger
//! (UART / USB-CDC in production).  Status reports go out as one JSON line
//! so a serial monitor doubles as the status channel.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={}", state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from, to);
            }
            AppEvent::CommandAccepted(cmd) => {
                info!("CMD   | {} accepted", cmd);
            }
            AppEvent::CommandRejected { command, reason } => {
                warn!("CMD   | {} rejected: {}", command, reason);
            }
            AppEvent::Status(report) => match report.to_json() {
                Ok(json) => info!("STATUS| {}", json),
                Err(e) => error!("STATUS| serialisation failed: {}", e),
            },
        }
    }
}
