//! Remote command inbox.
//!
//! A bounded `embassy-sync` channel bridging command sources on other
//! threads (console reader, network tasks) to the synchronous control
//! loop, which drains it once per tick.
//!
//! ```text
//! ┌──────────────┐  GateCommand  ┌──────────────┐
//! │ console / io │──────────────▶│ control loop │
//! └──────────────┘               └──────────────┘
//! ```
//!
//! Handles are cheap `Arc` clones; there is no static channel.

use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::app::commands::GateCommand;
use crate::error::{Error, Result};

/// Commands buffered between two control ticks.
pub const INBOX_DEPTH: usize = 8;

type CommandChannel = Channel<CriticalSectionRawMutex, GateCommand, INBOX_DEPTH>;

#[derive(Clone)]
pub struct CommandInbox {
    channel: Arc<CommandChannel>,
}

impl Default for CommandInbox {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandInbox {
    pub fn new() -> Self {
        Self {
            channel: Arc::new(Channel::new()),
        }
    }

    /// Queue a command.  Returns `false` (and drops it) when full.
    pub fn push(&self, command: GateCommand) -> bool {
        match self.channel.try_send(command) {
            Ok(()) => true,
            Err(_) => {
                warn!("Inbox: full, {} dropped", command);
                false
            }
        }
    }

    /// Parse a raw payload and queue it.  `Ok` only once the command is
    /// actually in the queue.
    pub fn submit_raw(&self, payload: &[u8]) -> Result<GateCommand> {
        let command = GateCommand::from_bytes(payload)?;
        if !self.push(command) {
            return Err(Error::InboxFull);
        }
        Ok(command)
    }

    /// Take the oldest queued command.
    pub fn pop(&self) -> Option<GateCommand> {
        self.channel.try_receive().ok()
    }

    /// Iterate until the inbox is empty.
    pub fn drain(&self) -> impl Iterator<Item = GateCommand> + '_ {
        core::iter::from_fn(|| self.pop())
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}
