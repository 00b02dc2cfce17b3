//! Line-oriented command console.
//!
//! Reads `OPEN` / `CLOSE` / `TOGGLE` lines from stdin (UART0 on the
//! device) on a dedicated thread and queues them on the
//! [`CommandInbox`].  Unknown lines are logged and skipped.

use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{error, info, warn};

use super::command_inbox::CommandInbox;
use crate::error::Error;

const CONSOLE_STACK_SIZE: usize = 4096;

/// Back-off after a non-blocking read found no data.
const IDLE_BACKOFF: Duration = Duration::from_millis(50);

/// Start the stdin reader thread.
pub fn spawn_console_reader(inbox: CommandInbox) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("console".into())
        .stack_size(CONSOLE_STACK_SIZE)
        .spawn(move || {
            let queued = read_commands(io::stdin().lock(), &inbox);
            info!("Console: input closed after {} commands", queued);
        })
}

/// Feed every line from `reader` into `inbox` until EOF or a hard error.
/// Returns the number of commands that made it into the queue; lines
/// dropped by a full inbox are not counted.
pub fn read_commands<R: BufRead>(mut reader: R, inbox: &CommandInbox) -> usize {
    let mut line = String::new();
    let mut queued = 0;

    loop {
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let text = line.trim();
                if !text.is_empty() {
                    match inbox.submit_raw(text.as_bytes()) {
                        Ok(cmd) => {
                            info!("Console: {} queued", cmd);
                            queued += 1;
                        }
                        Err(Error::InboxFull) => warn!("Console: inbox full, {:?} dropped", text),
                        Err(e) => warn!("Console: {}: {:?}", e, text),
                    }
                }
                line.clear();
            }
            // Partial input stays in `line` for the next attempt.
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {
                thread::sleep(IDLE_BACKOFF);
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                warn!("Console: discarding non-UTF-8 input");
                line.clear();
            }
            Err(e) => {
                error!("Console: read failed: {}", e);
                break;
            }
        }
    }
    queued
}
