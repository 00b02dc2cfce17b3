//! Fuzz target: `GateCommand::from_bytes`
//!
//! Feeds arbitrary payloads through the command parser and the inbox and
//! asserts that anything accepted round-trips through its canonical name.
//!
//! cargo fuzz run fuzz_command_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use swinggate::adapters::command_inbox::CommandInbox;
use swinggate::app::commands::GateCommand;

fuzz_target!(|data: &[u8]| {
    if let Ok(command) = GateCommand::from_bytes(data) {
        assert_eq!(GateCommand::from_bytes(command.as_str().as_bytes()), Ok(command));
        assert!(core::str::from_utf8(data).is_ok());
    }

    let inbox = CommandInbox::new();
    match inbox.submit_raw(data) {
        Ok(command) => assert_eq!(inbox.pop(), Some(command)),
        Err(_) => assert!(inbox.is_empty()),
    }
});
