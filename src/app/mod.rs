//! Application layer: orchestration around the gate core, zero I/O.
//!
//! Wires the [`GateController`](crate::gate::GateController) to the manual
//! button, the status LEDs, remote commands and the status report.  All
//! interaction with hardware happens through `embedded-hal` pins and the
//! **port traits** in [`ports`].

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
