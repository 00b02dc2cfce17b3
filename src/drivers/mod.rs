//! Operator-facing peripheral drivers: the manual button and status LEDs.

pub mod button;
pub mod status_led;
