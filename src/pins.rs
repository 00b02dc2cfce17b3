//! GPIO pin assignments for the SwingGate controller board.
//!
//! The board map.  The entry point claims typed pins from `Peripherals`
//! and refuses to boot if a claimed pin number differs from these.

// ---------------------------------------------------------------------------
// Relays (gate opener contacts)
// ---------------------------------------------------------------------------

/// Digital output: momentary "open" contact, active HIGH.
pub const RELAY_OPEN_GPIO: i32 = 2;
/// Digital output: momentary "close" contact, active HIGH.
/// Strapping pin; the relay board must not pull it low at reset.
pub const RELAY_CLOSE_GPIO: i32 = 0;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Limit switch engaged only when the gate is fully closed.
pub const GATE_SENSOR_GPIO: i32 = 22;
/// Momentary toggle button, active LOW with pull-up.
pub const BUTTON_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// Status LEDs
// ---------------------------------------------------------------------------

/// Red: solid = closed, blinking = closing.
pub const LED_RED_GPIO: i32 = 12;
/// Green: solid = open, blinking = opening.
pub const LED_GREEN_GPIO: i32 = 14;
