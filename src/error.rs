//! Unified error types for the SwingGate firmware.
//!
//! The gate core never fails fatally: every precondition failure degrades
//! to "no effect" and is reported through the typed rejections in
//! [`crate::gate`].  The types here cover the plumbing around it
//! (configuration, pin I/O, remote command intake) and funnel into a single
//! [`Error`] so the entry point and the command surfaces handle them
//! uniformly.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration failed validation.
    Config(ConfigError),
    /// A GPIO read or write failed.
    Pin(PinError),
    /// A remote command payload could not be parsed.
    Command(CommandParseError),
    /// The command inbox was full and the command was dropped.
    InboxFull,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Pin(e) => write!(f, "pin: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::InboxFull => write!(f, "command inbox full"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field failed range validation.  The message names the field.
    Invalid(&'static str),
    /// The configuration document was not valid JSON for `GateConfig`.
    Malformed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Malformed => write!(f, "malformed configuration document"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Pin errors
// ---------------------------------------------------------------------------

/// Output failures surfaced by `embedded-hal` pin implementations.
///
/// Input drivers log read failures and keep their last stable level, so only
/// writes are ever reported upward (as a relay fault).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinError {
    Write,
}

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write => write!(f, "GPIO write failed"),
        }
    }
}

impl From<PinError> for Error {
    fn from(e: PinError) -> Self {
        Self::Pin(e)
    }
}

// ---------------------------------------------------------------------------
// Command parse errors
// ---------------------------------------------------------------------------

/// The payload was not one of `OPEN`, `CLOSE` or `TOGGLE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandParseError;

impl fmt::Display for CommandParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown gate command")
    }
}

impl std::error::Error for CommandParseError {}

impl From<CommandParseError> for Error {
    fn from(e: CommandParseError) -> Self {
        Self::Command(e)
    }
}

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
