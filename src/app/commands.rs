//! Inbound gate commands.
//!
//! The three verbs every command surface (button, console, remote channel)
//! maps onto.  Parsing is case-insensitive and ignores surrounding
//! whitespace, so `" open\r\n"` is `Open`.

use core::fmt;
use core::str::FromStr;

use crate::error::CommandParseError;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateCommand {
    Open,
    Close,
    Toggle,
}

impl GateCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Close => "CLOSE",
            Self::Toggle => "TOGGLE",
        }
    }

    /// Parse a raw payload (e.g. a message body).  Must be UTF-8.
    pub fn from_bytes(payload: &[u8]) -> Result<Self, CommandParseError> {
        core::str::from_utf8(payload)
            .map_err(|_| CommandParseError)?
            .parse()
    }
}

impl FromStr for GateCommand {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        [Self::Open, Self::Close, Self::Toggle]
            .into_iter()
            .find(|cmd| cmd.as_str().eq_ignore_ascii_case(s))
            .ok_or(CommandParseError)
    }
}

impl fmt::Display for GateCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
