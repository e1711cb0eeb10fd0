//! Power control types (C4 §4.4/§6).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A power control operation submitted via `chassis power <subcommand>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerCommand {
    On,
    Off,
    Cycle,
    Reset,
    Status,
}

impl fmt::Display for PowerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Cycle => "cycle",
            Self::Reset => "reset",
            Self::Status => "status",
        };
        f.write_str(s)
    }
}

/// The observed chassis power state, parsed from `chassis power status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerState {
    On,
    Off,
    Unknown,
}

impl PowerState {
    #[must_use]
    pub fn parse_status_output(output: &str) -> Self {
        let lowered = output.to_lowercase();
        if lowered.contains("is on") {
            Self::On
        } else if lowered.contains("is off") {
            Self::Off
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_power_status_output() {
        assert_eq!(PowerState::parse_status_output("Chassis Power is on"), PowerState::On);
        assert_eq!(PowerState::parse_status_output("Chassis Power is off"), PowerState::Off);
        assert_eq!(PowerState::parse_status_output("garbage"), PowerState::Unknown);
    }
}
