//! Wire types for the device API.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Relay scheduling mode as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RelayMode {
    /// Device follows the configured time slots.
    Auto,
    /// User-controlled toggle overrides scheduling.
    Manual,
}

impl fmt::Display for RelayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("AUTO"),
            Self::Manual => f.write_str("MANUAL"),
        }
    }
}

/// Snapshot returned by `GET /api/status`.
///
/// Replaced wholesale on every successful poll -- there is no partial merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Device-local clock, "HH:MM:SS".
    pub time: String,
    /// Whether the relay output is currently energized.
    pub relay: bool,
    pub mode: RelayMode,
}

/// A scheduled relay-on interval, "HH:MM" start and end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: String,
    pub end: String,
}

impl TimeSlot {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}
