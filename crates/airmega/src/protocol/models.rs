//! Normalized device state.
//!
//! The vendor reports everything as short numeric strings; these types give
//! them names. Values outside the known set are kept rather than rejected,
//! since a poll should not fail just because firmware grew a new mode.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::config::filters;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightState {
    Off,
    On,
}

impl LightState {
    pub fn from_wire(value: u8) -> Self {
        if value == 0 { Self::Off } else { Self::On }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Off => "0",
            Self::On => "2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Auto,
    Manual,
    Other(u8),
}

impl Mode {
    pub fn from_wire(value: u8) -> Self {
        match value {
            1 => Self::Auto,
            2 => Self::Manual,
            n => Self::Other(n),
        }
    }

    pub fn as_wire(&self) -> String {
        match self {
            Self::Auto => "1".to_string(),
            Self::Manual => "2".to_string(),
            Self::Other(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FanSpeed {
    Low,
    Medium,
    High,
    Other(u8),
}

impl FanSpeed {
    pub fn from_wire(value: u8) -> Self {
        match value {
            1 => Self::Low,
            2 => Self::Medium,
            3 => Self::High,
            n => Self::Other(n),
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Other(n) => *n,
        }
    }
}

impl From<u8> for FanSpeed {
    fn from(value: u8) -> Self {
        Self::from_wire(value)
    }
}

/// Dust pollution ordinal, 1 (best) to 4 (worst).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AirQuality {
    Excellent,
    Good,
    Fair,
    Inferior,
    Unknown(u8),
}

impl AirQuality {
    pub fn from_wire(value: u8) -> Self {
        match value {
            1 => Self::Excellent,
            2 => Self::Good,
            3 => Self::Fair,
            4 => Self::Inferior,
            n => Self::Unknown(n),
        }
    }
}

/// Snapshot of a purifier, rebuilt on every poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub power: bool,
    pub light: LightState,
    pub fan_speed: FanSpeed,
    pub mode: Mode,
    pub air_quality: AirQuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterRole {
    Pre,
    Main,
    Unknown,
}

impl FilterRole {
    /// Resolve the role from the vendor filter code, never from the display name.
    ///
    /// Codes have changed across firmware revisions; unrecognized codes map to
    /// `Unknown` and are logged.
    pub fn from_code(code: &str) -> Self {
        match code {
            filters::PRE_FILTER_CODE => Self::Pre,
            filters::MAIN_FILTER_CODE | filters::LEGACY_MAIN_FILTER_CODE => Self::Main,
            other => {
                warn!(code = other, "Unrecognized filter code");
                Self::Unknown
            }
        }
    }
}

impl fmt::Display for FilterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pre => write!(f, "pre-filter"),
            Self::Main => write!(f, "main filter"),
            Self::Unknown => write!(f, "unknown filter"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStatus {
    pub role: FilterRole,
    pub life_level_percent: u8,
    pub vendor_code: String,
    /// Vendor display name, informational only.
    pub name: String,
}

impl FilterStatus {
    pub fn needs_change(&self) -> bool {
        self.life_level_percent <= filters::CHANGE_THRESHOLD_PERCENT
    }
}

/// Read a small numeric field that the vendor may send as a string or a number.
pub(crate) fn wire_u8(value: &Value) -> Option<u8> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64().and_then(|n| u8::try_from(n).ok()),
        _ => None,
    }
}

/// Read a string field that may arrive as a number.
pub(crate) fn wire_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
