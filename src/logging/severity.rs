// SPDX-License-Identifier: Apache-2.0 OR MIT
// Severity levels for logging (lower is more critical)

use serde::{Deserialize, Serialize};

/// Log severity levels (0-4, lower is more severe)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Failures the caller could not recover from
    Error = 0,
    /// Degraded behavior, slow operations, abandoned marks
    Warn = 1,
    /// Significant normal conditions
    Info = 2,
    /// Developer diagnostics
    Debug = 3,
    /// Fine-grained tracing
    Trace = 4,
}

impl Severity {
    /// All severities from most to least critical
    pub const ALL: [Severity; 5] = [
        Severity::Error,
        Severity::Warn,
        Severity::Info,
        Severity::Debug,
        Severity::Trace,
    ];

    /// Get severity rank as u8 (0-4)
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Get severity name as static string
    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warn => "WARN",
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
            Severity::Trace => "TRACE",
        }
    }

    /// Create from u8 rank (returns None if invalid)
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Severity::Error),
            1 => Some(Severity::Warn),
            2 => Some(Severity::Info),
            3 => Some(Severity::Debug),
            4 => Some(Severity::Trace),
            _ => None,
        }
    }

    /// Whether an entry of this severity passes a `threshold`.
    ///
    /// A threshold of `Warn` accepts `Error` and `Warn` and rejects
    /// everything more verbose.
    #[inline]
    pub const fn passes(self, threshold: Severity) -> bool {
        self.as_u8() <= threshold.as_u8()
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a level name or rank is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level: {0}")]
pub struct UnknownLevel(pub String);

impl std::str::FromStr for Severity {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(rank) = trimmed.parse::<u8>() {
            return Severity::from_u8(rank).ok_or_else(|| UnknownLevel(s.to_string()));
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "ERROR" => Ok(Severity::Error),
            "WARN" | "WARNING" => Ok(Severity::Warn),
            "INFO" => Ok(Severity::Info),
            "DEBUG" => Ok(Severity::Debug),
            "TRACE" => Ok(Severity::Trace),
            _ => Err(UnknownLevel(s.to_string())),
        }
    }
}

/// A level given either by name or by numeric rank.
///
/// Settings providers and `set_log_level` callers hand these in; resolution
/// happens late so invalid input can be ignored instead of rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelSpec {
    Rank(u8),
    Name(String),
}

impl LevelSpec {
    /// Resolve to a severity, `None` if the name or rank is unknown
    pub fn resolve(&self) -> Option<Severity> {
        match self {
            LevelSpec::Rank(rank) => Severity::from_u8(*rank),
            LevelSpec::Name(name) => name.parse().ok(),
        }
    }
}

impl From<Severity> for LevelSpec {
    fn from(severity: Severity) -> Self {
        LevelSpec::Rank(severity.as_u8())
    }
}

impl From<u8> for LevelSpec {
    fn from(rank: u8) -> Self {
        LevelSpec::Rank(rank)
    }
}

impl From<&str> for LevelSpec {
    fn from(name: &str) -> Self {
        LevelSpec::Name(name.to_string())
    }
}

impl From<String> for LevelSpec {
    fn from(name: String) -> Self {
        LevelSpec::Name(name)
    }
}

impl std::fmt::Display for LevelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LevelSpec::Rank(rank) => write!(f, "{}", rank),
            LevelSpec::Name(name) => write!(f, "{}", name),
        }
    }
}
