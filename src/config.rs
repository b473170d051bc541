// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Logger configuration file types and parsing.
//!
//! JSON5 format (comments and trailing commas allowed). Every field has a
//! default, so `{}` is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::logging::{
    LevelSpec, PerformanceSettings, RotationPolicy, Severity, DEFAULT_HISTORY_KEY,
};

/// Environment variable overriding `level`
pub const ENV_LEVEL: &str = "LOGCORE_LEVEL";
/// Environment variable overriding `profile`
pub const ENV_PROFILE: &str = "LOGCORE_PROFILE";

/// Source of runtime logger settings.
///
/// `None` means "no opinion"; the logger keeps its current value.
pub trait SettingsProvider {
    fn log_level(&self) -> Option<LevelSpec>;
    fn persistence_enabled(&self) -> Option<bool>;
}

/// Deployment profile; decides the default log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Development,
    Production,
}

impl Profile {
    /// DEBUG while developing, WARN in production
    pub fn default_level(self) -> Severity {
        match self {
            Profile::Development => Severity::Debug,
            Profile::Production => Severity::Warn,
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Profile::Development
        } else {
            Profile::Production
        }
    }
}

impl std::str::FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Profile::Development),
            "production" | "prod" => Ok(Profile::Production),
            other => Err(ConfigError::InvalidProfile(other.to_string())),
        }
    }
}

/// Persistent history settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// Key holding the history array
    pub key: String,
    pub max_entries: usize,
    pub rotate_at: usize,
    /// Directory for file-backed history; in-memory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let policy = RotationPolicy::default();
        Self {
            key: DEFAULT_HISTORY_KEY.to_string(),
            max_entries: policy.max_entries,
            rotate_at: policy.rotate_at,
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PerformanceConfig {
    pub default_timeout_ms: u64,
    pub info_threshold_ms: u64,
    pub warn_threshold_ms: u64,
    pub max_active_marks: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        let settings = PerformanceSettings::default();
        Self {
            default_timeout_ms: settings.default_timeout.as_millis() as u64,
            info_threshold_ms: settings.info_threshold.as_millis() as u64,
            warn_threshold_ms: settings.warn_threshold.as_millis() as u64,
            max_active_marks: settings.max_active_marks,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConsoleConfig {
    /// ANSI colors on console lines
    pub colors: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self { colors: true }
    }
}

/// Logger configuration (JSON5 file format)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggerConfig {
    pub profile: Profile,

    /// Global level; the profile default applies when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<LevelSpec>,

    pub persistence_enabled: bool,
    pub storage: StorageConfig,
    pub performance: PerformanceConfig,
    pub console: ConsoleConfig,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            level: None,
            persistence_enabled: true,
            storage: StorageConfig::default(),
            performance: PerformanceConfig::default(),
            console: ConsoleConfig::default(),
        }
    }
}

impl LoggerConfig {
    /// Load configuration from a JSON5 file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON5 string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize as pretty JSON, which is also valid JSON5
    pub fn to_json5(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Apply `LOGCORE_LEVEL` / `LOGCORE_PROFILE` from the process environment
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(profile) = lookup(ENV_PROFILE) {
            self.profile = profile.parse()?;
        }
        if let Some(level) = lookup(ENV_LEVEL) {
            let spec = LevelSpec::from(level.trim());
            if spec.resolve().is_none() {
                return Err(ConfigError::InvalidLevel(level));
            }
            self.level = Some(spec);
        }
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(level) = &self.level {
            if level.resolve().is_none() {
                return Err(ConfigError::InvalidLevel(level.to_string()));
            }
        }
        if self.storage.key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        if self.storage.max_entries == 0 {
            return Err(ConfigError::InvalidRotation {
                max_entries: self.storage.max_entries,
                rotate_at: self.storage.rotate_at,
                reason: "max_entries must be at least 1",
            });
        }
        if self.storage.rotate_at <= self.storage.max_entries {
            return Err(ConfigError::InvalidRotation {
                max_entries: self.storage.max_entries,
                rotate_at: self.storage.rotate_at,
                reason: "rotate_at must be greater than max_entries",
            });
        }
        let perf = &self.performance;
        if perf.default_timeout_ms == 0 {
            return Err(ConfigError::InvalidPerformance(
                "default_timeout_ms must be positive".to_string(),
            ));
        }
        if perf.info_threshold_ms > perf.warn_threshold_ms {
            return Err(ConfigError::InvalidPerformance(format!(
                "info_threshold_ms ({}) exceeds warn_threshold_ms ({})",
                perf.info_threshold_ms, perf.warn_threshold_ms
            )));
        }
        Ok(())
    }

    /// Configured level, or the profile default when unset or unresolvable
    pub fn effective_level(&self) -> Severity {
        self.level
            .as_ref()
            .and_then(LevelSpec::resolve)
            .unwrap_or_else(|| self.profile.default_level())
    }

    pub fn rotation_policy(&self) -> RotationPolicy {
        RotationPolicy::new(self.storage.max_entries, self.storage.rotate_at)
    }

    pub fn performance_settings(&self) -> PerformanceSettings {
        PerformanceSettings {
            default_timeout: Duration::from_millis(self.performance.default_timeout_ms),
            info_threshold: Duration::from_millis(self.performance.info_threshold_ms),
            warn_threshold: Duration::from_millis(self.performance.warn_threshold_ms),
            max_active_marks: self.performance.max_active_marks,
        }
    }
}

impl SettingsProvider for LoggerConfig {
    fn log_level(&self) -> Option<LevelSpec> {
        Some(
            self.level
                .clone()
                .unwrap_or_else(|| LevelSpec::from(self.profile.default_level())),
        )
    }

    fn persistence_enabled(&self) -> Option<bool> {
        Some(self.persistence_enabled)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid log level '{0}'")]
    InvalidLevel(String),

    #[error("invalid profile '{0}' (expected development or production)")]
    InvalidProfile(String),

    #[error("storage key must not be empty")]
    EmptyStorageKey,

    #[error("invalid rotation (max_entries {max_entries}, rotate_at {rotate_at}): {reason}")]
    InvalidRotation {
        max_entries: usize,
        rotate_at: usize,
        reason: &'static str,
    },

    #[error("invalid performance settings: {0}")]
    InvalidPerformance(String),
}
