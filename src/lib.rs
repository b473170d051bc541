//! Structured logging core: pluggable sinks, bounded persistent history,
//! log events, auto-expiring performance marks and self-diagnostics.

pub mod config;
#[macro_use]
pub mod logging;

pub use config::{ConfigError, LoggerConfig, Profile, SettingsProvider};
pub use logging::global;
pub use logging::{LevelSpec, LogApi, LogArg, LogEntry, Logger, LoggerBuilder, Severity};
