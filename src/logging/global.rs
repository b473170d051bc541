// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Process-wide logger slot and the safe accessor.
//!
//! Code that may run before the host installs a logger calls [`logger()`]
//! and gets either the live facade or an inert stand-in; it never has to
//! check.

use super::entry::LogArg;
use super::logger::Logger;
use super::Severity;
use std::sync::RwLock;
use std::time::Duration;

static GLOBAL: RwLock<Option<Logger>> = RwLock::new(None);

/// The calls every caller may make without knowing whether logging is up
pub trait LogApi: Send + Sync {
    fn log(&self, severity: Severity, module: &str, message: &str, args: Vec<LogArg>);

    fn start_performance(&self, label: &str, timeout: Option<Duration>);

    fn end_performance(&self, label: &str) -> Option<Duration>;

    fn error(&self, module: &str, message: &str) {
        self.log(Severity::Error, module, message, Vec::new());
    }

    fn warn(&self, module: &str, message: &str) {
        self.log(Severity::Warn, module, message, Vec::new());
    }

    fn info(&self, module: &str, message: &str) {
        self.log(Severity::Info, module, message, Vec::new());
    }

    fn debug(&self, module: &str, message: &str) {
        self.log(Severity::Debug, module, message, Vec::new());
    }

    fn trace(&self, module: &str, message: &str) {
        self.log(Severity::Trace, module, message, Vec::new());
    }
}

impl LogApi for Logger {
    fn log(&self, severity: Severity, module: &str, message: &str, args: Vec<LogArg>) {
        Logger::log(self, severity, module, message, args);
    }

    fn start_performance(&self, label: &str, timeout: Option<Duration>) {
        Logger::start_performance(self, label, timeout);
    }

    fn end_performance(&self, label: &str) -> Option<Duration> {
        Logger::end_performance(self, label)
    }
}

/// Stand-in used until a logger is installed; every call does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct InertLogger;

impl LogApi for InertLogger {
    fn log(&self, _severity: Severity, _module: &str, _message: &str, _args: Vec<LogArg>) {}

    fn start_performance(&self, _label: &str, _timeout: Option<Duration>) {}

    fn end_performance(&self, _label: &str) -> Option<Duration> {
        None
    }
}

/// What [`logger()`] hands out
#[derive(Clone)]
pub enum LoggerHandle {
    Live(Logger),
    Inert(InertLogger),
}

impl LoggerHandle {
    pub fn is_live(&self) -> bool {
        matches!(self, LoggerHandle::Live(_))
    }

    /// The live facade, for calls beyond [`LogApi`]
    pub fn live(&self) -> Option<&Logger> {
        match self {
            LoggerHandle::Live(logger) => Some(logger),
            LoggerHandle::Inert(_) => None,
        }
    }

    fn api(&self) -> &dyn LogApi {
        match self {
            LoggerHandle::Live(logger) => logger,
            LoggerHandle::Inert(inert) => inert,
        }
    }
}

impl LogApi for LoggerHandle {
    fn log(&self, severity: Severity, module: &str, message: &str, args: Vec<LogArg>) {
        self.api().log(severity, module, message, args);
    }

    fn start_performance(&self, label: &str, timeout: Option<Duration>) {
        self.api().start_performance(label, timeout);
    }

    fn end_performance(&self, label: &str) -> Option<Duration> {
        self.api().end_performance(label)
    }
}

/// Install `logger` as the process-wide facade.
///
/// A previously installed logger is shut down and replaced.
pub fn init(logger: Logger) {
    let previous = match GLOBAL.write() {
        Ok(mut slot) => slot.replace(logger),
        Err(poisoned) => poisoned.into_inner().replace(logger),
    };
    if let Some(previous) = previous {
        previous.shutdown();
    }
}

/// The live facade, or an inert stand-in if none is installed
pub fn logger() -> LoggerHandle {
    let live = GLOBAL
        .read()
        .ok()
        .and_then(|slot| slot.as_ref().filter(|l| l.is_initialized()).cloned());
    match live {
        Some(logger) => LoggerHandle::Live(logger),
        None => LoggerHandle::Inert(InertLogger),
    }
}

pub fn is_initialized() -> bool {
    logger().is_live()
}

/// Shut the installed facade down and revert to the inert stand-in
pub fn shutdown() {
    let taken = match GLOBAL.write() {
        Ok(mut slot) => slot.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    };
    if let Some(logger) = taken {
        logger.shutdown();
    }
}
