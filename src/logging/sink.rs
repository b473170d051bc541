// SPDX-License-Identifier: Apache-2.0 OR MIT
// Sink trait, shared sink controls and the ordered sink registry

use super::entry::LogEntry;
use super::storage::StorageError;
use super::Severity;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Errors a sink may report from `write_entry`
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("sink I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("sink serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("sink is closed")]
    Closed,

    #[error("{0}")]
    Other(String),
}

/// Enabled flag and threshold shared by every sink.
///
/// Sinks are held behind `Arc`, so both are atomics.
#[derive(Debug)]
pub struct SinkControl {
    enabled: AtomicBool,
    min_level: AtomicU8,
}

impl SinkControl {
    pub fn new(min_level: Severity) -> Self {
        Self {
            enabled: AtomicBool::new(true),
            min_level: AtomicU8::new(min_level as u8),
        }
    }

    pub fn min_level(&self) -> Severity {
        Severity::from_u8(self.min_level.load(Ordering::Relaxed)).unwrap_or(Severity::Trace)
    }

    pub fn set_min_level(&self, level: Severity) {
        self.min_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }
}

/// Output destination for log entries
pub trait LogSink: Send + Sync {
    /// Registry key (need not be unique)
    fn name(&self) -> &str;

    /// Enabled flag and threshold
    fn control(&self) -> &SinkControl;

    /// Write a log entry to the sink
    fn write_entry(&self, entry: &LogEntry) -> Result<(), SinkError>;

    /// Flush any buffered output
    fn flush(&self) {}

    /// Release resources; called once on shutdown
    fn close(&self) {}

    fn min_level(&self) -> Severity {
        self.control().min_level()
    }

    fn set_min_level(&self, level: Severity) {
        self.control().set_min_level(level);
    }

    fn is_enabled(&self) -> bool {
        self.control().is_enabled()
    }

    fn set_enabled(&self, enabled: bool) {
        self.control().set_enabled(enabled);
    }

    /// Whether an entry of `severity` should be handed to this sink
    fn accepts(&self, severity: Severity) -> bool {
        self.is_enabled() && severity.passes(self.min_level())
    }

    fn summary(&self) -> SinkSummary {
        SinkSummary {
            name: self.name().to_string(),
            min_level: self.min_level(),
            enabled: self.is_enabled(),
        }
    }
}

/// Point-in-time description of a registered sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SinkSummary {
    pub name: String,
    pub min_level: Severity,
    pub enabled: bool,
}

/// In-memory sink that keeps every entry it accepts
pub struct MemorySink {
    name: String,
    control: SinkControl,
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new(name: impl Into<String>, min_level: Severity) -> Self {
        Self {
            name: name.into(),
            control: SinkControl::new(min_level),
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Copy of everything written so far, oldest first
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().map(|mut e| e.clear()).ok();
    }
}

impl LogSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn control(&self) -> &SinkControl {
        &self.control
    }

    fn write_entry(&self, entry: &LogEntry) -> Result<(), SinkError> {
        self.entries
            .lock()
            .map_err(|_| SinkError::Other("memory sink lock poisoned".to_string()))?
            .push(entry.clone());
        Ok(())
    }
}

/// Ordered collection of sinks.
///
/// Lookup and removal by name act on the first match only; duplicate
/// names may coexist.
#[derive(Default)]
pub struct SinkRegistry {
    sinks: RwLock<Vec<Arc<dyn LogSink>>>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, sink: Arc<dyn LogSink>) {
        if let Ok(mut sinks) = self.sinks.write() {
            sinks.push(sink);
        }
    }

    /// Remove the first sink called `name`, returning it
    pub fn remove(&self, name: &str) -> Option<Arc<dyn LogSink>> {
        let mut sinks = self.sinks.write().ok()?;
        let pos = sinks.iter().position(|s| s.name() == name)?;
        Some(sinks.remove(pos))
    }

    /// First sink called `name`
    pub fn get(&self, name: &str) -> Option<Arc<dyn LogSink>> {
        let sinks = self.sinks.read().ok()?;
        sinks.iter().find(|s| s.name() == name).cloned()
    }

    /// Clone of the current list, so callers can write without holding the lock
    pub fn snapshot(&self) -> Vec<Arc<dyn LogSink>> {
        self.sinks.read().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn summaries(&self) -> Vec<SinkSummary> {
        self.snapshot().iter().map(|s| s.summary()).collect()
    }

    pub fn len(&self) -> usize {
        self.sinks.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
