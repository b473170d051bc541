// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Persistent sink: bounded, rotated history in a backing store.
//!
//! The whole history lives under a single key as a JSON array of
//! [`PersistedEntry`] records. Every write is a read-modify-write of that
//! array followed by the rotation policy.

use super::console::ConsoleSink;
use super::entry::{LogEntry, PersistedEntry};
use super::sink::{LogSink, SinkControl, SinkError};
use super::storage::{StorageBackend, StorageError};
use super::Severity;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Default storage key for the history array
pub const DEFAULT_HISTORY_KEY: &str = "logcore.history";

const PROBE_KEY: &str = "logcore.probe";

/// Bounds for the persisted array.
///
/// The array never exceeds `max_entries` and never reaches `rotate_at`;
/// once a write crosses the bound the oldest entries are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Entries kept after a trim
    pub max_entries: usize,
    /// Hard ceiling on the array length
    pub rotate_at: usize,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_entries: 500,
            rotate_at: 1000,
        }
    }
}

impl RotationPolicy {
    pub fn new(max_entries: usize, rotate_at: usize) -> Self {
        Self {
            max_entries,
            rotate_at,
        }
    }

    /// Effective number of entries retained
    pub fn capacity(&self) -> usize {
        self.max_entries.min(self.rotate_at.saturating_sub(1))
    }

    /// Trim `entries` to the most recent `capacity()`, oldest first.
    ///
    /// Returns true when entries were dropped.
    pub fn apply<T>(&self, entries: &mut Vec<T>) -> bool {
        let excess = entries.len().saturating_sub(self.capacity());
        if excess == 0 {
            return false;
        }
        entries.drain(..excess);
        true
    }
}

/// Sink appending WARN-or-more-critical entries to a backing store
pub struct PersistentSink {
    name: String,
    control: SinkControl,
    store: Arc<dyn StorageBackend>,
    key: String,
    policy: RotationPolicy,
    reporter: Option<Arc<ConsoleSink>>,
    degraded: AtomicBool,
    rotations: AtomicU64,
    write_lock: Mutex<()>,
}

impl PersistentSink {
    pub fn new(store: Arc<dyn StorageBackend>) -> Self {
        Self {
            name: "storage".to_string(),
            control: SinkControl::new(Severity::Warn),
            store,
            key: DEFAULT_HISTORY_KEY.to_string(),
            policy: RotationPolicy::default(),
            reporter: None,
            degraded: AtomicBool::new(false),
            rotations: AtomicU64::new(0),
            write_lock: Mutex::new(()),
        }
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn policy(mut self, policy: RotationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Console used for the one-time degradation warning
    pub fn reporter(mut self, console: Arc<ConsoleSink>) -> Self {
        self.reporter = Some(console);
        self
    }

    pub fn rotation_policy(&self) -> RotationPolicy {
        self.policy
    }

    pub fn history_key(&self) -> &str {
        &self.key
    }

    /// Number of writes that triggered a trim
    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    /// Whether the last write failed to reach the store
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    fn load(&self) -> Result<Vec<PersistedEntry>, SinkError> {
        match self.store.get(&self.key)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Persisted history, oldest first. Unreadable history reads as empty.
    pub fn entries(&self) -> Vec<PersistedEntry> {
        self.load().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes held by the history key
    pub fn size_bytes(&self) -> usize {
        match self.store.get(&self.key) {
            Ok(Some(raw)) => self.key.len() + raw.len(),
            _ => 0,
        }
    }

    /// Bytes held by the whole backing store
    pub fn store_size_bytes(&self) -> usize {
        self.store.size_bytes()
    }

    /// Drop the persisted history
    pub fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        self.store.remove(&self.key)
    }

    /// Check the store is reachable and writable
    pub fn probe(&self) -> Result<(), StorageError> {
        let stamp = chrono::Utc::now().timestamp_millis().to_string();
        self.store.set(PROBE_KEY, &stamp)?;
        self.store.remove(PROBE_KEY)
    }

    fn append(&self, entry: &LogEntry) -> Result<(), SinkError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| SinkError::Other("storage sink lock poisoned".to_string()))?;

        let mut history = match self.load() {
            Ok(history) => history,
            // Corrupt array: start over rather than lose every later write
            Err(SinkError::Serialization(_)) => Vec::new(),
            Err(e) => return Err(e),
        };
        history.push(PersistedEntry::from(entry));

        if self.policy.apply(&mut history) {
            self.rotations.fetch_add(1, Ordering::Relaxed);
        }

        let raw = serde_json::to_string(&history)?;
        self.store.set(&self.key, &raw)?;
        Ok(())
    }
}

impl LogSink for PersistentSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn control(&self) -> &SinkControl {
        &self.control
    }

    /// Never fails: store errors degrade to console-only operation
    fn write_entry(&self, entry: &LogEntry) -> Result<(), SinkError> {
        match self.append(entry) {
            Ok(()) => {
                self.degraded.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                let first = !self.degraded.swap(true, Ordering::Relaxed);
                if first {
                    if let Some(console) = &self.reporter {
                        console.report_internal(
                            Severity::Warn,
                            &format!("persistent history unavailable, continuing console-only: {}", e),
                        );
                    }
                }
            }
        }
        Ok(())
    }
}
