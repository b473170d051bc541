// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Synchronous publish/subscribe channel for "a log happened" events.
//!
//! Subscribers run in registration order on the emitting thread. A panicking
//! subscriber is contained and reported; the rest still run.

use super::console::ConsoleSink;
use super::entry::LogEntry;
use super::Severity;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Event names a subscriber can listen on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Every accepted entry
    Log,
    /// Entries of one severity
    Level(Severity),
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Log => write!(f, "log"),
            EventKind::Level(severity) => write!(f, "log:{}", severity.as_str().to_lowercase()),
        }
    }
}

/// Handle returned by `on`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Subscriber = Arc<dyn Fn(&LogEntry) + Send + Sync>;

/// Event channel keyed by [`EventKind`]
pub struct EventBus {
    subscribers: RwLock<HashMap<EventKind, Vec<(SubscriptionId, Subscriber)>>>,
    next_id: AtomicU64,
    reporter: Option<Arc<ConsoleSink>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            reporter: None,
        }
    }

    /// Bus reporting subscriber panics through `console`
    pub fn with_reporter(console: Arc<ConsoleSink>) -> Self {
        Self {
            reporter: Some(console),
            ..Self::new()
        }
    }

    /// Append a subscriber. Registering the same closure twice gives two
    /// independent subscriptions.
    pub fn on<F>(&self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&LogEntry) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut subscribers) = self.subscribers.write() {
            subscribers
                .entry(kind)
                .or_default()
                .push((id, Arc::new(callback)));
        }
        id
    }

    /// Remove a subscription. Returns false if it was not registered.
    pub fn off(&self, kind: EventKind, id: SubscriptionId) -> bool {
        let Ok(mut subscribers) = self.subscribers.write() else {
            return false;
        };
        let Some(list) = subscribers.get_mut(&kind) else {
            return false;
        };
        match list.iter().position(|(sub_id, _)| *sub_id == id) {
            Some(pos) => {
                list.remove(pos);
                if list.is_empty() {
                    subscribers.remove(&kind);
                }
                true
            }
            None => false,
        }
    }

    /// Invoke every current subscriber of `kind` in order.
    ///
    /// Returns the number of subscribers that completed without panicking.
    pub fn emit(&self, kind: EventKind, entry: &LogEntry) -> usize {
        // Snapshot so callbacks may subscribe or unsubscribe while running
        let callbacks: Vec<Subscriber> = match self.subscribers.read() {
            Ok(subscribers) => subscribers
                .get(&kind)
                .map(|list| list.iter().map(|(_, cb)| Arc::clone(cb)).collect())
                .unwrap_or_default(),
            Err(_) => return 0,
        };

        let mut completed = 0;
        for callback in callbacks {
            match catch_unwind(AssertUnwindSafe(|| callback(entry))) {
                Ok(()) => completed += 1,
                Err(panic) => self.report_panic(kind, panic.as_ref()),
            }
        }
        completed
    }

    fn report_panic(&self, kind: EventKind, panic: &(dyn Any + Send)) {
        if let Some(console) = &self.reporter {
            console.report_internal(
                Severity::Error,
                &format!(
                    "event subscriber for '{}' panicked: {}",
                    kind,
                    panic_message(panic)
                ),
            );
        }
    }

    /// Remove every subscription for every event
    pub fn clear(&self) {
        if let Ok(mut subscribers) = self.subscribers.write() {
            subscribers.clear();
        }
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers
            .read()
            .map(|s| s.get(&kind).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    pub fn total_subscribers(&self) -> usize {
        self.subscribers
            .read()
            .map(|s| s.values().map(Vec::len).sum())
            .unwrap_or(0)
    }
}

/// Best-effort text of a caught panic payload
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
