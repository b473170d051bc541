// SPDX-License-Identifier: Apache-2.0 OR MIT
// Log counters and the owned statistics snapshot

use super::performance::{millis, MarkSummary};
use super::sink::SinkSummary;
use super::Severity;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Counters {
    total_logs: u64,
    by_level: [u64; Severity::ALL.len()],
    by_module: HashMap<String, u64>,
    start_time: i64,
    started: Instant,
}

impl Counters {
    fn new() -> Self {
        Self {
            total_logs: 0,
            by_level: [0; Severity::ALL.len()],
            by_module: HashMap::new(),
            start_time: chrono::Utc::now().timestamp_millis(),
            started: Instant::now(),
        }
    }
}

/// Copy of the counters at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub total_logs: u64,
    pub by_level: BTreeMap<Severity, u64>,
    pub by_module: BTreeMap<String, u64>,
    /// Wall-clock ms when counting (re)started
    pub start_time: i64,
    pub uptime_ms: u64,
}

/// Monotonic log counters plus init metadata that survives resets
#[derive(Debug)]
pub struct Statistics {
    counters: Mutex<Counters>,
    initialized_at: i64,
    init_duration: Duration,
}

impl Statistics {
    pub fn new(initialized_at: i64, init_duration: Duration) -> Self {
        Self {
            counters: Mutex::new(Counters::new()),
            initialized_at,
            init_duration,
        }
    }

    /// Count one accepted entry
    pub fn record(&self, severity: Severity, module: &str) {
        if let Ok(mut counters) = self.counters.lock() {
            counters.total_logs += 1;
            counters.by_level[severity.as_u8() as usize] += 1;
            match counters.by_module.get_mut(module) {
                Some(count) => *count += 1,
                None => {
                    counters.by_module.insert(module.to_string(), 1);
                }
            }
        }
    }

    /// Zero the counters and restart the clock
    pub fn reset(&self) {
        if let Ok(mut counters) = self.counters.lock() {
            *counters = Counters::new();
        }
    }

    pub fn total_logs(&self) -> u64 {
        self.counters.lock().map(|c| c.total_logs).unwrap_or(0)
    }

    pub fn initialized_at(&self) -> i64 {
        self.initialized_at
    }

    pub fn init_duration(&self) -> Duration {
        self.init_duration
    }

    pub fn counters(&self) -> CounterSnapshot {
        match self.counters.lock() {
            Ok(counters) => CounterSnapshot {
                total_logs: counters.total_logs,
                by_level: Severity::ALL
                    .iter()
                    .map(|s| (*s, counters.by_level[s.as_u8() as usize]))
                    .collect(),
                by_module: counters
                    .by_module
                    .iter()
                    .map(|(k, v)| (k.clone(), *v))
                    .collect(),
                start_time: counters.start_time,
                uptime_ms: millis(counters.started.elapsed()),
            },
            Err(_) => CounterSnapshot {
                total_logs: 0,
                by_level: BTreeMap::new(),
                by_module: BTreeMap::new(),
                start_time: self.initialized_at,
                uptime_ms: 0,
            },
        }
    }
}

/// Owned view of the facade's state; mutating it affects nothing
#[derive(Debug, Clone, Serialize)]
pub struct StatisticsSnapshot {
    #[serde(flatten)]
    pub counters: CounterSnapshot,
    pub initialized_at: i64,
    pub init_duration_ms: u64,
    pub log_level: Severity,
    pub persistence_enabled: bool,
    pub sinks: Vec<SinkSummary>,
    pub active_marks: usize,
    pub active_mark_details: Vec<MarkSummary>,
    pub history_len: usize,
    pub storage_bytes: usize,
    pub rotations: u64,
}

impl StatisticsSnapshot {
    pub fn count_for(&self, severity: Severity) -> u64 {
        self.counters.by_level.get(&severity).copied().unwrap_or(0)
    }

    pub fn count_for_module(&self, module: &str) -> u64 {
        self.counters.by_module.get(module).copied().unwrap_or(0)
    }
}
