// SPDX-License-Identifier: Apache-2.0 OR MIT
// Registry of active performance marks

use super::scheduler::TimerId;
use super::Severity;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Module tag for performance log lines
pub const PERFORMANCE_MODULE: &str = "Performance";

/// Timeout and severity thresholds for performance marks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceSettings {
    /// Expiry applied when `start_performance` gets no explicit timeout
    pub default_timeout: Duration,
    /// Durations above this log at INFO
    pub info_threshold: Duration,
    /// Durations above this log at WARN
    pub warn_threshold: Duration,
    /// Active marks at or above this count are flagged by diagnostics
    pub max_active_marks: usize,
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(30),
            info_threshold: Duration::from_millis(100),
            warn_threshold: Duration::from_millis(1000),
            max_active_marks: 10,
        }
    }
}

impl PerformanceSettings {
    /// Severity for a completed mark of length `elapsed`
    pub fn severity_for(&self, elapsed: Duration) -> Severity {
        if elapsed > self.warn_threshold {
            Severity::Warn
        } else if elapsed > self.info_threshold {
            Severity::Info
        } else {
            Severity::Debug
        }
    }
}

/// An in-flight timing mark
#[derive(Debug, Clone)]
pub struct PerformanceMark {
    pub label: String,
    /// Scheduler time at start
    pub started_at: Duration,
    pub timeout: Duration,
    /// Distinguishes this mark from earlier marks under the same label
    pub generation: u64,
    pub timer: Option<TimerId>,
}

/// Serializable view of an active mark
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkSummary {
    pub label: String,
    pub elapsed_ms: u64,
    pub timeout_ms: u64,
}

/// Active marks keyed by label
#[derive(Debug, Default)]
pub struct PerformanceTracker {
    marks: Mutex<HashMap<String, PerformanceMark>>,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `mark`, returning the mark it replaced under the same label
    pub fn insert(&self, mark: PerformanceMark) -> Option<PerformanceMark> {
        self.marks
            .lock()
            .ok()
            .and_then(|mut marks| marks.insert(mark.label.clone(), mark))
    }

    /// Attach the expiry timer to the mark of `generation`, if still active.
    /// Returns false when the mark is already gone.
    pub fn attach_timer(&self, label: &str, generation: u64, timer: TimerId) -> bool {
        let Ok(mut marks) = self.marks.lock() else {
            return false;
        };
        match marks.get_mut(label) {
            Some(mark) if mark.generation == generation => {
                mark.timer = Some(timer);
                true
            }
            _ => false,
        }
    }

    pub fn remove(&self, label: &str) -> Option<PerformanceMark> {
        self.marks.lock().ok().and_then(|mut marks| marks.remove(label))
    }

    /// Remove the mark only if it is still the one of `generation`.
    ///
    /// A late expiry for a replaced mark must not remove its successor.
    pub fn expire(&self, label: &str, generation: u64) -> Option<PerformanceMark> {
        let mut marks = self.marks.lock().ok()?;
        if marks.get(label)?.generation != generation {
            return None;
        }
        marks.remove(label)
    }

    /// Remove and return every mark
    pub fn drain(&self) -> Vec<PerformanceMark> {
        self.marks
            .lock()
            .map(|mut marks| marks.drain().map(|(_, mark)| mark).collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.marks
            .lock()
            .map(|marks| marks.contains_key(label))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.marks.lock().map(|marks| marks.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Active labels, sorted
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .marks
            .lock()
            .map(|marks| marks.keys().cloned().collect())
            .unwrap_or_default();
        labels.sort();
        labels
    }

    /// Summaries of active marks relative to `now`, sorted by label
    pub fn summaries(&self, now: Duration) -> Vec<MarkSummary> {
        let mut summaries: Vec<MarkSummary> = self
            .marks
            .lock()
            .map(|marks| {
                marks
                    .values()
                    .map(|mark| MarkSummary {
                        label: mark.label.clone(),
                        elapsed_ms: millis(now.saturating_sub(mark.started_at)),
                        timeout_ms: millis(mark.timeout),
                    })
                    .collect()
            })
            .unwrap_or_default();
        summaries.sort_by(|a, b| a.label.cmp(&b.label));
        summaries
    }
}

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
