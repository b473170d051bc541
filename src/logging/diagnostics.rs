// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Self-check report produced by `Logger::run_diagnostics`.

use serde::Serialize;

/// Storage size above which diagnostics warn
pub const STORAGE_SOFT_LIMIT_BYTES: usize = 1024 * 1024;

/// Individual self-checks, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    Sinks,
    StorageAccess,
    StorageSize,
    ActiveMarks,
    SmokeTest,
    Persistence,
}

impl Check {
    pub fn as_str(self) -> &'static str {
        match self {
            Check::Sinks => "sinks",
            Check::StorageAccess => "storage_access",
            Check::StorageSize => "storage_size",
            Check::ActiveMarks => "active_marks",
            Check::SmokeTest => "smoke_test",
            Check::Persistence => "persistence",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Warn,
    Fail,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub check: Check,
    pub outcome: Outcome,
    pub message: String,
}

/// Findings grouped by outcome
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagnosticReport {
    pub timestamp: i64,
    pub passed: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub failures: Vec<Finding>,
    pub info: Vec<Finding>,
}

impl DiagnosticReport {
    pub fn new() -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp_millis(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, check: Check, outcome: Outcome, message: impl Into<String>) {
        let finding = Finding {
            check,
            outcome,
            message: message.into(),
        };
        match outcome {
            Outcome::Pass => self.passed.push(finding),
            Outcome::Warn => self.warnings.push(finding),
            Outcome::Fail => self.failures.push(finding),
            Outcome::Info => self.info.push(finding),
        }
    }

    pub fn pass(&mut self, check: Check, message: impl Into<String>) {
        self.record(check, Outcome::Pass, message);
    }

    pub fn warn(&mut self, check: Check, message: impl Into<String>) {
        self.record(check, Outcome::Warn, message);
    }

    pub fn fail(&mut self, check: Check, message: impl Into<String>) {
        self.record(check, Outcome::Fail, message);
    }

    pub fn note(&mut self, check: Check, message: impl Into<String>) {
        self.record(check, Outcome::Info, message);
    }

    /// No check failed (warnings allowed)
    pub fn healthy(&self) -> bool {
        self.failures.is_empty()
    }

    /// Outcome recorded for `check`, if it ran
    pub fn outcome_of(&self, check: Check) -> Option<Outcome> {
        self.findings().find(|f| f.check == check).map(|f| f.outcome)
    }

    /// Every finding, grouped pass/warn/fail/info
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.passed
            .iter()
            .chain(&self.warnings)
            .chain(&self.failures)
            .chain(&self.info)
    }

    /// One-line tally, e.g. `4 passed, 1 warning, 0 failed, 1 info`
    pub fn summary(&self) -> String {
        format!(
            "{} passed, {} warning{}, {} failed, {} info",
            self.passed.len(),
            self.warnings.len(),
            if self.warnings.len() == 1 { "" } else { "s" },
            self.failures.len(),
            self.info.len()
        )
    }
}
