// SPDX-License-Identifier: Apache-2.0 OR MIT
// History filtering and JSON export

use super::entry::PersistedEntry;
use super::Severity;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to serialize export: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to write export to '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Conjunctive filter over persisted history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryFilter {
    /// Exact severity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Severity>,
    /// Exact module name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Earliest timestamp (ms since epoch), inclusive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<i64>,
    /// Keep only the most recent N matches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl HistoryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: Severity) -> Self {
        self.level = Some(level);
        self
    }

    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn since(mut self, timestamp: i64) -> Self {
        self.since = Some(timestamp);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, entry: &PersistedEntry) -> bool {
        self.level.map_or(true, |level| entry.level == level)
            && self.module.as_deref().map_or(true, |m| entry.module == m)
            && self.since.map_or(true, |since| entry.timestamp >= since)
    }

    /// Filter `entries` (oldest first), keeping chronological order
    pub fn apply(&self, entries: Vec<PersistedEntry>) -> Vec<PersistedEntry> {
        let mut matched: Vec<PersistedEntry> =
            entries.into_iter().filter(|e| self.matches(e)).collect();
        if let Some(limit) = self.limit {
            let excess = matched.len().saturating_sub(limit);
            matched.drain(..excess);
        }
        matched
    }
}

/// Filtered history packaged as a standalone JSON document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogExport {
    /// RFC 3339 time of export
    pub exported_at: String,
    pub filters: HistoryFilter,
    pub count: usize,
    pub entries: Vec<PersistedEntry>,
}

impl LogExport {
    pub fn new(filters: HistoryFilter, entries: Vec<PersistedEntry>) -> Self {
        let now = chrono::Utc::now();
        Self {
            exported_at: now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            filters,
            count: entries.len(),
            entries,
        }
    }

    /// Suggested file name, stamped with the export time
    pub fn file_name(&self) -> String {
        let stamp = chrono::DateTime::parse_from_rfc3339(&self.exported_at)
            .map(|dt| dt.format("%Y%m%d-%H%M%S").to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        format!("logcore-export-{}.json", stamp)
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the export into `dir` under [`file_name`](Self::file_name)
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ExportError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(self.file_name());
        let json = self.to_json()?;
        std::fs::write(&path, json).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}
