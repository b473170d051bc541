// SPDX-License-Identifier: Apache-2.0 OR MIT
//! File-backed history survives the logger that wrote it; a failing store
//! degrades to console-only output.

use crate::common::{config_at, test_logger};
use logcore::logging::{
    BufferedConsole, FileStorage, HistoryFilter, LogApi, LogExport, ManualScheduler, MemoryStorage,
    StorageBackend, DEFAULT_HISTORY_KEY,
};
use logcore::{Logger, Severity};
use std::sync::Arc;

fn file_logger(dir: &std::path::Path) -> Logger {
    let mut config = config_at(Severity::Trace);
    config.storage.dir = Some(dir.to_path_buf());
    Logger::builder()
        .config(config)
        .console_output(Box::new(BufferedConsole::new()))
        .scheduler(Arc::new(ManualScheduler::new()))
        .build()
}

#[test]
fn test_history_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let first = file_logger(dir.path());
    first.error("Chat", "before restart");
    first.warn("Effects", "also before");
    first.shutdown();

    let second = file_logger(dir.path());
    second.error("Chat", "after restart");

    let messages: Vec<String> = second
        .history(&HistoryFilter::new())
        .into_iter()
        .map(|e| e.message)
        .collect();
    assert_eq!(messages, vec!["before restart", "also before", "after restart"]);
    assert!(dir
        .path()
        .join(format!("{}.json", DEFAULT_HISTORY_KEY))
        .exists());
}

#[test]
fn test_persisted_layout() {
    let dir = tempfile::tempdir().unwrap();
    let logger = file_logger(dir.path());
    let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    logger.error_with(
        "Storage",
        "write failed",
        vec![
            logcore::LogArg::error(&err),
            logcore::LogArg::json(&serde_json::json!({ "attempt": 3 })),
        ],
    );

    let store = FileStorage::open(dir.path()).unwrap();
    let raw = store.get(DEFAULT_HISTORY_KEY).unwrap().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entry = &parsed[0];
    assert_eq!(entry["level"], "ERROR");
    assert_eq!(entry["module"], "Storage");
    assert_eq!(entry["message"], "write failed");
    assert!(entry["timestamp"].is_i64());
    assert!(entry["stackTrace"].as_str().unwrap().contains("denied"));
    // Objects and errors are stored as strings
    assert!(entry["args"][0].is_string());
    assert_eq!(entry["args"][1], "{\"attempt\":3}");
}

#[test]
fn test_quota_degrades_to_console_once() {
    let console = Arc::new(BufferedConsole::new());
    let logger = Logger::builder()
        .config(config_at(Severity::Trace))
        .console_output(Box::new(Arc::clone(&console)))
        .storage(Arc::new(MemoryStorage::with_quota(300)))
        .scheduler(Arc::new(ManualScheduler::new()))
        .build();

    for i in 0..20 {
        logger.error("Chat", &format!("error number {}", i));
    }

    assert_eq!(console.count_containing("persistent history unavailable"), 1);
    assert_eq!(console.count_containing("[ERROR][Chat] error number"), 20);
    assert!(logger.get_sink("storage").is_some());
    let history = logger.history(&HistoryFilter::new());
    assert!(!history.is_empty() && history.len() < 20);
}

#[test]
fn test_clear_history_through_facade() {
    let t = test_logger(config_at(Severity::Trace));
    t.logger.error("Chat", "to be cleared");
    assert!(t.store.get(DEFAULT_HISTORY_KEY).unwrap().is_some());

    t.logger.clear_history().unwrap();
    assert!(t.store.get(DEFAULT_HISTORY_KEY).unwrap().is_none());
    assert!(t.logger.history(&HistoryFilter::new()).is_empty());
}

#[test]
fn test_export_written_to_disk() {
    let t = test_logger(config_at(Severity::Trace));
    t.logger.error("Chat", "exported");
    t.logger.warn("Effects", "filtered out");

    let dir = tempfile::tempdir().unwrap();
    let export = t.logger.export_logs(&HistoryFilter::new().module("Chat"));
    let path = export.write_to(dir.path()).unwrap();

    let read_back: LogExport =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(read_back.count, 1);
    assert_eq!(read_back.filters.module.as_deref(), Some("Chat"));
    assert_eq!(read_back.entries[0].message, "exported");
}

#[test]
fn test_without_storage_has_empty_history() {
    let logger = Logger::builder()
        .without_storage()
        .console_output(Box::new(BufferedConsole::new()))
        .scheduler(Arc::new(ManualScheduler::new()))
        .build();
    LogApi::error(&logger, "Chat", "nowhere to persist");

    assert!(logger.history(&HistoryFilter::new()).is_empty());
    assert!(logger.clear_history().is_ok());
    assert_eq!(logger.sink_names(), vec!["console"]);
}
