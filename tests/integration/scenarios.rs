// SPDX-License-Identifier: Apache-2.0 OR MIT
//! End-to-end facade behavior: global gate, sink thresholds, rotation and
//! shutdown.

use crate::common::{config_at, memory_sink, test_logger};
use logcore::logging::{ErrorInfo, EventKind, HistoryFilter, LogArg, Scheduler};
use logcore::Severity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Entries below the global level never reach a sink or the counters;
/// an error with an error-like argument carries its stack trace.
#[test]
fn test_error_level_gate_and_stack_trace() {
    let t = test_logger(config_at(Severity::Info));
    let (memory, sink) = memory_sink("memory", Severity::Trace);
    t.logger.add_sink(sink);

    t.logger.set_log_level("ERROR");
    t.logger.info("M", "hi");
    assert!(memory.is_empty());
    assert_eq!(t.logger.statistics().counters.total_logs, 0);

    let cause = ErrorInfo::new("Error", "x").with_stack("Error: x\n    at boom (effects.rs:10)");
    t.logger
        .error_with("M", "boom", vec![LogArg::from(cause)]);

    let stats = t.logger.statistics();
    assert_eq!(stats.count_for(Severity::Error), 1);
    assert_eq!(stats.counters.total_logs, 1);

    let entries = memory.entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].stack_trace.as_deref().unwrap().contains('x'));
}

/// A WARN-threshold sink gets ERROR then WARN, never INFO
#[test]
fn test_warn_threshold_sink_receives_two_writes_in_order() {
    let t = test_logger(config_at(Severity::Trace));
    let (memory, sink) = memory_sink("warn-only", Severity::Warn);
    t.logger.add_sink(sink);

    t.logger.error("M", "first");
    t.logger.warn("M", "second");
    t.logger.info("M", "third");

    let got: Vec<(Severity, String)> = memory
        .entries()
        .into_iter()
        .map(|e| (e.severity, e.message))
        .collect();
    assert_eq!(
        got,
        vec![
            (Severity::Error, "first".to_string()),
            (Severity::Warn, "second".to_string()),
        ]
    );
}

/// 150 errors against max_entries 100 / rotate_at 200 keep the newest 100
#[test]
fn test_rotation_keeps_most_recent() {
    let mut config = config_at(Severity::Trace);
    config.storage.max_entries = 100;
    config.storage.rotate_at = 200;
    let t = test_logger(config);

    for i in 0..150 {
        t.logger.error("M", &format!("error {}", i));
    }

    let history = t.logger.history(&HistoryFilter::new());
    assert_eq!(history.len(), 100);
    assert_eq!(history.first().unwrap().message, "error 50");
    assert_eq!(history.last().unwrap().message, "error 149");
    assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

/// After shutdown no listener fires and no pending mark expires
#[test]
fn test_shutdown_silences_listeners_and_expiry() {
    let t = test_logger(config_at(Severity::Trace));
    let (memory, sink) = memory_sink("memory", Severity::Trace);
    t.logger.add_sink(sink);

    let fired = Arc::new(AtomicUsize::new(0));
    for kind in [EventKind::Log, EventKind::Level(Severity::Error)] {
        let fired = Arc::clone(&fired);
        t.logger.events().on(kind, move |_| {
            fired.fetch_add(1, Ordering::SeqCst);
        });
    }
    t.logger.start_performance("pending", Some(Duration::from_secs(10)));

    t.logger.shutdown();
    t.logger.error("M", "after shutdown");
    t.clock.advance(Duration::from_secs(30));

    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert!(memory.is_empty());
    assert_eq!(t.console.count_containing("expired"), 0);
    assert_eq!(t.clock.pending(), 0);
}

#[test]
fn test_history_filters_through_facade() {
    let t = test_logger(config_at(Severity::Trace));
    t.logger.error("Chat", "chat error");
    t.logger.warn("Chat", "chat warning");
    t.logger.error("Effects", "effects error");
    t.logger.info("Chat", "not persisted");

    let chat_errors = t
        .logger
        .history(&HistoryFilter::new().module("Chat").level(Severity::Error));
    assert_eq!(chat_errors.len(), 1);
    assert_eq!(chat_errors[0].message, "chat error");

    let latest = t.logger.history(&HistoryFilter::new().limit(1));
    assert_eq!(latest[0].message, "effects error");

    let export = t.logger.export_logs(&HistoryFilter::new());
    assert_eq!(export.count, 3);
}

#[test]
fn test_statistics_snapshot_cannot_mutate_logger() {
    let t = test_logger(config_at(Severity::Trace));
    t.logger.info("M", "one");

    let mut snapshot = t.logger.statistics();
    snapshot.counters.total_logs = 1000;
    snapshot.sinks.clear();

    let fresh = t.logger.statistics();
    assert_eq!(fresh.counters.total_logs, 1);
    assert_eq!(fresh.sinks.len(), 2);
}

#[test]
fn test_console_receives_formatted_lines() {
    let t = test_logger(config_at(Severity::Trace));
    t.logger.warn_with("Chat", "slow reply", vec![LogArg::from(42)]);
    assert_eq!(t.console.count_containing("[WARN][Chat] slow reply 42"), 1);
}
