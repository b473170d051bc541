// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Performance marks on the real schedulers: tokio tasks under paused time,
//! and the polled system clock used outside a runtime.

use crate::common::{config_at, memory_sink};
use logcore::logging::{BufferedConsole, ManualScheduler, MemoryStorage, PERFORMANCE_MODULE};
use logcore::{Logger, Severity};
use std::sync::Arc;
use std::time::Duration;

fn runtime_logger() -> (Logger, Arc<logcore::logging::MemorySink>) {
    let (memory, sink) = memory_sink("memory", Severity::Trace);
    // No explicit scheduler: inside a runtime the tokio one is picked
    let logger = Logger::builder()
        .config(config_at(Severity::Trace))
        .console_output(Box::new(BufferedConsole::new()))
        .storage(Arc::new(MemoryStorage::new()))
        .sink(sink)
        .build();
    (logger, memory)
}

#[tokio::test(start_paused = true)]
async fn test_tokio_expiry_fires_once() {
    let (logger, memory) = runtime_logger();
    logger.start_performance("upload", Some(Duration::from_secs(5)));

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(logger.active_marks(), 1);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(logger.active_marks(), 0);

    tokio::time::sleep(Duration::from_secs(60)).await;
    let expired: Vec<_> = memory
        .entries()
        .into_iter()
        .filter(|e| e.module == PERFORMANCE_MODULE && e.message.contains("expired"))
        .collect();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].severity, Severity::Warn);
    assert!(expired[0].message.contains("'upload'"));
    logger.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_tokio_end_before_expiry() {
    let (logger, memory) = runtime_logger();
    logger.start_performance("render", Some(Duration::from_secs(5)));

    tokio::time::sleep(Duration::from_millis(200)).await;
    let elapsed = logger.end_performance("render").unwrap();
    assert!(elapsed >= Duration::from_millis(200));

    tokio::time::sleep(Duration::from_secs(10)).await;
    let perf: Vec<_> = memory
        .entries()
        .into_iter()
        .filter(|e| e.module == PERFORMANCE_MODULE)
        .collect();
    assert_eq!(perf.len(), 1);
    assert_eq!(perf[0].severity, Severity::Info);
    assert!(perf[0].message.starts_with("render took"));
}

#[tokio::test(start_paused = true)]
async fn test_tokio_shutdown_cancels_pending_expiry() {
    let (logger, memory) = runtime_logger();
    logger.start_performance("a", Some(Duration::from_secs(1)));
    logger.start_performance("b", Some(Duration::from_secs(2)));

    logger.shutdown();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(memory.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_dropped_logger_expiry_is_harmless() {
    let (logger, memory) = runtime_logger();
    logger.start_performance("orphan", Some(Duration::from_secs(1)));
    drop(logger);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(memory.is_empty());
}

/// Outside a runtime overdue marks expire on the next facade call
#[test]
#[cfg_attr(tarpaulin, ignore)]
fn test_system_clock_expires_on_next_call() {
    let (memory, sink) = memory_sink("memory", Severity::Trace);
    let logger = Logger::builder()
        .config(config_at(Severity::Trace))
        .console_output(Box::new(BufferedConsole::new()))
        .storage(Arc::new(MemoryStorage::new()))
        .scheduler(Arc::new(ManualScheduler::system()))
        .sink(sink)
        .build();

    logger.start_performance("quick", Some(Duration::from_millis(20)));
    logger.start_performance("long", Some(Duration::from_secs(3600)));
    std::thread::sleep(Duration::from_millis(60));

    assert_eq!(logger.active_mark_labels(), vec!["long"]);
    assert_eq!(
        memory
            .entries()
            .iter()
            .filter(|e| e.message.contains("expired"))
            .count(),
        1
    );
    logger.shutdown();
}
