// SPDX-License-Identifier: Apache-2.0 OR MIT
// Logger facade: severity gate, sink dispatch, performance marks and self-checks

use super::console::{ConsoleOutput, ConsoleSink, StdConsole};
use super::diagnostics::{Check, DiagnosticReport, STORAGE_SOFT_LIMIT_BYTES};
use super::entry::{LogArg, LogEntry, PersistedEntry};
use super::events::{panic_message, EventBus, EventKind};
use super::history::{HistoryFilter, LogExport};
use super::performance::{
    millis, MarkSummary, PerformanceMark, PerformanceSettings, PerformanceTracker,
    PERFORMANCE_MODULE,
};
use super::persistent::PersistentSink;
use super::scheduler::{default_scheduler, Scheduler};
use super::sink::{LogSink, SinkRegistry};
use super::stats::{Statistics, StatisticsSnapshot};
use super::storage::{FileStorage, MemoryStorage, StorageBackend, StorageError};
use super::{LevelSpec, Severity};
use crate::config::{LoggerConfig, Profile, SettingsProvider};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, RwLock, Weak};
use std::time::{Duration, Instant};

/// Module tag used by the diagnostics smoke test
const DIAGNOSTICS_MODULE: &str = "Diagnostics";

/// Logging facade.
///
/// Cheap to clone; every clone shares the same sinks, counters and marks.
/// None of the logging, timing or diagnostic methods return errors or
/// panic: sink, subscriber and store failures are reported through the
/// console sink and otherwise swallowed.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

struct LoggerInner {
    level: AtomicU8,
    initialized: AtomicBool,
    persistence_enabled: AtomicBool,
    profile: Profile,
    sinks: SinkRegistry,
    events: EventBus,
    console: Arc<ConsoleSink>,
    storage: Option<Arc<PersistentSink>>,
    stats: Statistics,
    marks: PerformanceTracker,
    perf_settings: RwLock<PerformanceSettings>,
    scheduler: Arc<dyn Scheduler>,
    next_generation: AtomicU64,
}

impl Logger {
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Logger with default wiring for `config`
    pub fn new(config: LoggerConfig) -> Self {
        LoggerBuilder::new().config(config).build()
    }

    /// Fire any overdue performance-mark expiries
    #[inline]
    fn poll_timers(&self) {
        self.inner.scheduler.poll();
    }

    #[inline]
    fn should_log(&self, severity: Severity) -> bool {
        self.is_initialized() && severity.passes(self.log_level())
    }

    /// Gate, count, publish and dispatch one entry
    pub fn log(&self, severity: Severity, module: &str, message: &str, args: Vec<LogArg>) {
        self.poll_timers();
        if !self.should_log(severity) {
            return;
        }

        let entry = LogEntry::new(severity, module, message, args);
        self.inner.stats.record(severity, module);

        self.inner.events.emit(EventKind::Log, &entry);
        self.inner.events.emit(EventKind::Level(severity), &entry);

        self.dispatch(&entry);
    }

    fn dispatch(&self, entry: &LogEntry) {
        // Snapshot: sinks may call back into the facade
        for sink in self.inner.sinks.snapshot() {
            if !sink.accepts(entry.severity) {
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| sink.write_entry(entry))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => self.inner.console.report_internal(
                    Severity::Error,
                    &format!("sink '{}' failed: {}", sink.name(), e),
                ),
                Err(panic) => self.inner.console.report_internal(
                    Severity::Error,
                    &format!("sink '{}' panicked: {}", sink.name(), panic_message(panic.as_ref())),
                ),
            }
        }
    }

    #[inline]
    pub fn error(&self, module: &str, message: &str) {
        self.log(Severity::Error, module, message, Vec::new());
    }

    #[inline]
    pub fn warn(&self, module: &str, message: &str) {
        self.log(Severity::Warn, module, message, Vec::new());
    }

    #[inline]
    pub fn info(&self, module: &str, message: &str) {
        self.log(Severity::Info, module, message, Vec::new());
    }

    #[inline]
    pub fn debug(&self, module: &str, message: &str) {
        self.log(Severity::Debug, module, message, Vec::new());
    }

    #[inline]
    pub fn trace(&self, module: &str, message: &str) {
        self.log(Severity::Trace, module, message, Vec::new());
    }

    /// Error with arguments; an error-like first argument supplies the stack trace
    pub fn error_with(&self, module: &str, message: &str, args: Vec<LogArg>) {
        self.log(Severity::Error, module, message, args);
    }

    pub fn warn_with(&self, module: &str, message: &str, args: Vec<LogArg>) {
        self.log(Severity::Warn, module, message, args);
    }

    pub fn info_with(&self, module: &str, message: &str, args: Vec<LogArg>) {
        self.log(Severity::Info, module, message, args);
    }

    pub fn debug_with(&self, module: &str, message: &str, args: Vec<LogArg>) {
        self.log(Severity::Debug, module, message, args);
    }

    pub fn trace_with(&self, module: &str, message: &str, args: Vec<LogArg>) {
        self.log(Severity::Trace, module, message, args);
    }

    // Performance marks

    /// Start timing `label`.
    ///
    /// An active mark under the same label is discarded with a warning. The
    /// mark expires after `timeout` (or the configured default) with a
    /// warning if `end_performance` never comes.
    pub fn start_performance(&self, label: &str, timeout: Option<Duration>) {
        self.poll_timers();
        if !self.is_initialized() {
            return;
        }

        let inner = &self.inner;
        let timeout = timeout.unwrap_or_else(|| self.performance_settings().default_timeout);
        let generation = inner.next_generation.fetch_add(1, Ordering::Relaxed);

        let replaced = inner.marks.insert(PerformanceMark {
            label: label.to_string(),
            started_at: inner.scheduler.now(),
            timeout,
            generation,
            timer: None,
        });
        if let Some(old) = replaced {
            if let Some(timer) = old.timer {
                inner.scheduler.cancel(timer);
            }
            self.warn(
                PERFORMANCE_MODULE,
                &format!("Performance mark '{}' restarted while active; previous mark discarded", label),
            );
        }

        let weak: Weak<LoggerInner> = Arc::downgrade(inner);
        let expired_label = label.to_string();
        let timer = inner.scheduler.schedule(
            timeout,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    Logger { inner }.expire_mark(&expired_label, generation);
                }
            }),
        );
        if !inner.marks.attach_timer(label, generation, timer) {
            inner.scheduler.cancel(timer);
        }
    }

    fn expire_mark(&self, label: &str, generation: u64) {
        let Some(mark) = self.inner.marks.expire(label, generation) else {
            return;
        };
        if self.is_initialized() {
            self.warn(
                PERFORMANCE_MODULE,
                &format!(
                    "Performance mark '{}' expired after {} ms without end_performance; discarded",
                    label,
                    millis(mark.timeout)
                ),
            );
        }
    }

    /// Stop timing `label` and log its duration.
    ///
    /// Returns `None` (and warns) when no mark is active under `label`.
    pub fn end_performance(&self, label: &str) -> Option<Duration> {
        self.poll_timers();
        if !self.is_initialized() {
            return None;
        }

        let Some(mark) = self.inner.marks.remove(label) else {
            self.warn(
                PERFORMANCE_MODULE,
                &format!("No active performance mark '{}'", label),
            );
            return None;
        };
        if let Some(timer) = mark.timer {
            self.inner.scheduler.cancel(timer);
        }

        let elapsed = self.inner.scheduler.now().saturating_sub(mark.started_at);
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        let severity = self.performance_settings().severity_for(elapsed);
        self.log(
            severity,
            PERFORMANCE_MODULE,
            &format!("{} took {:.1} ms", label, elapsed_ms),
            vec![LogArg::from(elapsed_ms)],
        );
        Some(elapsed)
    }

    /// Cancel every expiry timer and drop every active mark
    pub fn clear_performance_marks(&self) {
        for mark in self.inner.marks.drain() {
            if let Some(timer) = mark.timer {
                self.inner.scheduler.cancel(timer);
            }
        }
    }

    pub fn active_marks(&self) -> usize {
        self.poll_timers();
        self.inner.marks.len()
    }

    /// Labels of active marks, sorted
    pub fn active_mark_labels(&self) -> Vec<String> {
        self.poll_timers();
        self.inner.marks.labels()
    }

    pub fn active_mark_details(&self) -> Vec<MarkSummary> {
        self.poll_timers();
        self.inner.marks.summaries(self.inner.scheduler.now())
    }

    pub fn performance_settings(&self) -> PerformanceSettings {
        self.inner
            .perf_settings
            .read()
            .map(|s| *s)
            .unwrap_or_default()
    }

    pub fn set_performance_settings(&self, settings: PerformanceSettings) {
        if let Ok(mut current) = self.inner.perf_settings.write() {
            *current = settings;
        }
    }

    // Sinks and events

    /// Append a sink; names need not be unique
    pub fn add_sink(&self, sink: Arc<dyn LogSink>) {
        self.inner.sinks.add(sink);
    }

    /// Remove the first sink called `name`
    pub fn remove_sink(&self, name: &str) -> Option<Arc<dyn LogSink>> {
        self.inner.sinks.remove(name)
    }

    /// First sink called `name`
    pub fn get_sink(&self, name: &str) -> Option<Arc<dyn LogSink>> {
        self.inner.sinks.get(name)
    }

    pub fn sink_names(&self) -> Vec<String> {
        self.inner
            .sinks
            .snapshot()
            .iter()
            .map(|s| s.name().to_string())
            .collect()
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn console(&self) -> Arc<ConsoleSink> {
        Arc::clone(&self.inner.console)
    }

    /// The built-in persistent sink, if one was wired
    pub fn storage(&self) -> Option<Arc<PersistentSink>> {
        self.inner.storage.clone()
    }

    // History

    /// Persisted entries matching `filter`, oldest first
    pub fn history(&self, filter: &HistoryFilter) -> Vec<PersistedEntry> {
        match &self.inner.storage {
            Some(storage) => filter.apply(storage.entries()),
            None => Vec::new(),
        }
    }

    pub fn export_logs(&self, filter: &HistoryFilter) -> LogExport {
        LogExport::new(filter.clone(), self.history(filter))
    }

    pub fn clear_history(&self) -> Result<(), StorageError> {
        match &self.inner.storage {
            Some(storage) => storage.clear(),
            None => Ok(()),
        }
    }

    // Statistics and diagnostics

    pub fn statistics(&self) -> StatisticsSnapshot {
        self.poll_timers();
        let inner = &self.inner;
        let storage = inner.storage.as_deref();
        StatisticsSnapshot {
            counters: inner.stats.counters(),
            initialized_at: inner.stats.initialized_at(),
            init_duration_ms: millis(inner.stats.init_duration()),
            log_level: self.log_level(),
            persistence_enabled: self.persistence_enabled(),
            sinks: inner.sinks.summaries(),
            active_marks: inner.marks.len(),
            active_mark_details: inner.marks.summaries(inner.scheduler.now()),
            history_len: storage.map_or(0, PersistentSink::len),
            storage_bytes: storage.map_or(0, PersistentSink::store_size_bytes),
            rotations: storage.map_or(0, PersistentSink::rotations),
        }
    }

    /// Zero the counters; init metadata is kept
    pub fn reset_statistics(&self) {
        self.inner.stats.reset();
    }

    /// Run the self-checks in order and collect the findings
    pub fn run_diagnostics(&self) -> DiagnosticReport {
        match catch_unwind(AssertUnwindSafe(|| self.diagnose())) {
            Ok(report) => report,
            Err(panic) => {
                let mut report = DiagnosticReport::new();
                report.fail(
                    Check::SmokeTest,
                    format!("diagnostics aborted: {}", panic_message(panic.as_ref())),
                );
                report
            }
        }
    }

    fn diagnose(&self) -> DiagnosticReport {
        let mut report = DiagnosticReport::new();
        let inner = &self.inner;

        let sink_count = inner.sinks.len();
        if sink_count > 0 {
            report.pass(Check::Sinks, format!("{} sink(s) registered", sink_count));
        } else {
            report.fail(Check::Sinks, "no sinks registered");
        }

        match &inner.storage {
            Some(storage) => match storage.probe() {
                Ok(()) => report.pass(Check::StorageAccess, "storage is readable and writable"),
                Err(e) => report.fail(Check::StorageAccess, format!("storage probe failed: {}", e)),
            },
            None => report.warn(Check::StorageAccess, "no persistent storage sink configured"),
        }

        let bytes = inner.storage.as_ref().map_or(0, |s| s.store_size_bytes());
        if bytes < STORAGE_SOFT_LIMIT_BYTES {
            report.pass(Check::StorageSize, format!("storage uses {} bytes", bytes));
        } else {
            report.warn(
                Check::StorageSize,
                format!(
                    "storage uses {} bytes, above the {} byte soft limit",
                    bytes, STORAGE_SOFT_LIMIT_BYTES
                ),
            );
        }

        let active = self.active_marks();
        let max_active = self.performance_settings().max_active_marks;
        if active < max_active {
            report.pass(Check::ActiveMarks, format!("{} active performance mark(s)", active));
        } else {
            report.warn(
                Check::ActiveMarks,
                format!("{} active performance marks; possible leak", active),
            );
        }

        match catch_unwind(AssertUnwindSafe(|| {
            self.debug(DIAGNOSTICS_MODULE, "diagnostics smoke test")
        })) {
            Ok(()) => report.pass(Check::SmokeTest, "test log call succeeded"),
            Err(panic) => report.fail(
                Check::SmokeTest,
                format!("test log call panicked: {}", panic_message(panic.as_ref())),
            ),
        }

        report.note(
            Check::Persistence,
            if self.persistence_enabled() {
                "persistence enabled"
            } else {
                "persistence disabled"
            },
        );

        report
    }

    // Settings and lifecycle

    pub fn log_level(&self) -> Severity {
        Severity::from_u8(self.inner.level.load(Ordering::Relaxed)).unwrap_or(Severity::Info)
    }

    /// Set the global level by name or rank.
    ///
    /// Unknown levels are ignored with a console warning and `None` is returned.
    pub fn set_log_level(&self, spec: impl Into<LevelSpec>) -> Option<Severity> {
        let spec = spec.into();
        match spec.resolve() {
            Some(level) => {
                self.inner.level.store(level.as_u8(), Ordering::Relaxed);
                Some(level)
            }
            None => {
                self.inner.console.report_internal(
                    Severity::Warn,
                    &format!("ignoring invalid log level '{}'", spec),
                );
                None
            }
        }
    }

    pub fn persistence_enabled(&self) -> bool {
        self.inner.persistence_enabled.load(Ordering::Relaxed)
    }

    /// Enable or disable the persistent sink
    pub fn set_persistence_enabled(&self, enabled: bool) {
        self.inner
            .persistence_enabled
            .store(enabled, Ordering::Relaxed);
        if let Some(storage) = &self.inner.storage {
            storage.set_enabled(enabled);
        }
    }

    /// Re-read level and persistence from `provider`
    pub fn apply_settings(&self, provider: &dyn SettingsProvider) {
        if let Some(level) = provider.log_level() {
            self.set_log_level(level);
        }
        if let Some(enabled) = provider.persistence_enabled() {
            self.set_persistence_enabled(enabled);
        }
    }

    pub fn profile(&self) -> Profile {
        self.inner.profile
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::Acquire)
    }

    /// Tear down: cancel every mark, close every sink, drop every
    /// subscription. Later calls do nothing.
    pub fn shutdown(&self) {
        if !self.inner.initialized.swap(false, Ordering::AcqRel) {
            return;
        }

        self.clear_performance_marks();

        for sink in self.inner.sinks.snapshot() {
            let closed = catch_unwind(AssertUnwindSafe(|| {
                sink.flush();
                sink.close();
            }));
            if let Err(panic) = closed {
                self.inner.console.report_internal(
                    Severity::Error,
                    &format!("sink '{}' panicked on close: {}", sink.name(), panic_message(panic.as_ref())),
                );
            }
        }

        self.inner.events.clear();
    }
}

/// Assembles a [`Logger`]: console sink first, then the persistent sink,
/// then any extra sinks in the order given.
pub struct LoggerBuilder {
    config: LoggerConfig,
    console_output: Option<Box<dyn ConsoleOutput>>,
    store: Option<Arc<dyn StorageBackend>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    extra_sinks: Vec<Arc<dyn LogSink>>,
    persistent: bool,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            config: LoggerConfig::default(),
            console_output: None,
            store: None,
            scheduler: None,
            extra_sinks: Vec::new(),
            persistent: true,
        }
    }

    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    /// Redirect console lines (tests, embedding)
    pub fn console_output(mut self, output: Box<dyn ConsoleOutput>) -> Self {
        self.console_output = Some(output);
        self
    }

    /// Backing store for history; overrides `storage.dir`
    pub fn storage(mut self, store: Arc<dyn StorageBackend>) -> Self {
        self.store = Some(store);
        self
    }

    /// Skip the persistent sink entirely
    pub fn without_storage(mut self) -> Self {
        self.persistent = false;
        self
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.extra_sinks.push(sink);
        self
    }

    pub fn build(self) -> Logger {
        let started = Instant::now();
        let initialized_at = chrono::Utc::now().timestamp_millis();
        let config = self.config;

        let output = self
            .console_output
            .unwrap_or_else(|| Box::new(StdConsole));
        let console = Arc::new(ConsoleSink::with_output(output).colors(config.console.colors));

        if let Some(level) = &config.level {
            if level.resolve().is_none() {
                console.report_internal(
                    Severity::Warn,
                    &format!("ignoring invalid configured log level '{}'", level),
                );
            }
        }

        let storage = if self.persistent {
            let store = match self.store {
                Some(store) => store,
                None => open_store(&config, &console),
            };
            let sink = PersistentSink::new(store)
                .key(config.storage.key.clone())
                .policy(config.rotation_policy())
                .reporter(Arc::clone(&console));
            sink.set_enabled(config.persistence_enabled);
            Some(Arc::new(sink))
        } else {
            None
        };

        let sinks = SinkRegistry::new();
        sinks.add(Arc::clone(&console) as Arc<dyn LogSink>);
        if let Some(storage) = &storage {
            sinks.add(Arc::clone(storage) as Arc<dyn LogSink>);
        }
        for sink in self.extra_sinks {
            sinks.add(sink);
        }

        let scheduler = self.scheduler.unwrap_or_else(default_scheduler);
        let events = EventBus::with_reporter(Arc::clone(&console));

        let inner = LoggerInner {
            level: AtomicU8::new(config.effective_level().as_u8()),
            initialized: AtomicBool::new(true),
            persistence_enabled: AtomicBool::new(config.persistence_enabled),
            profile: config.profile,
            sinks,
            events,
            console,
            storage,
            stats: Statistics::new(initialized_at, started.elapsed()),
            marks: PerformanceTracker::new(),
            perf_settings: RwLock::new(config.performance_settings()),
            scheduler,
            next_generation: AtomicU64::new(1),
        };

        Logger {
            inner: Arc::new(inner),
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn open_store(config: &LoggerConfig, console: &ConsoleSink) -> Arc<dyn StorageBackend> {
    let Some(dir) = &config.storage.dir else {
        return Arc::new(MemoryStorage::new());
    };
    match FileStorage::open(dir) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            console.report_internal(
                Severity::Warn,
                &format!("cannot open history directory, keeping history in memory: {}", e),
            );
            Arc::new(MemoryStorage::new())
        }
    }
}
