// SPDX-License-Identifier: Apache-2.0 OR MIT
// Structured logging core
//
// - severity/entry: the record model and its persisted projection
// - sink/console/persistent/storage: output destinations and backing stores
// - events: synchronous publish/subscribe for accepted entries
// - scheduler/performance: timing marks with auto-expiry
// - stats/diagnostics/history: introspection of the running facade
// - logger/global: the facade and the process-wide safe accessor

mod console;
mod diagnostics;
mod entry;
mod events;
pub mod global;
mod history;
mod logger;
#[macro_use]
mod macros;
mod performance;
mod persistent;
mod scheduler;
mod severity;
mod sink;
mod stats;
mod storage;

// Public exports
pub use console::{format_plain, BufferedConsole, ConsoleOutput, ConsoleSink, StdConsole};
pub use diagnostics::{Check, DiagnosticReport, Finding, Outcome, STORAGE_SOFT_LIMIT_BYTES};
pub use entry::{ErrorInfo, LogArg, LogEntry, PersistedEntry};
pub use events::{EventBus, EventKind, SubscriptionId};
pub use global::{InertLogger, LogApi, LoggerHandle};
pub use history::{ExportError, HistoryFilter, LogExport};
pub use logger::{Logger, LoggerBuilder};
pub use performance::{MarkSummary, PerformanceSettings, PERFORMANCE_MODULE};
pub use persistent::{PersistentSink, RotationPolicy, DEFAULT_HISTORY_KEY};
pub use scheduler::{default_scheduler, ManualScheduler, Scheduler, TimerId, TokioScheduler};
pub use severity::{LevelSpec, Severity, UnknownLevel};
pub use sink::{LogSink, MemorySink, SinkControl, SinkError, SinkRegistry, SinkSummary};
pub use stats::{CounterSnapshot, StatisticsSnapshot};
pub use storage::{FileStorage, MemoryStorage, StorageBackend, StorageError};
