// SPDX-License-Identifier: Apache-2.0 OR MIT
// Console sink - colorized line output to the process streams

use super::entry::{format_timestamp, LogEntry};
use super::sink::{LogSink, SinkControl, SinkError};
use super::Severity;
use std::io::Write;
use std::sync::Mutex;

/// Module tag used for the core's own fault reports
pub const INTERNAL_MODULE: &str = "logcore";

/// Where console lines end up.
///
/// `write_level` is the severity-specific method; when it fails the sink
/// falls back to the generic `write_line`.
pub trait ConsoleOutput: Send + Sync {
    fn write_level(&self, severity: Severity, line: &str) -> std::io::Result<()>;
    fn write_line(&self, line: &str) -> std::io::Result<()>;
}

impl<T: ConsoleOutput + ?Sized> ConsoleOutput for std::sync::Arc<T> {
    fn write_level(&self, severity: Severity, line: &str) -> std::io::Result<()> {
        (**self).write_level(severity, line)
    }

    fn write_line(&self, line: &str) -> std::io::Result<()> {
        (**self).write_line(line)
    }
}

/// Process stdout/stderr: ERROR and WARN go to stderr, the rest to stdout
#[derive(Debug, Default)]
pub struct StdConsole;

impl ConsoleOutput for StdConsole {
    fn write_level(&self, severity: Severity, line: &str) -> std::io::Result<()> {
        match severity {
            Severity::Error | Severity::Warn => writeln!(std::io::stderr().lock(), "{}", line),
            _ => writeln!(std::io::stdout().lock(), "{}", line),
        }
    }

    fn write_line(&self, line: &str) -> std::io::Result<()> {
        writeln!(std::io::stdout().lock(), "{}", line)
    }
}

/// Console output captured in memory
#[derive(Debug, Default)]
pub struct BufferedConsole {
    lines: Mutex<Vec<(Option<Severity>, String)>>,
}

impl BufferedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captured lines with the severity stream they were written to
    /// (`None` for the generic fallback)
    pub fn lines(&self) -> Vec<(Option<Severity>, String)> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Number of captured lines containing `needle`
    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines()
            .iter()
            .filter(|(_, line)| line.contains(needle))
            .count()
    }
}

impl ConsoleOutput for BufferedConsole {
    fn write_level(&self, severity: Severity, line: &str) -> std::io::Result<()> {
        self.lines
            .lock()
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "console poisoned"))?
            .push((Some(severity), line.to_string()));
        Ok(())
    }

    fn write_line(&self, line: &str) -> std::io::Result<()> {
        self.lines
            .lock()
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "console poisoned"))?
            .push((None, line.to_string()));
        Ok(())
    }
}

const RESET: &str = "\x1b[0m";

fn style(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "\x1b[1;31m",
        Severity::Warn => "\x1b[1;33m",
        Severity::Info => "\x1b[36m",
        Severity::Debug => "\x1b[32m",
        Severity::Trace => "\x1b[2m",
    }
}

/// Console sink: `[timestamp][SEVERITY][module] message args`
pub struct ConsoleSink {
    name: String,
    control: SinkControl,
    colors: bool,
    output: Box<dyn ConsoleOutput>,
}

impl ConsoleSink {
    /// Console sink on the process streams, accepting every severity
    pub fn new() -> Self {
        Self::with_output(Box::new(StdConsole))
    }

    pub fn with_output(output: Box<dyn ConsoleOutput>) -> Self {
        Self {
            name: "console".to_string(),
            control: SinkControl::new(Severity::Trace),
            colors: true,
            output,
        }
    }

    pub fn colors(mut self, enabled: bool) -> Self {
        self.colors = enabled;
        self
    }

    /// Format a line without writing it
    pub fn format(&self, entry: &LogEntry) -> String {
        let prefix = format!(
            "[{}][{}][{}]",
            entry.timestamp_rfc3339(),
            entry.severity.as_str(),
            entry.module
        );
        let mut line = if self.colors {
            format!("{}{}{} {}", style(entry.severity), prefix, RESET, entry.message)
        } else {
            format!("{} {}", prefix, entry.message)
        };

        if !entry.args.is_empty() {
            line.push(' ');
            line.push_str(&entry.rendered_args());
        }
        if let Some(stack) = &entry.stack_trace {
            line.push('\n');
            line.push_str(stack);
        }
        line
    }

    fn emit(&self, severity: Severity, line: &str) -> std::io::Result<()> {
        match self.output.write_level(severity, line) {
            Ok(()) => Ok(()),
            Err(_) => self.output.write_line(line),
        }
    }

    /// Report a fault inside the logging core itself.
    ///
    /// Bypasses gating and statistics so it cannot recurse into dispatch.
    pub fn report_internal(&self, severity: Severity, message: &str) {
        let entry = LogEntry::new(severity, INTERNAL_MODULE, message, vec![]);
        let line = self.format(&entry);
        let _ = self.emit(severity, &line);
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for ConsoleSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn control(&self) -> &SinkControl {
        &self.control
    }

    fn write_entry(&self, entry: &LogEntry) -> Result<(), SinkError> {
        let line = self.format(entry);
        self.emit(entry.severity, &line)?;
        Ok(())
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
    }
}

/// Plain timestamp prefix for CLI listings
pub fn format_plain(timestamp: i64, severity: Severity, module: &str, message: &str) -> String {
    format!(
        "[{}][{}][{}] {}",
        format_timestamp(timestamp),
        severity.as_str(),
        module,
        message
    )
}
