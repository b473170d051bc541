// SPDX-License-Identifier: Apache-2.0 OR MIT
// Log entry model and the persisted projection of it

use super::Severity;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Description of an error-like argument.
///
/// `stack` holds the rendered source chain when built from a
/// `std::error::Error`, or whatever trace the caller supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorInfo {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Capture an error and its `source()` chain
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        let name = short_type_name(std::any::type_name::<E>());
        let message = err.to_string();

        let mut stack = format!("{}: {}", name, message);
        let mut source = err.source();
        while let Some(cause) = source {
            stack.push_str("\n    caused by: ");
            stack.push_str(&cause.to_string());
            source = cause.source();
        }

        Self {
            name,
            message,
            stack: Some(stack),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

fn short_type_name(full: &str) -> String {
    let trimmed = full.trim_start_matches("dyn ");
    let base = trimmed.split('<').next().unwrap_or(trimmed);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// One extra argument attached to a log call.
///
/// Arguments are heterogeneous; this is the closed set of shapes the core
/// knows how to render and persist.
#[derive(Debug, Clone, PartialEq)]
pub enum LogArg {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Json(Value),
    Error(ErrorInfo),
}

impl LogArg {
    /// Wrap any serializable value. Serialization failures degrade to text.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => LogArg::Json(value),
            Err(e) => LogArg::Text(format!("[unserializable: {}]", e)),
        }
    }

    /// Wrap an error, capturing its source chain as the stack
    pub fn error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        LogArg::Error(ErrorInfo::from_error(err))
    }

    /// The stack of an error-like argument, if it carries one
    pub fn stack(&self) -> Option<&str> {
        match self {
            LogArg::Error(info) => info.stack.as_deref(),
            LogArg::Json(Value::Object(map)) => map.get("stack").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Projection used for persisted history.
    ///
    /// Primitives pass through, objects and errors are stringified.
    pub fn to_persisted(&self) -> Value {
        match self {
            LogArg::Null => Value::Null,
            LogArg::Bool(b) => Value::Bool(*b),
            LogArg::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(n.to_string())),
            LogArg::Text(s) => Value::String(s.clone()),
            LogArg::Json(value) => match value {
                Value::Object(_) | Value::Array(_) => Value::String(value.to_string()),
                primitive => primitive.clone(),
            },
            LogArg::Error(info) => Value::String(
                serde_json::to_string(info).unwrap_or_else(|_| info.to_string()),
            ),
        }
    }
}

impl std::fmt::Display for LogArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogArg::Null => write!(f, "null"),
            LogArg::Bool(b) => write!(f, "{}", b),
            LogArg::Number(n) => write!(f, "{}", n),
            LogArg::Text(s) => write!(f, "{}", s),
            LogArg::Json(value) => write!(f, "{}", value),
            LogArg::Error(info) => write!(f, "{}", info),
        }
    }
}

impl From<bool> for LogArg {
    fn from(value: bool) -> Self {
        LogArg::Bool(value)
    }
}

macro_rules! number_arg {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for LogArg {
                fn from(value: $ty) -> Self {
                    LogArg::Number(value as f64)
                }
            }
        )*
    };
}

number_arg!(i32, i64, u32, u64, usize, f32, f64);

impl From<&str> for LogArg {
    fn from(value: &str) -> Self {
        LogArg::Text(value.to_string())
    }
}

impl From<String> for LogArg {
    fn from(value: String) -> Self {
        LogArg::Text(value)
    }
}

impl From<Value> for LogArg {
    fn from(value: Value) -> Self {
        LogArg::Json(value)
    }
}

impl From<ErrorInfo> for LogArg {
    fn from(info: ErrorInfo) -> Self {
        LogArg::Error(info)
    }
}

impl<T: Into<LogArg>> From<Option<T>> for LogArg {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(LogArg::Null)
    }
}

/// A single log record, built once per accepted `log` call
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Wall-clock milliseconds since the Unix epoch
    pub timestamp: i64,
    pub severity: Severity,
    pub module: String,
    pub message: String,
    pub args: Vec<LogArg>,
    /// Only set for ERROR entries whose first argument carries a stack
    pub stack_trace: Option<String>,
}

impl LogEntry {
    /// Create a new entry stamped with the current wall-clock time
    pub fn new(
        severity: Severity,
        module: impl Into<String>,
        message: impl Into<String>,
        args: Vec<LogArg>,
    ) -> Self {
        let stack_trace = if severity == Severity::Error {
            args.first().and_then(LogArg::stack).map(str::to_string)
        } else {
            None
        };

        Self {
            timestamp: chrono::Utc::now().timestamp_millis(),
            severity,
            module: module.into(),
            message: message.into(),
            args,
            stack_trace,
        }
    }

    /// Override the timestamp (replaying history, tests)
    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Timestamp rendered as RFC 3339 with millisecond precision
    pub fn timestamp_rfc3339(&self) -> String {
        format_timestamp(self.timestamp)
    }

    /// Render the extra arguments separated by spaces
    pub fn rendered_args(&self) -> String {
        self.args
            .iter()
            .map(|arg| arg.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub(crate) fn format_timestamp(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
        .unwrap_or_else(|| timestamp.to_string())
}

/// Serializable projection of a `LogEntry` as kept in the backing store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedEntry {
    pub timestamp: i64,
    pub level: Severity,
    pub module: String,
    pub message: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default, rename = "stackTrace", skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

impl From<&LogEntry> for PersistedEntry {
    fn from(entry: &LogEntry) -> Self {
        Self {
            timestamp: entry.timestamp,
            level: entry.severity,
            module: entry.module.clone(),
            message: entry.message.clone(),
            args: entry.args.iter().map(LogArg::to_persisted).collect(),
            stack_trace: entry.stack_trace.clone(),
        }
    }
}
