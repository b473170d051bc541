// SPDX-License-Identifier: Apache-2.0 OR MIT
// Logging macros with format-style messages
//
// Each works on anything implementing `LogApi`: a `Logger`, the handle
// returned by `global::logger()`, or the inert stand-in.

/// Log a message at an explicit severity
///
/// # Examples
/// ```ignore
/// log_at!(logger, Severity::Info, "Chat", "{} joined", user);
/// ```
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $severity:expr, $module:expr, $($arg:tt)+) => {{
        #[allow(unused_imports)]
        use $crate::logging::LogApi as _;
        $logger.log($severity, $module, &format!($($arg)+), ::std::vec::Vec::new())
    }};
}

/// Log a message with error severity
///
/// # Examples
/// ```ignore
/// log_error!(logger, "Effects", "Failed to apply effect {}", effect_id);
/// ```
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $module:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::logging::Severity::Error, $module, $($arg)+)
    };
}

/// Log a message with warning severity
///
/// # Examples
/// ```ignore
/// log_warn!(logger, "Storage", "History at {} entries", len);
/// ```
#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $module:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::logging::Severity::Warn, $module, $($arg)+)
    };
}

/// Log a message with info severity
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $module:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::logging::Severity::Info, $module, $($arg)+)
    };
}

/// Log a message with debug severity
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $module:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::logging::Severity::Debug, $module, $($arg)+)
    };
}

/// Log a message with trace severity
#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $module:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::logging::Severity::Trace, $module, $($arg)+)
    };
}
