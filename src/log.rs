//! Pluggable logging for registry and supervision-loop events.
//!
//! The core never talks to a logging framework directly. A [`Logger`] is
//! injected into the [`Host`](crate::Host) at construction and handed to
//! every supervision loop it spawns; the default discards everything.

/// Log levels for host events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Logger trait for host events
///
/// Library users can implement this trait to handle logging however they prefer.
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

/// Default no-op logger that discards all messages
#[derive(Debug, Default, Clone)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn log(&self, _level: LogLevel, _message: &str) {
        // Do nothing
    }
}

/// Logger that writes level-prefixed lines to stderr
#[derive(Debug, Default, Clone)]
pub struct StderrLogger;

impl Logger for StderrLogger {
    fn log(&self, level: LogLevel, message: &str) {
        let tag = match level {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        eprintln!("[{tag}] {message}");
    }
}
