//! Injected logging port.
//!
//! Components never reach for a process-wide logger. They hold an
//! `Arc<dyn Logger>` handed to them at construction, so failure paths can be
//! asserted in tests with [`RecordingLogger`].

use parking_lot::Mutex;
use std::fmt;

/// Severity of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Logging capability.
pub trait Logger: Send + Sync {
    /// Emit one event. `fields` are structured key/value context.
    fn log(&self, level: LogLevel, component: &str, message: &str, fields: &[(&str, &dyn fmt::Display)]);

    fn debug(&self, component: &str, message: &str, fields: &[(&str, &dyn fmt::Display)]) {
        self.log(LogLevel::Debug, component, message, fields);
    }

    fn info(&self, component: &str, message: &str, fields: &[(&str, &dyn fmt::Display)]) {
        self.log(LogLevel::Info, component, message, fields);
    }

    fn warn(&self, component: &str, message: &str, fields: &[(&str, &dyn fmt::Display)]) {
        self.log(LogLevel::Warn, component, message, fields);
    }

    fn error(&self, component: &str, message: &str, fields: &[(&str, &dyn fmt::Display)]) {
        self.log(LogLevel::Error, component, message, fields);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log(&self, _: LogLevel, _: &str, _: &str, _: &[(&str, &dyn fmt::Display)]) {}
}

/// Forwards events to the `tracing` dispatcher.
///
/// `key_id`, `owner_id` and `error` become real event fields so JSON output
/// can be filtered on them. Any other pairs are rendered into `fields`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

#[derive(Debug, Default, PartialEq, Eq)]
struct SplitFields {
    key_id: Option<String>,
    owner_id: Option<String>,
    error: Option<String>,
    rest: Option<String>,
}

fn split_fields(fields: &[(&str, &dyn fmt::Display)]) -> SplitFields {
    let mut split = SplitFields::default();
    let mut rest = Vec::new();
    for (key, value) in fields {
        match *key {
            "key_id" => split.key_id = Some(value.to_string()),
            "owner_id" => split.owner_id = Some(value.to_string()),
            "error" => split.error = Some(value.to_string()),
            _ => rest.push(format!("{key}={value}")),
        }
    }
    if !rest.is_empty() {
        split.rest = Some(rest.join(" "));
    }
    split
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, component: &str, message: &str, fields: &[(&str, &dyn fmt::Display)]) {
        let SplitFields {
            key_id,
            owner_id,
            error,
            rest,
        } = split_fields(fields);
        let (key_id, owner_id, error, rest) =
            (key_id.as_deref(), owner_id.as_deref(), error.as_deref(), rest.as_deref());
        match level {
            LogLevel::Debug => tracing::debug!(component, key_id, owner_id, error, fields = rest, "{message}"),
            LogLevel::Info => tracing::info!(component, key_id, owner_id, error, fields = rest, "{message}"),
            LogLevel::Warn => tracing::warn!(component, key_id, owner_id, error, fields = rest, "{message}"),
            LogLevel::Error => tracing::error!(component, key_id, owner_id, error, fields = rest, "{message}"),
        }
    }
}

/// A captured event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub component: String,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// True if some event at `level` has a message containing `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|r| r.level == level && r.message.contains(needle))
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Logger for RecordingLogger {
    fn log(&self, level: LogLevel, component: &str, message: &str, fields: &[(&str, &dyn fmt::Display)]) {
        self.records.lock().push(LogRecord {
            level,
            component: component.to_string(),
            message: message.to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
    }
}
