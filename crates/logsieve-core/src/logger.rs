//! Logger handle and the logging capability
//!
//! [`Logger`] is a cheap-to-clone front end over a sink chain. [`Log`] is the
//! small capability application code depends on; both `Logger` and the global
//! [`Registry`](crate::Registry) implement it.

use crate::level::Level;
use crate::record::{Attr, Record};
use crate::sink::{DiscardSink, Sink};
use std::fmt;
use std::sync::Arc;

/// Logging capability: one entry point per level plus derivation
pub trait Log: Send + Sync {
    /// Emit `message` at `level` with `attrs`
    fn log(&self, level: Level, message: &str, attrs: &[Attr]);

    /// A logger that adds `attrs` to every record
    fn with(&self, attrs: &[Attr]) -> Logger;

    /// Log at [`Level::Trace`]
    fn trace(&self, message: &str, attrs: &[Attr]) {
        self.log(Level::Trace, message, attrs);
    }

    /// Log at [`Level::Debug`]
    fn debug(&self, message: &str, attrs: &[Attr]) {
        self.log(Level::Debug, message, attrs);
    }

    /// Log at [`Level::Info`]
    fn info(&self, message: &str, attrs: &[Attr]) {
        self.log(Level::Info, message, attrs);
    }

    /// Log at [`Level::Warn`]
    fn warn(&self, message: &str, attrs: &[Attr]) {
        self.log(Level::Warn, message, attrs);
    }

    /// Log at [`Level::Error`]
    fn error(&self, message: &str, attrs: &[Attr]) {
        self.log(Level::Error, message, attrs);
    }

    /// Log at [`Level::Fatal`]. Only records; the process keeps running.
    fn fatal(&self, message: &str, attrs: &[Attr]) {
        self.log(Level::Fatal, message, attrs);
    }
}

/// Handle to a sink chain
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn Sink>,
}

impl Logger {
    /// Logger writing to `sink`
    pub fn new(sink: Arc<dyn Sink>) -> Self {
        Self { sink }
    }

    /// Logger that drops everything
    pub fn discard() -> Self {
        Self::new(Arc::new(DiscardSink))
    }

    /// The sink this logger writes to
    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    /// Whether a record at `level` would be accepted by the sink chain
    pub fn enabled(&self, level: Level) -> bool {
        self.sink.enabled(level)
    }

    /// Emit a record built from `level`, `message` and `attrs`.
    ///
    /// The record is timestamped here, and only built when the chain
    /// accepts `level`.
    pub fn log(&self, level: Level, message: &str, attrs: &[Attr]) {
        if !self.enabled(level) {
            return;
        }
        let record = Record::new(level, message).with_attrs(attrs.iter().cloned());
        let _ = self.sink.handle(&record);
    }

    /// Emit an already built record. Sink failures are not reported.
    pub fn log_record(&self, record: &Record) {
        if self.enabled(record.level) {
            let _ = self.sink.handle(record);
        }
    }

    /// A logger that adds `attrs` to every record; the same logger when empty
    pub fn with(&self, attrs: &[Attr]) -> Logger {
        if attrs.is_empty() {
            return self.clone();
        }
        Self::new(self.sink.with_attrs(attrs))
    }

    /// A logger nesting later attributes under `name`; the same logger when
    /// `name` is empty
    pub fn with_group(&self, name: &str) -> Logger {
        if name.is_empty() {
            return self.clone();
        }
        Self::new(self.sink.with_group(name))
    }

    /// Whether both handles write to the same sink instance
    pub fn same_sink(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.sink, &other.sink)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::discard()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}

impl Log for Logger {
    fn log(&self, level: Level, message: &str, attrs: &[Attr]) {
        Logger::log(self, level, message, attrs);
    }

    fn with(&self, attrs: &[Attr]) -> Logger {
        Logger::with(self, attrs)
    }
}
