//! Writer-backed sinks
//!
//! [`StreamSink`] renders records with a [`RecordFormatter`] and writes one line
//! per record to any `io::Write`. The console sink writes text to stdout; the
//! file sink writes JSON through a rotating, non-blocking appender.

use crate::config::FileSinkConfig;
use crate::error::{LogError, SinkResult};
use crate::level::{Level, LevelVar};
use crate::record::{Attr, AttrScope, Record, Value};
use crate::sink::Sink;
use chrono::SecondsFormat;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::RollingFileAppender;

/// Renders a record as a single line, without the trailing newline
pub trait RecordFormatter: Send + Sync + 'static {
    /// Format `record`. `attrs` is the fully resolved attribute tree, derived
    /// attributes included, and replaces `record.attrs`.
    fn format(&self, record: &Record, attrs: &[Attr]) -> String;
}

/// Built-in output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// `key=value` pairs
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    fn formatter(self) -> Arc<dyn RecordFormatter> {
        match self {
            LogFormat::Text => Arc::new(TextFormatter),
            LogFormat::Json => Arc::new(JsonFormatter),
        }
    }
}

fn timestamp(record: &Record) -> String {
    record.time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `time=… level=INFO msg=… key=value` formatter.
///
/// Group members are flattened with dotted keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFormatter;

impl TextFormatter {
    fn push_pair(line: &mut String, key: &str, value: &str) {
        if !line.is_empty() {
            line.push(' ');
        }
        push_quoted(line, key);
        line.push('=');
        push_quoted(line, value);
    }

    fn push_attrs(line: &mut String, prefix: &str, attrs: &[Attr]) {
        for attr in attrs {
            let key = if prefix.is_empty() {
                attr.key.clone()
            } else {
                format!("{}.{}", prefix, attr.key)
            };
            match &attr.value {
                Value::Group(members) => Self::push_attrs(line, &key, members),
                value => Self::push_pair(line, &key, &value.to_string()),
            }
        }
    }
}

fn push_quoted(line: &mut String, text: &str) {
    if needs_quoting(text) {
        line.push_str(&format!("{:?}", text));
    } else {
        line.push_str(text);
    }
}

fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| c == ' ' || c == '=' || c == '"' || c.is_control())
}

impl RecordFormatter for TextFormatter {
    fn format(&self, record: &Record, attrs: &[Attr]) -> String {
        let mut line = String::with_capacity(64);
        Self::push_pair(&mut line, "time", &timestamp(record));
        Self::push_pair(&mut line, "level", record.level.label());
        Self::push_pair(&mut line, "msg", &record.message);
        Self::push_attrs(&mut line, "", attrs);
        line
    }
}

/// JSON object formatter: `time`, `level`, `msg`, then attributes in order.
///
/// Repeated attribute keys are all written, in order. A top-level attribute
/// named like a header field is written as `attr.<key>` so the header always
/// survives a reader that keeps one value per key.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

const HEADER_KEYS: [&str; 3] = ["time", "level", "msg"];

struct JsonLine<'a> {
    record: &'a Record,
    attrs: &'a [Attr],
}

struct JsonGroup<'a>(&'a [Attr]);

fn serialize_attr<M: SerializeMap>(
    map: &mut M,
    key: &str,
    value: &Value,
) -> Result<(), M::Error> {
    match value {
        Value::Group(members) => map.serialize_entry(key, &JsonGroup(members)),
        value => map.serialize_entry(key, &value.to_json()),
    }
}

impl Serialize for JsonGroup<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for attr in self.0 {
            serialize_attr(&mut map, &attr.key, &attr.value)?;
        }
        map.end()
    }
}

impl Serialize for JsonLine<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.attrs.len() + HEADER_KEYS.len()))?;
        map.serialize_entry("time", &timestamp(self.record))?;
        map.serialize_entry("level", self.record.level.label())?;
        map.serialize_entry("msg", &self.record.message)?;
        for attr in self.attrs {
            if HEADER_KEYS.contains(&attr.key.as_str()) {
                serialize_attr(&mut map, &format!("attr.{}", attr.key), &attr.value)?;
            } else {
                serialize_attr(&mut map, &attr.key, &attr.value)?;
            }
        }
        map.end()
    }
}

impl RecordFormatter for JsonFormatter {
    fn format(&self, record: &Record, attrs: &[Attr]) -> String {
        let line = JsonLine { record, attrs };
        match serde_json::to_string(&line) {
            Ok(line) => line,
            Err(err) => {
                crate::diag_debug!(error = %err, "record could not be encoded as JSON");
                String::new()
            }
        }
    }
}

/// Sink writing formatted lines to a shared writer.
///
/// Derived sinks write to the same writer and honour the same threshold.
pub struct StreamSink<W> {
    writer: Arc<Mutex<W>>,
    formatter: Arc<dyn RecordFormatter>,
    level: Arc<LevelVar>,
    scope: AttrScope,
}

impl<W> Clone for StreamSink<W> {
    fn clone(&self) -> Self {
        Self {
            writer: Arc::clone(&self.writer),
            formatter: Arc::clone(&self.formatter),
            level: Arc::clone(&self.level),
            scope: self.scope.clone(),
        }
    }
}

impl<W: Write + Send + 'static> StreamSink<W> {
    /// Sink writing `format` lines to `writer` for records at or above `level`
    pub fn new(writer: W, format: LogFormat, level: Arc<LevelVar>) -> Self {
        Self::with_formatter(writer, format.formatter(), level)
    }

    /// Sink using a custom formatter
    pub fn with_formatter(
        writer: W,
        formatter: Arc<dyn RecordFormatter>,
        level: Arc<LevelVar>,
    ) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
            formatter,
            level,
            scope: AttrScope::new(),
        }
    }

    /// Threshold shared with the sink's owner
    pub fn level_var(&self) -> &Arc<LevelVar> {
        &self.level
    }

    fn derive(&self, scope: AttrScope) -> Arc<dyn Sink> {
        Arc::new(Self {
            scope,
            ..self.clone()
        })
    }
}

impl StreamSink<io::Stdout> {
    /// Console sink: text lines on stdout
    pub fn stdout(level: Arc<LevelVar>) -> Self {
        Self::new(io::stdout(), LogFormat::Text, level)
    }
}

impl<W: Write + Send + 'static> Sink for StreamSink<W> {
    fn enabled(&self, level: Level) -> bool {
        self.level.allows(level)
    }

    fn handle(&self, record: &Record) -> SinkResult {
        if !self.level.allows(record.level) {
            return Ok(());
        }

        let attrs = self.scope.resolve(&record.attrs);
        let mut line = self.formatter.format(record, &attrs);
        line.push('\n');

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    fn with_attrs(&self, attrs: &[Attr]) -> Arc<dyn Sink> {
        self.derive(self.scope.with_attrs(attrs))
    }

    fn with_group(&self, name: &str) -> Arc<dyn Sink> {
        self.derive(self.scope.with_group(name))
    }
}

/// Rotating JSON file sink
pub type FileSink = StreamSink<NonBlocking>;

/// File name prefix: `{app}-{os}-{YYYYMMDDTHHMMSS}`, local time
pub fn file_prefix(app_name: &str) -> String {
    format!(
        "{}-{}-{}",
        app_name,
        std::env::consts::OS,
        chrono::Local::now().format("%Y%m%dT%H%M%S")
    )
}

impl StreamSink<NonBlocking> {
    /// Open a rotating JSON file sink in `config.directory`.
    ///
    /// Lines are written by a background worker. The returned guard flushes
    /// pending lines when dropped and must outlive every use of the sink.
    pub fn rolling_file(
        config: &FileSinkConfig,
        level: Arc<LevelVar>,
    ) -> Result<(Self, WorkerGuard), LogError> {
        std::fs::create_dir_all(&config.directory)?;

        let mut builder = RollingFileAppender::builder()
            .rotation(config.rotation.into())
            .filename_prefix(file_prefix(&config.app_name))
            .filename_suffix("log");
        if let Some(max_files) = config.max_files {
            builder = builder.max_log_files(max_files);
        }
        let appender = builder
            .build(&config.directory)
            .map_err(|err| LogError::FileSink(err.to_string()))?;

        let (writer, guard) = tracing_appender::non_blocking(appender);
        Ok((Self::new(writer, LogFormat::Json, level), guard))
    }
}
