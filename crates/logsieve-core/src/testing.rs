//! Test sinks
//!
//! [`MemorySink`] keeps every record it receives (with derived attributes
//! resolved) so tests can assert on what reached a destination.
//! [`FailingSink`] rejects every record.

use crate::error::{SinkError, SinkResult};
use crate::level::Level;
use crate::record::{Attr, AttrScope, Record, Value};
use crate::sink::Sink;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Sink that stores records in memory
///
/// Derived sinks share the same storage, like a real writer would.
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<Record>>>,
    scope: AttrScope,
    min_level: Option<Level>,
}

impl MemorySink {
    /// Create an empty sink accepting every level
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty sink accepting `level` and above
    pub fn with_min_level(level: Level) -> Self {
        Self {
            min_level: Some(level),
            ..Self::default()
        }
    }

    /// This sink as a trait object sharing the same storage
    pub fn shared(&self) -> Arc<dyn Sink> {
        Arc::new(self.clone())
    }

    /// Snapshot of received records
    pub fn records(&self) -> Vec<Record> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages of received records, in arrival order
    pub fn messages(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.message).collect()
    }

    /// Number of received records
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing was received
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value of `key` in the last received record
    pub fn last_attr(&self, key: &str) -> Option<Value> {
        self.records()
            .last()
            .and_then(|record| record.attr(key).cloned())
    }

    /// Forget every received record
    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Sink for MemorySink {
    fn enabled(&self, level: Level) -> bool {
        self.min_level.map_or(true, |min| level >= min)
    }

    fn handle(&self, record: &Record) -> SinkResult {
        let mut stored = record.clone();
        stored.attrs = self.scope.resolve(&record.attrs);
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(stored);
        Ok(())
    }

    fn with_attrs(&self, attrs: &[Attr]) -> Arc<dyn Sink> {
        Arc::new(Self {
            records: Arc::clone(&self.records),
            scope: self.scope.with_attrs(attrs),
            min_level: self.min_level,
        })
    }

    fn with_group(&self, name: &str) -> Arc<dyn Sink> {
        Arc::new(Self {
            records: Arc::clone(&self.records),
            scope: self.scope.with_group(name),
            min_level: self.min_level,
        })
    }
}

/// Sink whose every write fails
#[derive(Clone, Default)]
pub struct FailingSink {
    attempts: Arc<AtomicUsize>,
}

impl FailingSink {
    /// Create a failing sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records it was handed
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Sink for FailingSink {
    fn enabled(&self, _level: Level) -> bool {
        true
    }

    fn handle(&self, _record: &Record) -> SinkResult {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SinkError::Unavailable("disk full".to_string()))
    }

    fn with_attrs(&self, _attrs: &[Attr]) -> Arc<dyn Sink> {
        Arc::new(self.clone())
    }

    fn with_group(&self, _name: &str) -> Arc<dyn Sink> {
        Arc::new(self.clone())
    }
}
