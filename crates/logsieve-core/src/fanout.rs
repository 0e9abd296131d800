//! Broadcasting sink

use crate::error::SinkResult;
use crate::level::Level;
use crate::record::{Attr, Record};
use crate::sink::Sink;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Sink that hands every record to each of its members in order.
///
/// A member that fails does not stop the others. Failures are counted and
/// never reported to the caller. Level checks are left to the members.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn Sink>>,
    failures: Arc<AtomicU64>,
}

impl FanoutSink {
    /// Broadcast to `sinks`
    pub fn new(sinks: Vec<Arc<dyn Sink>>) -> Self {
        Self {
            sinks,
            failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Add a member after the existing ones
    pub fn push(&mut self, sink: Arc<dyn Sink>) {
        self.sinks.push(sink);
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether there are no members
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Member writes that failed, across this sink and its derivatives
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    fn derive(&self, derive: impl Fn(&Arc<dyn Sink>) -> Arc<dyn Sink>) -> Arc<dyn Sink> {
        Arc::new(Self {
            sinks: self.sinks.iter().map(derive).collect(),
            failures: Arc::clone(&self.failures),
        })
    }
}

impl Sink for FanoutSink {
    fn enabled(&self, level: Level) -> bool {
        self.sinks.iter().any(|sink| sink.enabled(level))
    }

    fn handle(&self, record: &Record) -> SinkResult {
        for sink in &self.sinks {
            if let Err(err) = sink.handle(record) {
                self.failures.fetch_add(1, Ordering::Relaxed);
                crate::diag_debug!(error = %err, "fan-out member rejected record");
            }
        }
        Ok(())
    }

    fn with_attrs(&self, attrs: &[Attr]) -> Arc<dyn Sink> {
        self.derive(|sink| sink.with_attrs(attrs))
    }

    fn with_group(&self, name: &str) -> Arc<dyn Sink> {
        self.derive(|sink| sink.with_group(name))
    }
}
