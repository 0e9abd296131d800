//! The sink capability
//!
//! Every destination and every decorator in a pipeline implements [`Sink`]:
//! console and file writers, the rule-evaluating [`FilteredSink`], and the
//! broadcasting [`FanoutSink`].
//!
//! [`FilteredSink`]: crate::FilteredSink
//! [`FanoutSink`]: crate::FanoutSink

use crate::error::SinkResult;
use crate::level::Level;
use crate::record::{Attr, Record};
use std::sync::Arc;

/// A destination for records
///
/// `handle` reports its outcome instead of panicking or blocking the caller on
/// failure. Callers inside this crate never propagate that outcome to
/// application code; they count it.
pub trait Sink: Send + Sync + 'static {
    /// Whether a record at `level` would be accepted
    fn enabled(&self, level: Level) -> bool;

    /// Accept one record
    fn handle(&self, record: &Record) -> SinkResult;

    /// A sink that adds `attrs` to every record it handles
    fn with_attrs(&self, attrs: &[Attr]) -> Arc<dyn Sink>;

    /// A sink that nests every later attribute under `name`
    fn with_group(&self, name: &str) -> Arc<dyn Sink>;
}

/// Sink that accepts nothing. Used as an inert placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl Sink for DiscardSink {
    fn enabled(&self, _level: Level) -> bool {
        false
    }

    fn handle(&self, _record: &Record) -> SinkResult {
        Ok(())
    }

    fn with_attrs(&self, _attrs: &[Attr]) -> Arc<dyn Sink> {
        Arc::new(DiscardSink)
    }

    fn with_group(&self, _name: &str) -> Arc<dyn Sink> {
        Arc::new(DiscardSink)
    }
}
