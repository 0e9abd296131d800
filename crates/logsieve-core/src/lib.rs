//! # logsieve core
//!
//! Structured records, rule-based filtering and redaction, fan-out to console
//! and rotating file sinks, and the process-wide logger registry.
//!
//! This crate is usually consumed through the `logsieve` facade.
//!
//! ```no_run
//! use logsieve_core::{FilterRule, Level, Log, LoggingConfig};
//!
//! let guard = LoggingConfig::development()
//!     .rule(FilterRule::deny().message("heartbeat"))
//!     .rule(FilterRule::shorten(10, ["body"]))
//!     .install()?;
//!
//! logsieve_core::info("started", &[]);
//! guard.filter().add_rule(FilterRule::deny().level(Level::Trace));
//! # Ok::<(), logsieve_core::LogError>(())
//! ```

#![warn(missing_docs)]

#[macro_use]
mod diag;

mod config;
mod error;
mod fanout;
mod filter;
mod filtered;
mod level;
mod logger;
mod record;
mod registry;
mod sink;
pub mod stream;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Public API
pub use config::{FileSinkConfig, LoggingConfig, LoggingGuard, Pipeline, Rotation, DEFAULT_MAX_FILES};
pub use error::{LogError, Result, SinkError, SinkResult};
pub use fanout::FanoutSink;
pub use filter::{
    matches, parse_rules, truncate, Action, FilterRule, RuleOptions, ShortenOptions,
    DEFAULT_SHORTEN_LIMIT, ELLIPSIS, MESSAGE_KEY,
};
pub use filtered::{FilterStats, FilteredSink};
pub use level::{Level, LevelVar};
pub use logger::{Log, Logger};
pub use record::{Attr, AttrScope, Record, Value};
pub use registry::{
    debug, error, fatal, global, info, level, logger, set_level, set_logger, trace, warn,
    Registry,
};
pub use sink::{DiscardSink, Sink};
pub use stream::{FileSink, JsonFormatter, LogFormat, RecordFormatter, StreamSink, TextFormatter};
