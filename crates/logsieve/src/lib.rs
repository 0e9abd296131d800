//! # logsieve
//!
//! Structured logging with rule-based filtering and redaction.
//!
//! Records flow from a [`Logger`] through a [`FilteredSink`], which can drop
//! them or shorten selected attributes, into a [`FanoutSink`] that writes to
//! the console and to rotating JSON files. Rules can be changed at runtime and
//! apply to every logger derived from the pipeline.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use logsieve::prelude::*;
//!
//! fn main() -> logsieve::Result<()> {
//!     let _guard = LoggingConfig::production("./logs", "awee")
//!         .level(Level::Debug)
//!         .rule(FilterRule::deny().attribute("path", "/health"))
//!         .rule(FilterRule::shorten(100, ["request_body", "response_body"]))
//!         .install()?;
//!
//!     logsieve::info("service started", &[Attr::new("port", 8080)]);
//!     logsieve::logger()
//!         .with(&[Attr::new("job", "sync")])
//!         .debug("tick", &[]);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `http` (default): [`CorrelationLayer`](http::CorrelationLayer), a `tower`
//!   layer tagging every request with client identity and logging a summary
//! - `test-utils`: in-memory sinks for asserting on emitted records

#![warn(missing_docs)]

pub use logsieve_core::*;

/// Request correlation middleware
#[cfg(feature = "http")]
pub mod http {
    pub use logsieve_http::*;
}

/// Re-exports for user convenience
pub use serde_json;

/// Common imports
///
/// ```rust
/// use logsieve::prelude::*;
/// ```
pub mod prelude {
    pub use logsieve_core::{
        Action, Attr, FilterRule, FilteredSink, Level, Log, Logger, LoggingConfig, LoggingGuard,
        Record, Sink, Value,
    };

    #[cfg(feature = "http")]
    pub use logsieve_http::{CorrelationContext, CorrelationLayer, RequestErrors};
}
