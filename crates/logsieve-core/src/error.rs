//! Error types for logsieve
//!
//! Two families exist on purpose. [`LogError`] is returned while a pipeline is
//! being assembled and is the only failure an application ever sees.
//! [`SinkError`] is the outcome a sink reports for a single record; filtering
//! and fan-out sinks count it and move on.

use thiserror::Error;

/// Result type alias for setup-time operations
pub type Result<T, E = LogError> = std::result::Result<T, E>;

/// Configuration errors surfaced while building a pipeline
#[derive(Debug, Error)]
pub enum LogError {
    /// A level name that is not part of the scale
    #[error("invalid level: {0}")]
    InvalidLevel(String),

    /// A filter rule failed validation
    #[error("invalid rule #{index}: {reason}")]
    InvalidRule {
        /// Position of the rule in its list
        index: usize,
        /// What is wrong with it
        reason: String,
    },

    /// The rotating file sink could not be created
    #[error("failed to initialise file sink: {0}")]
    FileSink(String),

    /// A rule document could not be parsed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O error occurred during setup
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of handing one record to a sink
pub type SinkResult = std::result::Result<(), SinkError>;

/// Failure of a single sink write
#[derive(Debug, Error)]
pub enum SinkError {
    /// The destination rejected the write
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    /// The record could not be encoded
    #[error("encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The sink is not accepting records
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}
