//! Conditional diagnostics macros
//!
//! The library reports its own conditions (a rule that silences everything,
//! records lost to a failing sink) through `tracing`. These macros compile to
//! nothing when the `tracing` feature is disabled.

/// Emit a warning diagnostic, only when the tracing feature is enabled
#[cfg(feature = "tracing")]
#[macro_export]
#[doc(hidden)]
macro_rules! diag_warn {
    ($($arg:tt)*) => {
        ::tracing::warn!(target: "logsieve", $($arg)*)
    };
}

/// Emit a warning diagnostic, no-op when the tracing feature is disabled
#[cfg(not(feature = "tracing"))]
#[macro_export]
#[doc(hidden)]
macro_rules! diag_warn {
    ($($arg:tt)*) => {};
}

/// Emit a debug diagnostic, only when the tracing feature is enabled
#[cfg(feature = "tracing")]
#[macro_export]
#[doc(hidden)]
macro_rules! diag_debug {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "logsieve", $($arg)*)
    };
}

/// Emit a debug diagnostic, no-op when the tracing feature is disabled
#[cfg(not(feature = "tracing"))]
#[macro_export]
#[doc(hidden)]
macro_rules! diag_debug {
    ($($arg:tt)*) => {};
}
