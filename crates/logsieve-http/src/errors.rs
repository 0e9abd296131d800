//! Internal error collector
//!
//! The correlation layer puts a [`RequestErrors`] into every request's
//! extensions. Handlers push error text they want in the request summary but
//! not in the response; the layer reports it under the `error` attribute.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Error messages gathered while one request was handled
#[derive(Clone, Default)]
pub struct RequestErrors {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RequestErrors {
    /// Empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error
    pub fn push(&self, error: impl fmt::Display) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error.to_string());
    }

    /// Recorded messages, oldest first
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

/// Messages joined with `"; "`, empty when nothing was recorded
impl fmt::Display for RequestErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join("; "))
    }
}

impl fmt::Debug for RequestErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.messages()).finish()
    }
}
