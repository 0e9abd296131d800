//! # logsieve http
//!
//! Request correlation for HTTP services built on `tower`.
//!
//! [`CorrelationLayer`] reads client identity headers, makes a
//! [`CorrelationContext`] and a [`RequestErrors`] collector available to
//! handlers through the request extensions, and logs one summary record per
//! request through the logsieve pipeline.
//!
//! Handlers can log with the same correlation attributes:
//!
//! ```ignore
//! async fn handler(request: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
//!     if let Some(context) = CorrelationContext::from_request(&request) {
//!         context.logger(&logsieve_core::logger()).debug("loading items", &[]);
//!     }
//!     // ...
//! }
//! ```

#![warn(missing_docs)]

mod context;
mod errors;
mod layer;

pub use context::{
    generate_id, CorrelationContext, IdGenerator, CLIENT_AGENT_HEADER, CLIENT_ID_HEADER,
    CLIENT_VERSION_HEADER, ORIGIN_SERVICE_HEADER, REQUEST_ID_HEADER, SESSION_ID_HEADER,
    UNKNOWN_AGENT,
};
pub use errors::RequestErrors;
pub use layer::{client_ip, CorrelationLayer, CorrelationService, DEFAULT_MESSAGE};
