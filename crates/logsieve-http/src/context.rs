//! Per-request correlation context
//!
//! Identity headers sent by clients are read once per request into a
//! [`CorrelationContext`], which is stored in the request extensions and turned
//! into the attributes of every record logged while handling that request.

use http::{HeaderMap, Request};
use logsieve_core::{Attr, Logger};

/// Client install identifier
pub const CLIENT_ID_HEADER: &str = "x-client-id";
/// Client platform label
pub const CLIENT_AGENT_HEADER: &str = "x-client-agent";
/// Client application version
pub const CLIENT_VERSION_HEADER: &str = "x-client-version";
/// Session identifier
pub const SESSION_ID_HEADER: &str = "x-session-id";
/// Request identifier
pub const REQUEST_ID_HEADER: &str = "x-request-id";
/// Name of the calling service
pub const ORIGIN_SERVICE_HEADER: &str = "x-origin-service";

/// Agent recorded when the client sends none
pub const UNKNOWN_AGENT: &str = "unknown";

/// Generates a client identifier when the request carries none
pub type IdGenerator = std::sync::Arc<dyn Fn() -> String + Send + Sync>;

/// A fresh random (v4) UUID in hyphenated form
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Identity of the client behind one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationContext {
    /// Client install identifier, generated when absent
    pub client_id: String,
    /// Client platform label, `unknown` when absent
    pub client_agent: String,
    /// Client application version
    pub client_version: Option<String>,
    /// Session identifier
    pub session_id: Option<String>,
    /// Request identifier
    pub request_id: Option<String>,
    /// Calling service
    pub origin_service: Option<String>,
    /// `User-Agent` header
    pub user_agent: Option<String>,
    generated: bool,
}

fn header(headers: &HeaderMap, name: impl http::header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

impl CorrelationContext {
    /// Read the identity headers, calling `generate` if there is no client id
    pub fn from_headers(headers: &HeaderMap, generate: impl FnOnce() -> String) -> Self {
        let (client_id, generated) = match header(headers, CLIENT_ID_HEADER) {
            Some(id) => (id, false),
            None => (generate(), true),
        };

        Self {
            client_id,
            client_agent: header(headers, CLIENT_AGENT_HEADER)
                .unwrap_or_else(|| UNKNOWN_AGENT.to_string()),
            client_version: header(headers, CLIENT_VERSION_HEADER),
            session_id: header(headers, SESSION_ID_HEADER),
            request_id: header(headers, REQUEST_ID_HEADER),
            origin_service: header(headers, ORIGIN_SERVICE_HEADER),
            user_agent: header(headers, http::header::USER_AGENT),
            generated,
        }
    }

    /// Context stored in a request's extensions by the correlation layer
    pub fn from_request<B>(request: &Request<B>) -> Option<&CorrelationContext> {
        request.extensions().get::<CorrelationContext>()
    }

    /// Whether the client id was generated for this request
    pub fn is_generated(&self) -> bool {
        self.generated
    }

    /// `id` and `agent`, followed by whichever optional headers were present
    pub fn attrs(&self) -> Vec<Attr> {
        let mut attrs = vec![
            Attr::new("id", &self.client_id),
            Attr::new("agent", &self.client_agent),
        ];
        let optional = [
            ("version", &self.client_version),
            ("session_id", &self.session_id),
            ("request_id", &self.request_id),
            ("origin", &self.origin_service),
            ("user_agent", &self.user_agent),
        ];
        attrs.extend(
            optional
                .into_iter()
                .filter_map(|(key, value)| value.as_ref().map(|value| Attr::new(key, value))),
        );
        attrs
    }

    /// `base` tagged with this request's attributes
    pub fn logger(&self, base: &Logger) -> Logger {
        base.with(&self.attrs())
    }
}
