//! Request correlation middleware
//!
//! [`CorrelationLayer`] wraps an HTTP service. For every request it:
//!
//! 1. reads the identity headers into a [`CorrelationContext`] (generating a
//!    client id when none was sent) and stores it, with an empty
//!    [`RequestErrors`], in the request extensions;
//! 2. buffers the request body and hands the inner service a fresh copy;
//! 3. buffers the response body and status;
//! 4. emits one Info record (`"api"` by default) carrying `method`, `path`,
//!    `query`, `client_ip`, `request_body`, `response_body`, `status`,
//!    `latency` and `error`, tagged with the context's attributes.
//!
//! # Example
//!
//! ```ignore
//! use logsieve_http::CorrelationLayer;
//! use tower::ServiceBuilder;
//!
//! let service = ServiceBuilder::new()
//!     .layer(CorrelationLayer::new().skip_path("/health"))
//!     .service(app);
//! ```

use crate::context::{generate_id, CorrelationContext, IdGenerator};
use crate::errors::RequestErrors;
use bytes::Bytes;
use futures_util::future::BoxFuture;
use http::{HeaderMap, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use logsieve_core::{Attr, Log, Logger};
use std::collections::HashSet;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};

/// Message of the per-request summary record
pub const DEFAULT_MESSAGE: &str = "api";

#[derive(Clone)]
struct Settings {
    logger: Option<Logger>,
    id_generator: IdGenerator,
    message: String,
    skip_paths: HashSet<String>,
    tag_only: bool,
}

impl Settings {
    fn emits_summary(&self, path: &str) -> bool {
        !self.tag_only && !self.skip_paths.contains(path)
    }

    fn logger(&self) -> Logger {
        self.logger.clone().unwrap_or_else(logsieve_core::logger)
    }
}

/// Layer tagging requests with correlation context and logging a summary
#[derive(Clone)]
pub struct CorrelationLayer {
    settings: Arc<Settings>,
}

impl CorrelationLayer {
    /// Layer logging through the global logger, read on every request
    pub fn new() -> Self {
        Self {
            settings: Arc::new(Settings {
                logger: None,
                id_generator: Arc::new(generate_id),
                message: DEFAULT_MESSAGE.to_string(),
                skip_paths: HashSet::new(),
                tag_only: false,
            }),
        }
    }

    fn settings_mut(&mut self) -> &mut Settings {
        Arc::make_mut(&mut self.settings)
    }

    /// Log summaries through `logger` instead of the global logger
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.settings_mut().logger = Some(logger);
        self
    }

    /// Generate missing client ids with `generator`
    pub fn with_id_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.settings_mut().id_generator = Arc::new(generator);
        self
    }

    /// Use `message` for summary records
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.settings_mut().message = message.into();
        self
    }

    /// Do not log a summary for requests to exactly `path`
    pub fn skip_path(mut self, path: impl Into<String>) -> Self {
        self.settings_mut().skip_paths.insert(path.into());
        self
    }

    /// Only tag requests with context; never log summaries
    pub fn tag_only(mut self) -> Self {
        self.settings_mut().tag_only = true;
        self
    }
}

impl Default for CorrelationLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for CorrelationLayer {
    type Service = CorrelationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationService {
            inner,
            settings: Arc::clone(&self.settings),
        }
    }
}

/// Service produced by [`CorrelationLayer`]
#[derive(Clone)]
pub struct CorrelationService<S> {
    inner: S,
    settings: Arc<Settings>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CorrelationService<S>
where
    S: Service<Request<Full<Bytes>>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: fmt::Display + Send + 'static,
    ReqBody: Body + Send + 'static,
    ReqBody::Data: Send,
    ReqBody::Error: fmt::Display,
    ResBody: Body + Send + 'static,
    ResBody::Data: Send,
    ResBody::Error: fmt::Display,
{
    type Response = Response<Full<Bytes>>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        // The clone may not be ready; keep the instance poll_ready was called on.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let settings = Arc::clone(&self.settings);

        Box::pin(async move {
            let start = Instant::now();

            let context =
                CorrelationContext::from_headers(request.headers(), || (settings.id_generator)());
            let errors = RequestErrors::new();

            let method = request.method().to_string();
            let path = request.uri().path().to_string();
            let query = request.uri().query().unwrap_or_default().to_string();
            let client_ip = client_ip(request.headers(), request.extensions());

            let (mut parts, body) = request.into_parts();
            let request_body = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(err) => {
                    logsieve_core::diag_debug!(error = %err, "request body could not be buffered");
                    errors.push(format_args!("reading request body: {}", err));
                    Bytes::new()
                }
            };
            parts.extensions.insert(context.clone());
            parts.extensions.insert(errors.clone());

            let result = inner
                .call(Request::from_parts(parts, Full::new(request_body.clone())))
                .await;

            let (result, status, response_body) = match result {
                Ok(response) => {
                    let (parts, body) = response.into_parts();
                    let bytes = match body.collect().await {
                        Ok(collected) => collected.to_bytes(),
                        Err(err) => {
                            logsieve_core::diag_debug!(error = %err, "response body could not be buffered");
                            errors.push(format_args!("reading response body: {}", err));
                            Bytes::new()
                        }
                    };
                    let status = parts.status;
                    (
                        Ok(Response::from_parts(parts, Full::new(bytes.clone()))),
                        status,
                        bytes,
                    )
                }
                Err(err) => {
                    errors.push(&err);
                    (Err(err), StatusCode::INTERNAL_SERVER_ERROR, Bytes::new())
                }
            };
            let latency = start.elapsed();

            if settings.emits_summary(&path) {
                context.logger(&settings.logger()).info(
                    &settings.message,
                    &[
                        Attr::new("method", method),
                        Attr::new("path", path),
                        Attr::new("query", query),
                        Attr::new("client_ip", client_ip),
                        Attr::new("request_body", text(&request_body)),
                        Attr::new("response_body", text(&response_body)),
                        Attr::new("status", status.as_u16()),
                        Attr::new("latency", latency),
                        Attr::new("error", errors.to_string()),
                    ],
                );
            }

            result
        })
    }
}

fn text(bytes: &Bytes) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn parse_ip(value: &str) -> Option<String> {
    let value = value.trim();
    value.parse::<IpAddr>().ok().map(|_| value.to_string())
}

/// Client address: first `X-Forwarded-For` entry, then `X-Real-IP`, then the
/// peer `SocketAddr` from the extensions. Empty when none is known.
pub fn client_ip(headers: &HeaderMap, extensions: &http::Extensions) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(parse_ip);

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .and_then(parse_ip)
    };

    let peer = || {
        extensions
            .get::<SocketAddr>()
            .map(|addr| addr.ip().to_string())
    };

    forwarded.or_else(real_ip).or_else(peer).unwrap_or_default()
}
