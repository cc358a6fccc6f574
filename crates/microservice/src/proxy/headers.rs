//! Header logging with sensitive value redaction.
//!
//! [`HeaderLogging`] wraps any [`RequestHandler`] and logs the headers of
//! each request and response it sees. The wrapped handler is unaware of it.

use super::handler::RequestHandler;
use super::response_ext::ProxyBody;
use async_trait::async_trait;
use hyper::header::{HeaderMap, HeaderName};
use hyper::{Request, Response};
use std::collections::BTreeMap;
use tracing::info;

/// Replacement for the value of a sensitive header.
pub const REDACTED: &str = "[REDACTED]";

/// Headers whose values never reach the logs.
pub const SENSITIVE_HEADERS: [&str; 6] = [
    "authorization",
    "cookie",
    "set-cookie",
    "proxy-authorization",
    "x-api-key",
    "x-auth-token",
];

/// Header names are stored lowercase, so a plain comparison is case-insensitive.
pub fn is_sensitive(name: &HeaderName) -> bool {
    SENSITIVE_HEADERS.contains(&name.as_str())
}

/// Loggable view of `headers`: one entry per name, repeated values joined
/// with `", "`, sensitive values replaced by [`REDACTED`].
pub fn redacted_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .keys()
        .map(|name| {
            let value = if is_sensitive(name) {
                REDACTED.to_string()
            } else {
                headers
                    .get_all(name)
                    .iter()
                    .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            (name.as_str().to_string(), value)
        })
        .collect()
}

/// Decorator logging redacted request and response headers.
pub struct HeaderLogging<H> {
    inner: H,
}

impl<H> HeaderLogging<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<H: RequestHandler> RequestHandler for HeaderLogging<H> {
    async fn handle(&self, req: Request<ProxyBody>) -> Response<ProxyBody> {
        info!(request_headers = ?redacted_headers(req.headers()), "Request headers");
        let response = self.inner.handle(req).await;
        info!(response_headers = ?redacted_headers(response.headers()), "Response headers");
        response
    }
}
