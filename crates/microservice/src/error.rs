//! Error types for path routing and request execution.

use hyper::StatusCode;
use std::error::Error as StdError;
use thiserror::Error;

/// A path that does not follow the directive grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Fault code missing, non-numeric, or outside 400-599.
    #[error("invalid fault code {0:?}: must be a number between 400 and 599")]
    InvalidFaultCode(String),

    /// Numeric fault percentage outside 0-100.
    #[error("invalid fault percentage {0}: must be 0-100")]
    InvalidPercentage(i64),

    /// `/proxy/` with nothing (or only a scheme) after it.
    #[error("invalid path: empty service name")]
    EmptyServiceName,

    /// Path that starts with neither `/proxy/` nor `/fault/`.
    #[error("invalid path {0:?}: must start with /proxy/ or /fault/")]
    UnrecognizedPrefix(String),

    /// Percent-escapes that do not decode to UTF-8.
    #[error("invalid path {0:?}: not valid percent-encoded UTF-8")]
    InvalidEncoding(String),
}

/// The outbound call to the next hop failed.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// The hop and remaining path do not form a valid request URI.
    #[error("invalid next hop url {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: hyper::http::Error,
    },

    /// Connection, TLS or protocol failure.
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    /// No response headers before the request deadline.
    #[error("request to {url} timed out after {elapsed_ms}ms")]
    DeadlineExceeded { url: String, elapsed_ms: u64 },
}

/// The local JSON payload could not be serialized.
#[derive(Error, Debug)]
#[error("failed to encode response body")]
pub struct EncodingError(#[from] pub serde_json::Error);

/// Anything that ends request processing early.
#[derive(Error, Debug)]
pub enum RouteError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

impl RouteError {
    /// Status returned to the caller for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            RouteError::Parse(_) => StatusCode::BAD_REQUEST,
            RouteError::Upstream(_) => StatusCode::BAD_GATEWAY,
            RouteError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body text returned to the caller for this error.
    pub fn body_text(&self) -> String {
        match self {
            RouteError::Parse(e) => e.to_string(),
            RouteError::Upstream(e) => format!("Next hop error: {}", display_chain(e)),
            RouteError::Encoding(e) => format!("Response error: {}", display_chain(e)),
        }
    }
}

/// Render an error followed by all of its sources, separated by `: `.
pub fn display_chain(err: &(dyn StdError + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
