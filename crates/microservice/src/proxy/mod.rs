//! Node server module.
//!
//! This module provides the node implementation:
//! - Directive execution (terminal, fault gate, forward)
//! - Probabilistic fault injection with a pluggable randomness source
//! - Forwarding to the next hop over HTTP or HTTPS
//! - Optional header logging with redaction
//! - TLS termination
//!
//! # Module Structure
//!
//! - `server` - NodeServer struct and main run loop
//! - `handler` - Request executor and the handler seam
//! - `forwarding` - Request forwarding to the next hop
//! - `fault` - Fault draws
//! - `headers` - Header logging decorator
//! - `response` - Envelope, health and error responses
//! - `client` - HTTP client creation and configuration
//! - `tls` - TLS utilities and certificate handling

mod client;
mod fault;
mod forwarding;
mod handler;
mod headers;
mod response;
mod response_ext;
mod server;
mod tls;

pub use client::{create_http_client, HttpClient};
pub use fault::{should_fire, FaultRoller, SeededRoller, ThreadRngRoller};
pub use forwarding::forward_to_hop;
pub use handler::{RequestExecutor, RequestHandler};
pub use headers::{redacted_headers, HeaderLogging, REDACTED, SENSITIVE_HEADERS};
pub use response::{error_response, Envelope, HealthStatus, SUCCESS_MESSAGE};
pub use response_ext::{boxed_body, BoxError, ProxyBody, RequestExt, ResponseExt};
pub use server::NodeServer;
pub use tls::create_tls_acceptor;
