//! Request execution.
//!
//! [`RequestExecutor`] walks the directives of a request path:
//!
//! - a fault gate draws once; if it fires the request ends with the fault,
//!   otherwise the remaining path is parsed and execution continues
//! - a terminal directive answers with the local success payload
//! - a forward directive hands the request to the next hop and relays
//!   whatever comes back

use super::client::HttpClient;
use super::fault::{should_fire, FaultRoller};
use super::forwarding::forward_to_hop;
use super::response::{error_response, fault_response, success_response};
use super::response_ext::{ProxyBody, ResponseExt};
use crate::error::RouteError;
use crate::routing::{decode_path, parse, Directive};
use async_trait::async_trait;
use hyper::{Request, Response};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info};

/// Anything that turns a request into a response.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, req: Request<ProxyBody>) -> Response<ProxyBody>;
}

#[async_trait]
impl<H: RequestHandler + ?Sized> RequestHandler for Arc<H> {
    async fn handle(&self, req: Request<ProxyBody>) -> Response<ProxyBody> {
        (**self).handle(req).await
    }
}

/// Executes the directive chain of each request.
pub struct RequestExecutor {
    http_client: HttpClient,
    service_name: Arc<str>,
    timeout: Duration,
    roller: Arc<dyn FaultRoller>,
}

impl RequestExecutor {
    /// A zero `timeout` leaves forwarded requests without a deadline.
    pub fn new(
        http_client: HttpClient,
        service_name: impl Into<Arc<str>>,
        timeout: Duration,
        roller: Arc<dyn FaultRoller>,
    ) -> Self {
        Self {
            http_client,
            service_name: service_name.into(),
            timeout,
            roller,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Deadline for a request that starts now.
    pub fn deadline(&self) -> Option<Instant> {
        (!self.timeout.is_zero()).then(|| Instant::now() + self.timeout)
    }

    /// Execute `req` and map any failure to its response.
    pub async fn execute(
        &self,
        req: Request<ProxyBody>,
        deadline: Option<Instant>,
    ) -> Response<ProxyBody> {
        let start_time = Instant::now();

        let response = match self.route(req, deadline).await {
            Ok(response) => response,
            Err(err) => {
                let status = err.status();
                match &err {
                    RouteError::Parse(e) => error!(error = %e, "Path parsing failed"),
                    RouteError::Upstream(e) => {
                        error!(error = %crate::error::display_chain(e), "Next hop request failed")
                    }
                    RouteError::Encoding(e) => error!(error = %e, "Failed to encode response"),
                }
                error_response(status, &err.body_text()).into_boxed()
            }
        };

        info!(
            status_code = response.status().as_u16(),
            duration_ms = start_time.elapsed().as_secs_f64() * 1000.0,
            "Request completed"
        );
        response
    }

    async fn route(
        &self,
        req: Request<ProxyBody>,
        deadline: Option<Instant>,
    ) -> Result<Response<ProxyBody>, RouteError> {
        let mut directive = parse(&decode_path(req.uri().path())?)?;

        loop {
            debug!(
                next_hop = directive.next_hop().map(|h| h.authority()),
                remaining = directive.remaining(),
                is_last_hop = directive.is_terminal(),
                "Path parsed"
            );

            match directive {
                Directive::Terminal => {
                    info!("Processing as final hop");
                    return Ok(success_response(&self.service_name)?.into_boxed());
                }
                Directive::Fault { fault, remaining } => {
                    info!(
                        fault_code = fault.status().as_u16(),
                        percentage = fault.percentage(),
                        "Fault injection detected"
                    );

                    if should_fire(&fault, self.roller.as_ref()) {
                        info!(fault_code = fault.status().as_u16(), "Fault triggered");
                        return Ok(fault_response(&fault, &self.service_name)?.into_boxed());
                    }

                    info!(remaining = %remaining, "Fault not triggered, continuing to next segment");
                    directive = parse(&remaining)?;
                }
                Directive::Forward { hop, remaining } => {
                    let response =
                        forward_to_hop(&self.http_client, req, &hop, &remaining, deadline).await?;
                    return Ok(response);
                }
            }
        }
    }
}

#[async_trait]
impl RequestHandler for RequestExecutor {
    async fn handle(&self, req: Request<ProxyBody>) -> Response<ProxyBody> {
        let deadline = self.deadline();
        self.execute(req, deadline).await
    }
}
