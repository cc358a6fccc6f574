//! NodeServer struct and main run loop.
//!
//! The server owns the listener, answers `/health` itself and hands every
//! other request to its [`RequestHandler`].

use super::client::create_http_client;
use super::fault::{FaultRoller, ThreadRngRoller};
use super::handler::{RequestExecutor, RequestHandler};
use super::headers::HeaderLogging;
use super::response::{error_response, health_response};
use super::response_ext::{ProxyBody, RequestExt, ResponseExt};
use super::tls::create_tls_acceptor;
use crate::config::ServeConfig;
use crate::routing::Scheme;
use anyhow::Context;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

const HEALTH_PATH: &str = "/health";

const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(5);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Delay before the next accept after a failure; doubles up to one second.
fn next_accept_backoff(previous: Option<Duration>) -> Duration {
    match previous {
        None => ACCEPT_BACKOFF_MIN,
        Some(delay) => (delay * 2).min(ACCEPT_BACKOFF_MAX),
    }
}

/// A bound node, ready to serve.
pub struct NodeServer {
    listener: TcpListener,
    tls_acceptor: Option<TlsAcceptor>,
    handler: Arc<dyn RequestHandler>,
    service_name: Arc<str>,
}

impl NodeServer {
    /// Bind a node drawing fault decisions from the thread-local RNG.
    pub async fn bind(config: &ServeConfig) -> Result<Self, anyhow::Error> {
        Self::bind_with_roller(config, Arc::new(ThreadRngRoller)).await
    }

    /// Bind a node with an explicit randomness source.
    ///
    /// The port is not range checked here, so port 0 picks an ephemeral one.
    pub async fn bind_with_roller(
        config: &ServeConfig,
        roller: Arc<dyn FaultRoller>,
    ) -> Result<Self, anyhow::Error> {
        let port = u16::try_from(config.port)
            .with_context(|| format!("port {} out of range", config.port))?;

        let tls_acceptor = match config.tls_files()? {
            Some((cert, key)) => Some(create_tls_acceptor(cert, key)?),
            None => None,
        };

        let http_client = create_http_client(config.upstream_tls_insecure)?;
        let executor = RequestExecutor::new(
            http_client,
            config.service_name.as_str(),
            config.timeout,
            roller,
        );
        let handler: Arc<dyn RequestHandler> = if config.log_headers {
            Arc::new(HeaderLogging::new(executor))
        } else {
            Arc::new(executor)
        };

        let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port)))
            .await
            .with_context(|| format!("Failed to bind port {port}"))?;

        Ok(Self {
            listener,
            tls_acceptor,
            handler,
            service_name: Arc::from(config.service_name.as_str()),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, anyhow::Error> {
        self.listener
            .local_addr()
            .context("Failed to read listener address")
    }

    /// Scheme clients must use to reach this node.
    pub fn scheme(&self) -> Scheme {
        if self.tls_acceptor.is_some() {
            Scheme::Https
        } else {
            Scheme::Http
        }
    }

    /// Accept connections forever. Accept failures (e.g. out of file
    /// descriptors) are logged and retried with backoff.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        info!(
            addr = %self.local_addr()?,
            scheme = %self.scheme(),
            service = %self.service_name,
            "Server listening"
        );

        let NodeServer {
            listener,
            tls_acceptor,
            handler,
            service_name,
        } = self;

        let mut backoff = None;
        loop {
            let (stream, remote_addr) = match listener.accept().await {
                Ok(accepted) => {
                    backoff = None;
                    accepted
                }
                Err(err) => {
                    let delay = next_accept_backoff(backoff);
                    backoff = Some(delay);
                    warn!(error = %err, retry_in_ms = delay.as_millis() as u64, "Accept failed");
                    tokio::time::sleep(delay).await;
                    continue;
                }
            };
            let handler = Arc::clone(&handler);
            let service_name = Arc::clone(&service_name);
            let tls_acceptor = tls_acceptor.clone();

            tokio::spawn(async move {
                match tls_acceptor {
                    Some(acceptor) => match acceptor.accept(stream).await {
                        Ok(tls_stream) => {
                            serve_connection(tls_stream, remote_addr, handler, service_name).await
                        }
                        Err(err) => {
                            error!(remote_addr = %remote_addr, error = %err, "TLS handshake failed");
                        }
                    },
                    None => serve_connection(stream, remote_addr, handler, service_name).await,
                }
            });
        }
    }
}

async fn serve_connection<S>(
    stream: S,
    remote_addr: SocketAddr,
    handler: Arc<dyn RequestHandler>,
    service_name: Arc<str>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let io = TokioIo::new(stream);
    let service = service_fn(move |req| {
        let handler = Arc::clone(&handler);
        let service_name = Arc::clone(&service_name);
        async move { Ok::<_, Infallible>(dispatch(req, remote_addr, handler, service_name).await) }
    });

    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
        if err.is_incomplete_message() || err.is_canceled() {
            debug!(remote_addr = %remote_addr, error = %err, "Connection closed early");
        } else {
            error!(remote_addr = %remote_addr, error = %err, "Error serving connection");
        }
    }
}

async fn dispatch(
    req: Request<Incoming>,
    remote_addr: SocketAddr,
    handler: Arc<dyn RequestHandler>,
    service_name: Arc<str>,
) -> Response<ProxyBody> {
    if req.uri().path() == HEALTH_PATH {
        debug!(remote_addr = %remote_addr, "Health check request");
        return match health_response(&service_name) {
            Ok(response) => response.into_boxed(),
            Err(err) => {
                error!(error = %err, "Failed to encode health response");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, &format!("Response error: {err}"))
                    .into_boxed()
            }
        };
    }

    let span = info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %req.method(),
        path = %req.uri().path(),
        service = %service_name,
        remote_addr = %remote_addr,
    );

    async move {
        info!(
            user_agent = req
                .headers()
                .get(hyper::header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .unwrap_or(""),
            "Incoming request"
        );
        handler.handle(req.into_boxed()).await
    }
    .instrument(span)
    .await
}
