//! Forwarding to the next hop.

use super::client::HttpClient;
use super::response_ext::{boxed_body, BoxError, ProxyBody};
use crate::error::UpstreamError;
use crate::routing::HopTarget;
use hyper::body::{Body, Bytes, Frame, SizeHint};
use hyper::{Request, Response};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::time::{Instant, Sleep};
use tracing::{debug, info, warn};

/// Send the inbound method and body to `remaining` on `hop`.
///
/// The deadline bounds the whole exchange: the wait for the upstream
/// response headers and the relayed body. The upstream status, headers and
/// body are relayed untouched; the body is streamed, not buffered, and ends
/// with an error if the deadline passes before its last frame.
pub async fn forward_to_hop(
    http_client: &HttpClient,
    req: Request<ProxyBody>,
    hop: &HopTarget,
    remaining: &str,
    deadline: Option<Instant>,
) -> Result<Response<ProxyBody>, UpstreamError> {
    let url = hop.url_for(remaining);
    let (parts, body) = req.into_parts();

    let upstream_req = Request::builder()
        .method(parts.method)
        .uri(url.as_str())
        .body(body)
        .map_err(|source| UpstreamError::InvalidUrl {
            url: url.clone(),
            source,
        })?;

    info!(next_hop_url = %url, next_service = hop.authority(), "Forwarding to next hop");

    let started = Instant::now();
    let pending = http_client.request(upstream_req);
    let outcome = match deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline, pending).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                warn!(next_hop_url = %url, elapsed_ms, "Next hop request hit the deadline");
                return Err(UpstreamError::DeadlineExceeded { url, elapsed_ms });
            }
        },
        None => pending.await,
    };

    let upstream = outcome.map_err(|source| UpstreamError::Transport {
        url: url.clone(),
        source,
    })?;

    info!(
        status_code = upstream.status().as_u16(),
        forward_duration_ms = started.elapsed().as_millis() as u64,
        next_hop_url = %url,
        "Next hop response received"
    );
    debug!(header_count = upstream.headers().len(), "Relaying upstream response");

    Ok(upstream.map(|body| match deadline {
        Some(deadline) => boxed_body(DeadlineBody::new(boxed_body(body), deadline, url, started)),
        None => boxed_body(body),
    }))
}

/// Body that fails once `deadline` passes before the inner body has ended.
pub struct DeadlineBody {
    inner: ProxyBody,
    sleep: Pin<Box<Sleep>>,
    url: String,
    started: Instant,
    expired: bool,
}

impl DeadlineBody {
    pub fn new(inner: ProxyBody, deadline: Instant, url: String, started: Instant) -> Self {
        Self {
            inner,
            sleep: Box::pin(tokio::time::sleep_until(deadline)),
            url,
            started,
            expired: false,
        }
    }
}

impl Body for DeadlineBody {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        if this.expired {
            return Poll::Ready(None);
        }

        if let Poll::Ready(frame) = Pin::new(&mut this.inner).poll_frame(cx) {
            return Poll::Ready(frame);
        }

        match this.sleep.as_mut().poll(cx) {
            Poll::Ready(()) => {
                this.expired = true;
                let elapsed_ms = this.started.elapsed().as_millis() as u64;
                warn!(next_hop_url = %this.url, elapsed_ms, "Next hop body hit the deadline");
                Poll::Ready(Some(Err(Box::new(UpstreamError::DeadlineExceeded {
                    url: std::mem::take(&mut this.url),
                    elapsed_ms,
                }))))
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.expired || self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
