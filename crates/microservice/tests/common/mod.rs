//! Shared helpers: in-process nodes and stub upstreams on ephemeral ports.

#![allow(dead_code)]

use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use microservice::config::ServeConfig;
use microservice::proxy::{FaultRoller, NodeServer, ThreadRngRoller};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Plain HTTP node config on an ephemeral port.
pub fn node_config(service_name: &str) -> ServeConfig {
    ServeConfig {
        port: 0,
        timeout: TEST_TIMEOUT,
        service_name: service_name.to_string(),
        ..Default::default()
    }
}

/// HTTPS node config using the checked-in localhost certificate.
pub fn tls_node_config(service_name: &str) -> ServeConfig {
    ServeConfig {
        tls_cert: Some(fixture("cert.pem")),
        tls_key: Some(fixture("key.pem")),
        ..node_config(service_name)
    }
}

/// Start a node and return its port.
pub async fn spawn_node_with_roller(config: ServeConfig, roller: Arc<dyn FaultRoller>) -> u16 {
    let server = NodeServer::bind_with_roller(&config, roller)
        .await
        .expect("Failed to bind node");
    let port = server.local_addr().expect("Missing local address").port();
    tokio::spawn(server.run());
    port
}

pub async fn spawn_node(config: ServeConfig) -> u16 {
    spawn_node_with_roller(config, Arc::new(ThreadRngRoller)).await
}

/// Authority of a plain HTTP node, ready to embed in a `/proxy/` segment.
pub async fn spawn_named(service_name: &str) -> String {
    let port = spawn_node(node_config(service_name)).await;
    format!("127.0.0.1:{port}")
}

pub fn client() -> Client {
    Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(30))
        .build()
        .expect("Failed to build client")
}

/// Client that accepts the self-signed fixture certificate.
pub fn insecure_client() -> Client {
    Client::builder()
        .no_proxy()
        .danger_accept_invalid_certs(true)
        .timeout(Duration::from_secs(30))
        .build()
        .expect("Failed to build client")
}

/// Stub upstream that echoes what it received.
///
/// Replies 201 with the request body, plus `x-echo-method`, `x-echo-uri`,
/// `x-saw-client` (whether an `x-client` header arrived) and `x-upstream`.
/// Each response is delayed by `delay`. The counter tracks requests served.
pub async fn spawn_echo_with_delay(delay: Duration) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind echo upstream");
    let addr = listener.local_addr().expect("Missing local address");
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let counter = Arc::clone(&counter);
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(delay).await;

                        let method = req.method().to_string();
                        let uri = req.uri().to_string();
                        let saw_client = req.headers().contains_key("x-client");
                        let body = req.into_body().collect().await?.to_bytes();

                        Ok::<_, hyper::Error>(
                            Response::builder()
                                .status(201)
                                .header("x-echo-method", method)
                                .header("x-echo-uri", uri)
                                .header("x-saw-client", saw_client.to_string())
                                .header("x-upstream", "echo")
                                .body(Full::new(body))
                                .expect("Failed to build echo response"),
                        )
                    }
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    (addr.to_string(), hits)
}

pub async fn spawn_echo() -> (String, Arc<AtomicUsize>) {
    spawn_echo_with_delay(Duration::ZERO).await
}

/// Stub upstream that sends headers announcing 100 bytes, writes 3, then
/// holds the connection open for `stall` without writing more.
pub async fn spawn_stalled_body(stall: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stalled upstream");
    let addr = listener.local_addr().expect("Missing local address");

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let head = "HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\ncontent-length: 100\r\n\r\nabc";
                if stream.write_all(head.as_bytes()).await.is_err() {
                    return;
                }
                let _ = stream.flush().await;
                tokio::time::sleep(stall).await;
            });
        }
    });

    addr.to_string()
}

/// An address nothing listens on.
pub async fn closed_authority() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind probe listener");
    let addr = listener.local_addr().expect("Missing local address");
    drop(listener);
    addr.to_string()
}

/// Body of a local (non-forwarded) response.
pub async fn envelope(response: reqwest::Response) -> serde_json::Value {
    response.json().await.expect("Response is not JSON")
}

pub async fn text(response: reqwest::Response) -> String {
    response.text().await.expect("Failed to read body")
}
