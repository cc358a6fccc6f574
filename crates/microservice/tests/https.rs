//! Integration tests for HTTPS listeners and https:// hops.

mod common;

use common::*;
use microservice::config::ServeConfig;
use reqwest::StatusCode;

#[tokio::test]
async fn test_https_node_serves_health() {
    let port = spawn_node(tls_node_config("secure")).await;

    let response = insecure_client()
        .get(format!("https://localhost:{port}/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(envelope(response).await["service"], "secure");
}

#[tokio::test]
async fn test_https_node_rejects_plain_http() {
    let port = spawn_node(tls_node_config("secure")).await;
    let result = client()
        .get(format!("http://127.0.0.1:{port}/"))
        .send()
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_chain_into_https_hop() {
    let front = ServeConfig {
        upstream_tls_insecure: true,
        ..node_config("front")
    };
    let front_port = spawn_node(front).await;
    let secure_port = spawn_node(tls_node_config("secure")).await;

    let response = client()
        .get(format!(
            "http://127.0.0.1:{front_port}/proxy/https://localhost:{secure_port}/"
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(envelope(response).await["service"], "secure");
}

#[tokio::test]
async fn test_collapsed_https_scheme_hop() {
    let front = ServeConfig {
        upstream_tls_insecure: true,
        ..node_config("front")
    };
    let front_port = spawn_node(front).await;
    let secure_port = spawn_node(tls_node_config("secure")).await;

    let response = client()
        .get(format!(
            "http://127.0.0.1:{front_port}/proxy/https:/localhost:{secure_port}/fault/418"
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(envelope(response).await["service"], "secure");
}

#[tokio::test]
async fn test_untrusted_https_hop_is_bad_gateway() {
    let front_port = spawn_node(node_config("front")).await;
    let secure_port = spawn_node(tls_node_config("secure")).await;

    let response = client()
        .get(format!(
            "http://127.0.0.1:{front_port}/proxy/https://localhost:{secure_port}/"
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(text(response).await.starts_with("Next hop error:"));
}
