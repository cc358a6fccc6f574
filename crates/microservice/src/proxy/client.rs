//! HTTP client creation and configuration.
//!
//! One pooled client is shared by every request a node forwards; it holds no
//! per-request state.

use super::response_ext::ProxyBody;
use super::tls::{crypto_provider, InsecureVerifier};
use anyhow::Context;
use hyper_rustls::{ConfigBuilderExt as _, HttpsConnector};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::sync::Arc;
use tracing::{info, warn};

/// Type alias for the HTTP client used to reach the next hop.
pub type HttpClient = Client<HttpsConnector<HttpConnector>, ProxyBody>;

/// Create the shared HTTP client.
///
/// With `skip_tls_verify` set, HTTPS hops are reached without validating
/// their certificates. Otherwise the platform trust store is used, falling
/// back to the bundled Mozilla roots when the platform has none.
pub fn create_http_client(skip_tls_verify: bool) -> Result<HttpClient, anyhow::Error> {
    let mut http_connector = HttpConnector::new();
    http_connector.set_nodelay(true);
    http_connector.enforce_http(false); // Allow both HTTP and HTTPS

    let provider = crypto_provider();
    let tls_config = if skip_tls_verify {
        warn!("TLS certificate verification DISABLED for upstream hops (testing only)");
        rustls::ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()
            .context("Failed to select TLS protocol versions")?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(InsecureVerifier::new(provider)))
            .with_no_client_auth()
    } else {
        let builder = rustls::ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .context("Failed to select TLS protocol versions")?;
        match builder.clone().with_native_roots() {
            Ok(builder) => builder.with_no_client_auth(),
            Err(e) => {
                warn!(error = %e, "No usable platform root certificates, using bundled roots");
                builder.with_webpki_roots().with_no_client_auth()
            }
        }
    };

    let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1()
        .wrap_connector(http_connector);

    let http_client = Client::builder(TokioExecutor::new()).build(https_connector);

    info!(
        tls_verify = !skip_tls_verify,
        "Upstream HTTP client configured (HTTP/1.1)"
    );

    Ok(http_client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_verifying_client() {
        assert!(create_http_client(false).is_ok());
    }

    #[tokio::test]
    async fn test_create_insecure_client() {
        assert!(create_http_client(true).is_ok());
    }
}
