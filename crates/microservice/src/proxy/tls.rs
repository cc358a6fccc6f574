//! TLS utilities for the node.
//!
//! Certificate loading for the HTTPS listener and a no-op certificate
//! verifier for `--upstream-tls-insecure`.

use anyhow::Context;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::DigitallySignedStruct;
use std::path::Path;
use std::sync::Arc;
use tokio_rustls::TlsAcceptor;

/// Crypto provider shared by the listener and the outbound client.
pub fn crypto_provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// Accepts any server certificate. Handshake signatures are still checked
/// so the session keys belong to whoever holds the presented certificate.
///
/// # Warning
/// This disables certificate validation - use only for test topologies.
#[derive(Debug)]
pub struct InsecureVerifier {
    provider: Arc<CryptoProvider>,
}

impl InsecureVerifier {
    pub fn new(provider: Arc<CryptoProvider>) -> Self {
        Self { provider }
    }
}

impl ServerCertVerifier for InsecureVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Create TLS acceptor from PEM certificate and key files.
pub fn create_tls_acceptor(cert_path: &Path, key_path: &Path) -> Result<TlsAcceptor, anyhow::Error> {
    // Load certificate chain
    let cert_file = std::fs::File::open(cert_path).with_context(|| {
        format!("Failed to open certificate file '{}'", cert_path.display())
    })?;
    let mut cert_reader = std::io::BufReader::new(cert_file);
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut cert_reader)
        .collect::<Result<_, _>>()
        .context("Failed to parse certificate file")?;

    if certs.is_empty() {
        anyhow::bail!(
            "No certificates found in certificate file: {}",
            cert_path.display()
        );
    }

    // Load private key (PKCS8, RSA or SEC1)
    let key_file = std::fs::File::open(key_path).with_context(|| {
        format!("Failed to open private key file '{}'", key_path.display())
    })?;
    let mut key_reader = std::io::BufReader::new(key_file);
    let key = rustls_pemfile::private_key(&mut key_reader)
        .context("Failed to parse private key file")?
        .ok_or_else(|| {
            anyhow::anyhow!("No private key found in key file: {}", key_path.display())
        })?;

    let mut config = rustls::ServerConfig::builder_with_provider(crypto_provider())
        .with_safe_default_protocol_versions()
        .context("Failed to select TLS protocol versions")?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .context("Failed to build TLS configuration")?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(TlsAcceptor::from(Arc::new(config)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    #[test]
    fn test_insecure_verifier_supported_schemes() {
        let verifier = InsecureVerifier::new(crypto_provider());
        let schemes = verifier.supported_verify_schemes();
        assert!(!schemes.is_empty());
        assert!(schemes.contains(&rustls::SignatureScheme::ECDSA_NISTP256_SHA256));
        assert!(schemes.contains(&rustls::SignatureScheme::RSA_PSS_SHA256));
    }

    #[test]
    fn test_create_tls_acceptor_from_fixtures() {
        let acceptor = create_tls_acceptor(&fixture("cert.pem"), &fixture("key.pem"));
        assert!(acceptor.is_ok(), "{:?}", acceptor.err());
    }

    #[test]
    fn test_create_tls_acceptor_missing_file() {
        let err = create_tls_acceptor(Path::new("/nonexistent/cert.pem"), &fixture("key.pem"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("Failed to open certificate file"));
    }

    #[test]
    fn test_create_tls_acceptor_empty_certificate() {
        let mut empty = tempfile::NamedTempFile::new().unwrap();
        empty.write_all(b"").unwrap();

        let err = create_tls_acceptor(empty.path(), &fixture("key.pem"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("No certificates found"));
    }

    #[test]
    fn test_create_tls_acceptor_key_file_without_key() {
        // A certificate is not a private key
        let err = create_tls_acceptor(&fixture("cert.pem"), &fixture("cert.pem"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("No private key found"));
    }
}
