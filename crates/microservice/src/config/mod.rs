//! Node configuration.
//!
//! Everything a node needs comes from the command line (or the matching
//! `MICROSERVICE_*` environment variables). The topology itself is never
//! configured: it travels in request paths.

mod cli;
mod logging;

use clap::Args;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub use cli::{Cli, Command};
pub use logging::{init_tracing, LogFormat, LogLevel};

pub const DEFAULT_PORT: u32 = 8080;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SERVICE_NAME: &str = "proxy";

/// Rejected `serve` settings. Displayed verbatim to the operator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("port must be between 1 and 65535, got {0}")]
    InvalidPort(u32),

    #[error("log-level must be one of [debug, info, warn, error], got {0:?}")]
    InvalidLogLevel(String),

    #[error("log-format must be one of [json, text], got {0:?}")]
    InvalidLogFormat(String),

    #[error("both --tls-cert and --tls-key must be provided together")]
    IncompleteTls,

    #[error("certificate file not found: {}", .0.display())]
    CertificateNotFound(PathBuf),

    #[error("key file not found: {}", .0.display())]
    KeyNotFound(PathBuf),
}

/// Settings of the `serve` command.
#[derive(Debug, Clone, Args)]
pub struct ServeConfig {
    /// HTTP server port
    #[arg(short, long, env = "MICROSERVICE_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u32,

    /// Deadline for forwarded requests (e.g. 30s, 1m, 500ms); 0s disables it
    #[arg(
        short,
        long,
        env = "MICROSERVICE_TIMEOUT",
        default_value = "30s",
        value_parser = humantime::parse_duration
    )]
    pub timeout: Duration,

    /// Service identifier in responses
    #[arg(short, long, env = "MICROSERVICE_SERVICE_NAME", default_value = DEFAULT_SERVICE_NAME)]
    pub service_name: String,

    /// Log level (debug, info, warn, error)
    #[arg(short = 'l', long, env = "MICROSERVICE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format (json, text)
    #[arg(short = 'f', long, env = "MICROSERVICE_LOG_FORMAT", default_value = "json")]
    pub log_format: String,

    /// Log all request and response headers with sensitive data redaction
    #[arg(long, env = "MICROSERVICE_LOG_HEADERS")]
    pub log_headers: bool,

    /// TLS certificate (PEM); serves HTTPS together with --tls-key
    #[arg(long, env = "MICROSERVICE_TLS_CERT")]
    pub tls_cert: Option<PathBuf>,

    /// TLS private key (PEM)
    #[arg(long, env = "MICROSERVICE_TLS_KEY")]
    pub tls_key: Option<PathBuf>,

    /// Skip certificate verification when forwarding to https:// hops
    #[arg(long, env = "MICROSERVICE_UPSTREAM_TLS_INSECURE")]
    pub upstream_tls_insecure: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            log_level: LogLevel::Info.as_str().to_string(),
            log_format: LogFormat::Json.as_str().to_string(),
            log_headers: false,
            tls_cert: None,
            tls_key: None,
            upstream_tls_insecure: false,
        }
    }
}

impl ServeConfig {
    /// Check every setting before anything is started.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=65535).contains(&self.port) {
            return Err(ConfigError::InvalidPort(self.port));
        }
        self.log_level()?;
        self.log_format()?;

        if let Some((cert, key)) = self.tls_files()? {
            if !cert.exists() {
                return Err(ConfigError::CertificateNotFound(cert.to_path_buf()));
            }
            if !key.exists() {
                return Err(ConfigError::KeyNotFound(key.to_path_buf()));
            }
        }
        Ok(())
    }

    pub fn log_level(&self) -> Result<LogLevel, ConfigError> {
        self.log_level.parse()
    }

    pub fn log_format(&self) -> Result<LogFormat, ConfigError> {
        self.log_format.parse()
    }

    /// Certificate and key paths, when the node serves HTTPS.
    pub fn tls_files(&self) -> Result<Option<(&Path, &Path)>, ConfigError> {
        match (&self.tls_cert, &self.tls_key) {
            (Some(cert), Some(key)) => Ok(Some((cert.as_path(), key.as_path()))),
            (None, None) => Ok(None),
            _ => Err(ConfigError::IncompleteTls),
        }
    }
}
