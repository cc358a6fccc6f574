//! Command line surface.

use super::ServeConfig;
use clap::{ArgAction, Parser, Subcommand};

/// A composable HTTP node for testing microservice topologies.
///
/// Requests are chained through nodes by their path, e.g.
/// `/proxy/b:8080/proxy/c:8080/fault/503/20`.
#[derive(Debug, Parser)]
#[command(name = "microservice", disable_version_flag = true, arg_required_else_help = true)]
pub struct Cli {
    /// Print version information
    #[arg(short = 'V', long, action = ArgAction::SetTrue)]
    pub version: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP node
    Serve(ServeConfig),
    /// Print version information
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn serve(args: &[&str]) -> ServeConfig {
        let mut argv = vec!["microservice", "serve"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Some(Command::Serve(config)) => config,
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn test_serve_defaults() {
        let config = serve(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.service_name, "proxy");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, "json");
        assert!(!config.log_headers);
        assert!(!config.upstream_tls_insecure);
        assert!(config.tls_cert.is_none());
    }

    #[test]
    fn test_short_flags() {
        let config = serve(&["-p", "9090", "-t", "1m", "-s", "frontend", "-l", "debug", "-f", "text"]);
        assert_eq!(config.port, 9090);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.service_name, "frontend");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, "text");
    }

    #[test]
    fn test_long_flags() {
        let config = serve(&[
            "--port",
            "8443",
            "--timeout",
            "500ms",
            "--log-headers",
            "--tls-cert",
            "cert.pem",
            "--tls-key",
            "key.pem",
            "--upstream-tls-insecure",
        ]);
        assert_eq!(config.port, 8443);
        assert_eq!(config.timeout, Duration::from_millis(500));
        assert!(config.log_headers);
        assert!(config.upstream_tls_insecure);
        assert!(config.tls_files().unwrap().is_some());
    }

    #[test]
    fn test_out_of_range_port_reaches_validation() {
        let config = serve(&["-p", "70000"]);
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "port must be between 1 and 65535, got 70000"
        );
    }

    #[test]
    fn test_malformed_timeout_is_rejected() {
        assert!(Cli::try_parse_from(["microservice", "serve", "-t", "soon"]).is_err());
    }

    #[test]
    fn test_version_forms() {
        let cli = Cli::try_parse_from(["microservice", "version"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Version)));

        let cli = Cli::try_parse_from(["microservice", "--version"]).unwrap();
        assert!(cli.version);
        assert!(cli.command.is_none());
    }
}
