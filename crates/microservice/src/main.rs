use anyhow::Context;
use clap::{CommandFactory, Parser};
use microservice::config::{init_tracing, Cli, Command, ServeConfig};
use microservice::proxy::NodeServer;
use microservice::version;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    if cli.version {
        print!("{}", version::report());
        return Ok(());
    }

    match cli.command {
        Some(Command::Serve(config)) => serve(config).await,
        Some(Command::Version) => {
            print!("{}", version::report());
            Ok(())
        }
        None => {
            Cli::command().print_help().context("Failed to print help")?;
            Ok(())
        }
    }
}

async fn serve(config: ServeConfig) -> Result<(), anyhow::Error> {
    config.validate()?;
    init_tracing(config.log_level()?, config.log_format()?)?;

    info!(
        service = %config.service_name,
        port = config.port,
        timeout = %humantime::format_duration(config.timeout),
        log_level = %config.log_level,
        log_format = %config.log_format,
        log_headers = config.log_headers,
        tls = config.tls_cert.is_some(),
        version = version::VERSION,
        "Starting microservice"
    );

    let server = NodeServer::bind(&config).await?;

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            Ok(())
        }
    }
}
