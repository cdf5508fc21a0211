//! Omnistat server binary

use clap::{Parser, Subcommand};
use omnistat::api::{serve, ApiConfig, AppState};
use omnistat::config::{generate_default_config, Config};
use omnistat::service::IndexingStatusService;
use omnistat::upstream::{HttpChainSource, UpstreamConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "omnistat")]
#[command(about = "Omnichain indexing status aggregator", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the API host
    #[arg(long)]
    host: Option<String>,

    /// Override the API port
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a default configuration file to stdout
    GenerateConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Commands::GenerateConfig) = cli.command {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default()?,
    };

    if let Some(host) = cli.host {
        config.api.host = host;
    }
    if let Some(port) = cli.port {
        config.api.port = port;
    }

    init_logging(&config);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        chains = ?config.chains.ids,
        upstream = %config.upstream.url,
        "Starting omnistat"
    );

    let source = Arc::new(HttpChainSource::new(UpstreamConfig {
        base_url: config.upstream.url.clone(),
        request_timeout_ms: config.upstream.request_timeout_ms,
    }));

    let status = Arc::new(IndexingStatusService::new(
        source,
        config.chains.ids.iter().copied().collect(),
        config.cache.to_swr_config(),
    ));

    let revalidation = status.start_revalidation();
    if revalidation.is_some() {
        tracing::info!(
            interval_secs = config.cache.proactive_revalidation_interval_secs,
            "Proactive revalidation enabled"
        );
    }

    let api_config = ApiConfig {
        host: config.api.host.clone(),
        port: config.api.port,
        max_realtime_distance_secs: config.gate.max_realtime_distance_secs,
    };

    serve(AppState::new(status, api_config.clone()), &api_config).await?;

    if let Some(handle) = revalidation {
        handle.stop();
    }

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "omnistat={},tower_http=debug",
            config.logging.level
        ))
    });

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
