use anyhow::{Context, Result};
use std::fs::OpenOptions;
use tracing::info;
use vieclam::{start_web_server, EnvironmentConfig};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = EnvironmentConfig::load()?;
    config.ensure_directories().await?;

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true) // Clear file on startup
        .open(&config.log_path)
        .with_context(|| format!("Failed to open log file {}", config.log_path.display()))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vieclam=info,rocket::server=off")),
        )
        .init();

    let port = match std::env::var("ROCKET_PORT") {
        Ok(value) => value
            .parse::<u16>()
            .map_err(|_| anyhow::anyhow!("ROCKET_PORT must be a valid port number"))?,
        Err(_) => 8000,
    };

    info!("Starting job discovery server");
    info!(
        "Environment: {}",
        std::env::var("ENVIRONMENT").unwrap_or_else(|_| "local".to_string())
    );
    info!("Server: http://0.0.0.0:{}", port);

    start_web_server(config, port).await
}
