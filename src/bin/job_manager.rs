use anyhow::Result;
use clap::Parser;
use vieclam::job_cli::{handle_job_command, JobCli};
use vieclam::EnvironmentConfig;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().without_time().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vieclam=info")))
        .init();

    let cli = JobCli::parse();
    let config = EnvironmentConfig::load()?;
    handle_job_command(cli, config).await
}
