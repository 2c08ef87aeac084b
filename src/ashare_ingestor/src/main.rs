use std::process::ExitCode;

use anyhow::Context;
use ashare_ingestor::{cli::Cli, config::Settings, pipeline::run_daily};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let mut settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    if cli.no_publish {
        settings.publish.enabled = false;
    }

    let report = run_daily(&settings, &cli.selected_datasets())
        .await
        .context("run aborted before processing datasets")?;

    let code = report.exit_code();
    info!(exit_code = code, all_fetched = report.all_fetched(), "run finished");
    Ok(code)
}
