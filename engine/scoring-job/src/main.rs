use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use scoring_job::{initialize_logging, Cli, JobConfig, ScoringJob};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Load configuration
    let config =
        JobConfig::load(cli.secrets.as_deref()).context("Failed to load configuration")?;
    initialize_logging(&config.logging)?;

    info!("Starting scoring job v{}", env!("CARGO_PKG_VERSION"));

    let job = ScoringJob::connect(config)
        .await
        .context("Failed to initialize scoring job")?;
    let summary = job
        .run(cli.week.as_deref(), Utc::now())
        .await
        .context("Scoring run failed")?;

    info!(
        targets = summary.targets,
        fetched = summary.fetched,
        scores_written = summary.scores_written,
        "Done"
    );

    Ok(())
}
