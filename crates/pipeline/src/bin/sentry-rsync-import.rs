//! sentry-rsync-import — pulls Sentry event files from rsync sources and
//! submits them to the store API.
//!
//! Runs until SIGINT/SIGTERM, then drains the import side before the
//! submission side. Exits non-zero if draining exceeds the deadline.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use sentry_import_core::config::load_dotenv;
use sentry_import_core::Config;
use sentry_import_pipeline::job::jobs_from_config;
use sentry_import_pipeline::shutdown::wait_for_signal;
use sentry_import_pipeline::{Pipeline, PipelineSettings, RsyncSyncer, Submitter};

// ── CLI ─────────────────────────────────────────────────────────────

/// Periodically rsync Sentry event files and submit them to Sentry.
#[derive(Parser, Debug)]
#[command(name = "sentry-rsync-import", version, about)]
struct Cli {
    /// Path to the config file (`.json`, otherwise TOML).
    #[arg(long, env = "SENTRY_IMPORT_CONFIG", default_value = "./sentry-rsync-import.json")]
    config: PathBuf,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();

    let config = Config::from_file(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;
    config.log_summary();

    let jobs = jobs_from_config(&config).context("failed to create cache directories")?;
    let settings = PipelineSettings::from_config(&config);
    let submitter = Arc::new(Submitter::new(settings.submit_timeout)?);
    let syncer = Arc::new(RsyncSyncer::new(config.rsync_path.clone()));

    let pipeline = Pipeline::start(jobs, settings, syncer, submitter);

    let signal = wait_for_signal().await?;
    info!(signal, "received signal, shutting down");

    if let Err(e) = pipeline.shutdown().await {
        error!(error = %e, "stopping queues took too long, exiting now");
        std::process::exit(1);
    }

    info!("sentry-rsync-import exited cleanly");
    Ok(())
}
