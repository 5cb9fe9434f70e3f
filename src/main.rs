//! CLI entry point for the reposter tool.

use anyhow::{Context, Result};
use clap::Parser;
use reposter_core::{
    AppConfig, Database, FetchClient, Ingestor, Publisher, RecordStore, VkClient,
    build_default_registry,
};
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    if args.nothing_to_do() {
        info!("Nothing to do. Pass -d to download sources and/or -p to publish.");
        return Ok(());
    }

    let config = AppConfig::load(&args.config)
        .with_context(|| format!("loading config from {}", args.config.display()))?;
    debug!(?config, "configuration loaded");

    let db = Database::new(&config.database.path)
        .await
        .with_context(|| format!("opening database {}", config.database.path.display()))?;

    // The pool is closed on every path so SQLite checkpoints its WAL.
    let outcome = run(&args, &config, RecordStore::new(db.clone())).await;
    db.close().await;
    outcome
}

async fn run(args: &Args, config: &AppConfig, store: RecordStore) -> Result<()> {
    if args.download {
        let client = FetchClient::new().context("building HTTP client")?;
        let registry = build_default_registry(client, &config.sources)?;
        let stats = Ingestor::new(store.clone(), registry)
            .ingest_file(&args.sources)
            .await?;
        info!(
            records = stats.records_created,
            files = stats.files_downloaded,
            "Download complete"
        );
    }

    if args.post {
        let client = VkClient::new(config.posting.clone()).context("configuring VK client")?;
        let stats = Publisher::new(store, client).run().await?;
        info!(
            records = stats.records_posted,
            attachments = stats.attachments_uploaded,
            "Publishing complete"
        );
    }

    Ok(())
}
