//! firmscan-ingest - Company Directory Ingest Service
//!
//! Scrapes the configured national business registries and directory
//! sites on a fixed interval, normalizes and deduplicates the results,
//! and hands them to the persistence collaborator.

use anyhow::Result;
use firmscan_common::config::Settings;
use firmscan_ingest::pipeline::{AutoScraper, LoggingStore, PipelineRunner};
use firmscan_ingest::sources::SourceRegistry;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting firmscan-ingest");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::from_env();
    let registry = SourceRegistry::with_known_sources();
    info!(sources = ?registry.ids(), "Source registry initialized");

    let interval = Duration::from_secs(settings.auto_scrape_interval_secs);
    let runner = Arc::new(PipelineRunner::new(registry, settings));
    let store = Arc::new(LoggingStore);

    let scraper = AutoScraper::new(runner, store, interval);
    let cancel = scraper.cancel_token();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            cancel.cancel();
        }
    });

    scraper.run().await;
    Ok(())
}
