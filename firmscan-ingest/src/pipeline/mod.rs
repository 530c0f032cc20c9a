//! Pipeline orchestration
//!
//! Drives the full flow: resolve a source adapter, run its fetch strategy
//! across the configured dimensions, normalize the raw listings, then
//! deduplicate across sources and hand the batch to the store
//! collaborator. Failures never cross between sources; the result is
//! always best effort, with per-unit failures carried in the reports.

use crate::dedup::{DeduplicationEngine, DeduplicationResult};
use crate::error::FetchError;
use crate::fetch::{strategy_for, FetchContext, NoProxy, Pacer, ProxyProvider};
use crate::models::CompanyRecord;
use crate::normalize::{self, CountryProfile};
use crate::sources::{DimensionOverrides, SourceRegistry};
use async_trait::async_trait;
use firmscan_common::config::Settings;
use firmscan_common::{Country, Error, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Sources scraped by the background cycle when none are configured
pub const DEFAULT_CYCLE_SOURCES: &[&str] = &["pagine_gialle", "anis"];

/// Caller options for one source run
#[derive(Debug, Clone, Default)]
pub struct ScrapeOptions {
    /// City focus; empty keeps the configured/source defaults
    pub cities: Vec<String>,
    /// Region or county focus; empty keeps the configured/source defaults
    pub regions: Vec<String>,
    /// Pagination bound override
    pub max_pages: Option<u32>,
    /// Expected country; a mismatch with the source is rejected
    pub country: Option<Country>,
}

/// One unit of work that failed after retries
#[derive(Debug, Clone, Serialize)]
pub struct UnitFailure {
    pub unit: String,
    pub reason: String,
}

/// Result of one source run: normalized records plus per-unit status
#[derive(Debug)]
pub struct SourceReport {
    pub source: String,
    pub records: Vec<CompanyRecord>,
    pub units_attempted: usize,
    pub failed_units: Vec<UnitFailure>,
}

impl SourceReport {
    /// Mean data quality of the returned records, 0.0 for an empty run
    pub fn mean_quality(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let total: u32 = self
            .records
            .iter()
            .map(|r| r.data_quality_score as u32)
            .sum();
        total as f64 / self.records.len() as f64
    }
}

/// Per-source counters kept in a run summary
#[derive(Debug, Clone, Serialize)]
pub struct SourceStats {
    pub source: String,
    pub records: usize,
    pub units_attempted: usize,
    pub failed_units: usize,
    pub mean_quality: f64,
}

/// A source that produced nothing because its scrape failed outright
#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub reason: String,
}

/// Aggregate outcome of a multi-source run
#[derive(Debug)]
pub struct RunSummary {
    pub sources: Vec<SourceStats>,
    pub failed_sources: Vec<SourceFailure>,
    /// Record count before deduplication
    pub original: usize,
    /// Duplicate clusters merged away
    pub duplicate_clusters: usize,
    pub companies: Vec<CompanyRecord>,
}

/// Outcome of one background scrape cycle
#[derive(Debug)]
pub struct CycleReport {
    pub summary: RunSummary,
    pub stored: usize,
}

/// Progress events emitted while a pipeline runs
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    SourceStarted {
        source: String,
    },
    UnitCompleted {
        source: String,
        unit: String,
        listings: usize,
        failed: bool,
    },
    SourceCompleted {
        source: String,
        records: usize,
        failed_units: usize,
    },
    SourceFailed {
        source: String,
        reason: String,
    },
    DeduplicationCompleted {
        original: usize,
        duplicates: usize,
        merged: usize,
    },
    CycleCompleted {
        companies: usize,
        stored: usize,
    },
}

/// Job progress update pushed to the queue collaborator
#[derive(Debug, Clone, Serialize)]
pub struct ProgressUpdate {
    pub progress_percent: u8,
    pub companies_found: usize,
    pub message: String,
}

/// Idempotent persistence upsert, implemented by an external collaborator.
///
/// The natural key (tax id + country, or a derived slug) and conflict
/// handling belong entirely to the implementor; the pipeline never assumes
/// exclusive write access.
#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn upsert_companies(&self, companies: &[CompanyRecord]) -> anyhow::Result<usize>;
}

/// Job-keyed progress updates, implemented by the queue collaborator
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn update(&self, job_id: Uuid, update: ProgressUpdate);
}

/// Store stand-in that only logs what would be persisted.
///
/// Used by the service binary until it is wired to a real persistence
/// collaborator.
pub struct LoggingStore;

#[async_trait]
impl CompanyStore for LoggingStore {
    async fn upsert_companies(&self, companies: &[CompanyRecord]) -> anyhow::Result<usize> {
        info!(companies = companies.len(), "Store collaborator not wired; discarding batch");
        Ok(companies.len())
    }
}

/// Orchestrates scraping, normalization, and deduplication.
///
/// Holds no per-run state: every run builds its own HTTP client or browser
/// session, so concurrent runs from the background scraper and on-demand
/// jobs do not interfere.
pub struct PipelineRunner {
    registry: SourceRegistry,
    settings: Settings,
    proxies: Arc<dyn ProxyProvider>,
    dedup: DeduplicationEngine,
    event_tx: Option<mpsc::Sender<PipelineEvent>>,
}

impl PipelineRunner {
    pub fn new(registry: SourceRegistry, settings: Settings) -> Self {
        Self {
            registry,
            settings,
            proxies: Arc::new(NoProxy),
            dedup: DeduplicationEngine::new(),
            event_tx: None,
        }
    }

    /// Use a proxy-selection collaborator
    pub fn with_proxies(mut self, proxies: Arc<dyn ProxyProvider>) -> Self {
        self.proxies = proxies;
        self
    }

    /// Emit progress events to a channel
    pub fn with_events(mut self, event_tx: mpsc::Sender<PipelineEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    async fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event).await;
        }
    }

    fn effective_overrides(&self, country: Country, options: &ScrapeOptions) -> DimensionOverrides {
        let focus = match country {
            Country::Italy => &self.settings.italy,
            Country::Romania => &self.settings.romania,
        };
        DimensionOverrides {
            cities: if options.cities.is_empty() {
                focus.cities.clone()
            } else {
                options.cities.clone()
            },
            regions: if options.regions.is_empty() {
                focus.regions.clone()
            } else {
                options.regions.clone()
            },
            max_pages: options.max_pages,
        }
    }

    /// Run one source end to end: fetch across its dimensions and return
    /// normalized (not yet deduplicated) records.
    ///
    /// An unknown source id is a configuration error and fails fast. Unit
    /// failures inside the source are carried in the report, not raised.
    pub async fn run_source(
        &self,
        source_id: &str,
        options: &ScrapeOptions,
        cancel: &CancellationToken,
    ) -> Result<SourceReport> {
        let adapter = self.registry.get(source_id)?;
        if let Some(country) = options.country {
            if country != adapter.country {
                return Err(Error::InvalidInput(format!(
                    "source '{source_id}' covers {}, not {country}",
                    adapter.country
                )));
            }
        }

        let profile = CountryProfile::for_country(adapter.country);
        let pacer = Pacer::per_minute(self.settings.scraping.requests_per_minute);
        let ctx = FetchContext {
            settings: &self.settings.scraping,
            pacer: &pacer,
            proxies: self.proxies.as_ref(),
            cancel,
            overrides: self.effective_overrides(adapter.country, options),
        };

        self.emit(PipelineEvent::SourceStarted {
            source: source_id.to_string(),
        })
        .await;

        let strategy = strategy_for(adapter.strategy);
        let outcome = match strategy.fetch(adapter, &ctx).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.emit(PipelineEvent::SourceFailed {
                    source: source_id.to_string(),
                    reason: err.to_string(),
                })
                .await;
                return Err(match err {
                    FetchError::Config(message) => Error::Config(message),
                    other => {
                        Error::Internal(format!("source '{source_id}' fetch failed: {other}"))
                    }
                });
            }
        };

        let units_attempted = outcome.units.len();
        let mut failed_units = Vec::new();
        let mut records = Vec::new();
        let mut below_threshold = 0usize;

        for unit in &outcome.units {
            self.emit(PipelineEvent::UnitCompleted {
                source: source_id.to_string(),
                unit: unit.unit.clone(),
                listings: unit.listings.len(),
                failed: !unit.succeeded(),
            })
            .await;

            if let Some(reason) = &unit.failure {
                failed_units.push(UnitFailure {
                    unit: unit.unit.clone(),
                    reason: reason.clone(),
                });
            }
            for listing in &unit.listings {
                if let Some(record) = normalize::normalize(listing, profile) {
                    if record.data_quality_score < self.settings.quality.min_score {
                        below_threshold += 1;
                    }
                    records.push(record);
                }
            }
        }

        if below_threshold > 0 {
            debug!(
                source = source_id,
                below_threshold,
                min_score = self.settings.quality.min_score,
                "Records below the quality threshold"
            );
        }
        info!(
            source = source_id,
            records = records.len(),
            units_attempted,
            failed_units = failed_units.len(),
            "Source run complete"
        );
        self.emit(PipelineEvent::SourceCompleted {
            source: source_id.to_string(),
            records: records.len(),
            failed_units: failed_units.len(),
        })
        .await;

        Ok(SourceReport {
            source: source_id.to_string(),
            records,
            units_attempted,
            failed_units,
        })
    }

    /// Pure batch deduplication; no I/O
    pub fn deduplicate(&self, records: Vec<CompanyRecord>) -> DeduplicationResult {
        self.dedup.process(records)
    }

    /// Run several sources, concatenate their records, and deduplicate.
    ///
    /// Unknown ids fail fast before any scraping starts; a source whose
    /// scrape fails at runtime is recorded with zero records and the
    /// remaining sources continue.
    pub async fn run_sources(
        &self,
        source_ids: &[String],
        options: &ScrapeOptions,
        cancel: &CancellationToken,
    ) -> Result<RunSummary> {
        self.run_with_progress(source_ids, options, cancel, None)
            .await
    }

    /// `run_sources` with progress updates pushed to the job collaborator
    pub async fn run_job(
        &self,
        job_id: Uuid,
        progress: &dyn ProgressSink,
        source_ids: &[String],
        options: &ScrapeOptions,
        cancel: &CancellationToken,
    ) -> Result<RunSummary> {
        self.run_with_progress(source_ids, options, cancel, Some((job_id, progress)))
            .await
    }

    async fn run_with_progress(
        &self,
        source_ids: &[String],
        options: &ScrapeOptions,
        cancel: &CancellationToken,
        progress: Option<(Uuid, &dyn ProgressSink)>,
    ) -> Result<RunSummary> {
        // Unknown ids are configuration errors; surface them before work starts
        for id in source_ids {
            self.registry.get(id)?;
        }

        if let Some((job_id, sink)) = progress {
            sink.update(
                job_id,
                ProgressUpdate {
                    progress_percent: 0,
                    companies_found: 0,
                    message: format!("starting {} sources", source_ids.len()),
                },
            )
            .await;
        }

        let total_sources = source_ids.len().max(1);
        let mut sources = Vec::new();
        let mut failed_sources = Vec::new();
        let mut all_records = Vec::new();

        for (index, id) in source_ids.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("Run cancelled, skipping remaining sources");
                break;
            }
            match self.run_source(id, options, cancel).await {
                Ok(report) => {
                    sources.push(SourceStats {
                        source: report.source.clone(),
                        records: report.records.len(),
                        units_attempted: report.units_attempted,
                        failed_units: report.failed_units.len(),
                        mean_quality: report.mean_quality(),
                    });
                    all_records.extend(report.records);
                }
                Err(err) => {
                    error!(
                        source = %id,
                        error = %err,
                        "Source failed, continuing with remaining sources"
                    );
                    failed_sources.push(SourceFailure {
                        source: id.clone(),
                        reason: err.to_string(),
                    });
                }
            }

            if let Some((job_id, sink)) = progress {
                // Scraping advances progress to 90%; the rest is dedup + handoff
                let percent = (((index + 1) * 90) / total_sources) as u8;
                sink.update(
                    job_id,
                    ProgressUpdate {
                        progress_percent: percent,
                        companies_found: all_records.len(),
                        message: format!("scraped {id}"),
                    },
                )
                .await;
            }
        }

        let original = all_records.len();
        let (duplicate_clusters, companies) = if self.settings.quality.auto_deduplication {
            let result = self.dedup.process(all_records);
            self.emit(PipelineEvent::DeduplicationCompleted {
                original: result.original,
                duplicates: result.duplicates,
                merged: result.merged,
            })
            .await;
            (result.duplicates, result.companies)
        } else {
            (0, all_records)
        };

        if let Some((job_id, sink)) = progress {
            sink.update(
                job_id,
                ProgressUpdate {
                    progress_percent: 100,
                    companies_found: companies.len(),
                    message: "complete".to_string(),
                },
            )
            .await;
        }

        Ok(RunSummary {
            sources,
            failed_sources,
            original,
            duplicate_clusters,
            companies,
        })
    }

    /// One background cycle: scrape the default sources, deduplicate, and
    /// hand the batch to the store collaborator.
    pub async fn run_cycle(
        &self,
        store: &dyn CompanyStore,
        cancel: &CancellationToken,
    ) -> Result<CycleReport> {
        let source_ids: Vec<String> = DEFAULT_CYCLE_SOURCES
            .iter()
            .map(|id| id.to_string())
            .collect();
        info!(sources = ?source_ids, "Starting scrape cycle");

        let summary = self.run_sources(&source_ids, &ScrapeOptions::default(), cancel).await?;

        let stored = if summary.companies.is_empty() {
            0
        } else {
            store
                .upsert_companies(&summary.companies)
                .await
                .map_err(|e| Error::Internal(format!("store upsert failed: {e}")))?
        };

        info!(
            companies = summary.companies.len(),
            stored,
            failed_sources = summary.failed_sources.len(),
            "Scrape cycle completed"
        );
        self.emit(PipelineEvent::CycleCompleted {
            companies: summary.companies.len(),
            stored,
        })
        .await;

        Ok(CycleReport { summary, stored })
    }
}

/// Background scraper: runs a cycle immediately, then repeats on the
/// configured interval until stopped.
pub struct AutoScraper {
    runner: Arc<PipelineRunner>,
    store: Arc<dyn CompanyStore>,
    interval: Duration,
    cancel: CancellationToken,
}

impl AutoScraper {
    pub fn new(
        runner: Arc<PipelineRunner>,
        store: Arc<dyn CompanyStore>,
        interval: Duration,
    ) -> Self {
        Self {
            runner,
            store,
            interval,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops the scraper; in-flight network calls finish on
    /// their own timeouts rather than being interrupted
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run cycles until cancelled
    pub async fn run(&self) {
        info!(interval_secs = self.interval.as_secs(), "Auto-scrape service started");
        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            match self.runner.run_cycle(self.store.as_ref(), &self.cancel).await {
                Ok(report) => info!(
                    companies = report.summary.companies.len(),
                    stored = report.stored,
                    "Auto-scrape cycle finished"
                ),
                Err(err) => error!(error = %err, "Auto-scrape cycle failed"),
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        info!("Auto-scrape service stopped");
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}
