//! Fetch strategies
//!
//! Three ways to pull raw listings out of a source: `static_html` (plain
//! GET + CSS extraction), `rendered` (headless browser), and `api` (JSON
//! endpoint). All three share the per-unit failure policy: one failed
//! page/category/city is logged and skipped, sibling units keep going, and
//! partial results are kept. Only source-level problems (browser launch,
//! adapter misconfiguration) abort a source's fetch.

pub mod api;
pub mod extract;
pub mod pacer;
pub mod rendered;
pub mod retry;
pub mod static_html;

pub use pacer::Pacer;

use crate::error::FetchError;
use crate::models::RawListing;
use crate::sources::{DimensionOverrides, SourceAdapter, StrategyKind};
use async_trait::async_trait;
use firmscan_common::config::ScrapingSettings;
use firmscan_common::Country;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Proxy endpoint selected for a country
#[derive(Debug, Clone)]
pub struct ProxyEndpoint {
    /// Full proxy URL, scheme included (e.g. `socks5://host:port`)
    pub url: String,
}

/// Per-country proxy selection, consulted before building each client.
///
/// Implemented by an external collaborator; the default is no proxy.
pub trait ProxyProvider: Send + Sync {
    fn proxy_for(&self, country: Country) -> Option<ProxyEndpoint>;
}

/// Provider that never selects a proxy
pub struct NoProxy;

impl ProxyProvider for NoProxy {
    fn proxy_for(&self, _country: Country) -> Option<ProxyEndpoint> {
        None
    }
}

/// Everything a strategy needs for one source run.
///
/// Each run owns its own HTTP client / browser session; the context only
/// carries shared configuration and the run's cancellation token.
pub struct FetchContext<'a> {
    pub settings: &'a ScrapingSettings,
    pub pacer: &'a Pacer,
    pub proxies: &'a dyn ProxyProvider,
    pub cancel: &'a CancellationToken,
    pub overrides: DimensionOverrides,
}

impl<'a> FetchContext<'a> {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.settings.page_delay_ms)
    }

    pub fn dimension_delay(&self) -> Duration {
        Duration::from_millis(self.settings.dimension_delay_ms)
    }
}

/// Result of scraping one unit of work (one category x city, region, ...).
///
/// A unit can fail *and* carry records: pagination keeps what it collected
/// before the failing page.
#[derive(Debug)]
pub struct UnitReport {
    pub unit: String,
    pub listings: Vec<RawListing>,
    pub pages_fetched: u32,
    /// Failure reason after retries were exhausted, if any
    pub failure: Option<String>,
}

impl UnitReport {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// All unit results of one source fetch
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub units: Vec<UnitReport>,
}

impl FetchOutcome {
    /// Flatten every unit's listings, in fetch order
    pub fn into_listings(self) -> Vec<RawListing> {
        self.units
            .into_iter()
            .flat_map(|unit| unit.listings)
            .collect()
    }

    pub fn failed_units(&self) -> usize {
        self.units.iter().filter(|u| !u.succeeded()).count()
    }
}

/// One way of retrieving raw listing data from a source.
///
/// Implementations may partially fail (fewer records than expected) without
/// returning an error; `Err` is reserved for source-level failures such as
/// a browser that will not launch or a misconfigured adapter.
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    async fn fetch(
        &self,
        adapter: &SourceAdapter,
        ctx: &FetchContext<'_>,
    ) -> Result<FetchOutcome, FetchError>;
}

/// Strategy instance for an adapter's declared kind
pub fn strategy_for(kind: StrategyKind) -> Box<dyn FetchStrategy> {
    match kind {
        StrategyKind::Static => Box::new(static_html::StaticFetcher),
        StrategyKind::Rendered => Box::new(rendered::RenderedFetcher),
        StrategyKind::Api => Box::new(api::ApiFetcher),
    }
}

/// Build the HTTP client for one source run, applying the country proxy
/// when the provider selects one.
pub(crate) fn build_client(
    ctx: &FetchContext<'_>,
    country: Country,
) -> Result<reqwest::Client, FetchError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(ctx.settings.user_agent.clone())
        .timeout(Duration::from_secs(ctx.settings.request_timeout_secs));

    if let Some(endpoint) = ctx.proxies.proxy_for(country) {
        tracing::info!(country = %country, proxy = %endpoint.url, "Using proxy");
        let proxy = reqwest::Proxy::all(&endpoint.url)
            .map_err(|e| FetchError::Config(format!("invalid proxy url: {e}")))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| FetchError::Network(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(name: &str) -> RawListing {
        RawListing {
            company_name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_outcome_flattens_in_order() {
        let outcome = FetchOutcome {
            units: vec![
                UnitReport {
                    unit: "a".into(),
                    listings: vec![listing("one")],
                    pages_fetched: 1,
                    failure: None,
                },
                UnitReport {
                    unit: "b".into(),
                    listings: vec![listing("two"), listing("three")],
                    pages_fetched: 2,
                    failure: Some("HTTP 500".into()),
                },
            ],
        };
        assert_eq!(outcome.failed_units(), 1);
        let names: Vec<_> = outcome
            .into_listings()
            .into_iter()
            .filter_map(|l| l.company_name)
            .collect();
        assert_eq!(names, vec!["one", "two", "three"]);
    }
}
