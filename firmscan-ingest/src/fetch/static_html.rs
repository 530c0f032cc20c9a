//! Static HTML strategy
//!
//! One HTTP GET per paginated search URL, CSS extraction per listing
//! element. Pagination stops when a page yields zero listings or the
//! max-page bound is reached; a fixed delay separates pages to respect
//! source rate limits.

use super::extract::extract_listings;
use super::{build_client, retry, FetchContext, FetchOutcome, FetchStrategy, UnitReport};
use crate::error::FetchError;
use crate::sources::{Dimension, SourceAdapter};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Static fetch strategy
pub struct StaticFetcher;

#[async_trait]
impl FetchStrategy for StaticFetcher {
    async fn fetch(
        &self,
        adapter: &SourceAdapter,
        ctx: &FetchContext<'_>,
    ) -> Result<FetchOutcome, FetchError> {
        let client = build_client(ctx, adapter.country)?;
        let dimensions = adapter.dimensions.expand(&ctx.overrides);
        info!(
            source = adapter.id,
            dimensions = dimensions.len(),
            "Starting static scrape"
        );

        let mut units = Vec::new();
        for (index, dimension) in dimensions.iter().enumerate() {
            if ctx.cancel.is_cancelled() {
                info!(source = adapter.id, "Scrape cancelled, stopping dimension iteration");
                break;
            }
            if index > 0 {
                tokio::time::sleep(ctx.dimension_delay()).await;
            }

            let unit = scrape_dimension(&client, adapter, ctx, dimension).await;
            match &unit.failure {
                None => debug!(
                    source = adapter.id,
                    unit = %unit.unit,
                    listings = unit.listings.len(),
                    pages = unit.pages_fetched,
                    "Unit complete"
                ),
                Some(reason) => warn!(
                    source = adapter.id,
                    unit = %unit.unit,
                    listings = unit.listings.len(),
                    reason = %reason,
                    "Unit failed, continuing with next"
                ),
            }
            units.push(unit);
        }

        let outcome = FetchOutcome { units };
        info!(
            source = adapter.id,
            listings = outcome.units.iter().map(|u| u.listings.len()).sum::<usize>(),
            failed_units = outcome.failed_units(),
            "Static scrape completed"
        );
        Ok(outcome)
    }
}

async fn scrape_dimension(
    client: &reqwest::Client,
    adapter: &SourceAdapter,
    ctx: &FetchContext<'_>,
    dimension: &Dimension,
) -> UnitReport {
    let search_url = adapter.search_url(dimension);
    let max_pages = ctx.overrides.max_pages.unwrap_or(adapter.max_pages);
    let mut listings = Vec::new();
    let mut pages_fetched = 0;

    for page in 1..=max_pages {
        if ctx.cancel.is_cancelled() {
            break;
        }
        if page > 1 {
            tokio::time::sleep(ctx.page_delay()).await;
        }

        let url = adapter.page_url(&search_url, page);
        let page_result = fetch_page(client, ctx, &url).await;
        let html = match page_result {
            Ok(html) => html,
            Err(err) => {
                return UnitReport {
                    unit: dimension.label.clone(),
                    listings,
                    pages_fetched,
                    failure: Some(err.to_string()),
                };
            }
        };

        pages_fetched += 1;
        let found = match extract_listings(&html, adapter, &url) {
            Ok(found) => found,
            Err(err) => {
                return UnitReport {
                    unit: dimension.label.clone(),
                    listings,
                    pages_fetched,
                    failure: Some(err.to_string()),
                };
            }
        };

        if found.is_empty() {
            debug!(source = adapter.id, page, "Page yielded no listings, stopping pagination");
            break;
        }
        listings.extend(found);
    }

    UnitReport {
        unit: dimension.label.clone(),
        listings,
        pages_fetched,
        failure: None,
    }
}

/// GET one page body with pacing and backoff
pub(crate) async fn fetch_page(
    client: &reqwest::Client,
    ctx: &FetchContext<'_>,
    url: &str,
) -> Result<String, FetchError> {
    retry::with_backoff(
        "page fetch",
        ctx.settings.max_retries,
        ctx.settings.retry_base_delay_ms,
        || async {
            ctx.pacer.until_ready().await;
            let response = client
                .get(url)
                .send()
                .await
                .map_err(FetchError::from_reqwest)?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }
            response.text().await.map_err(FetchError::from_reqwest)
        },
    )
    .await
}
