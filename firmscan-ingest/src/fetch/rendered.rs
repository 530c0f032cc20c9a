//! Rendered-page strategy
//!
//! Client-rendered sources need a real browser: navigate with a cascade of
//! wait strategies, wait for a listing selector (with fallbacks), scroll
//! until lazy-loaded content stops arriving, then extract from the
//! serialized DOM with the same selector machinery as the static strategy.
//!
//! One browser session is launched per source fetch and closed on every
//! exit path; a session that fails to launch aborts the source (the
//! pipeline records zero records and moves on to other sources).

use super::extract::extract_listings;
use super::{FetchContext, FetchOutcome, FetchStrategy, UnitReport};
use crate::error::FetchError;
use crate::models::RawListing;
use crate::sources::{Dimension, SourceAdapter};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use firmscan_common::Country;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Delay between scroll steps while waiting for lazy content
const SCROLL_DELAY_MS: u64 = 1000;

/// Container selectors tried when none of the adapter's wait selectors appear
const FALLBACK_LISTING_SELECTORS: &[&str] =
    &[".company", ".vcard", ".listing-item", ".result", ".item"];

/// Rendered fetch strategy
pub struct RenderedFetcher;

#[async_trait]
impl FetchStrategy for RenderedFetcher {
    async fn fetch(
        &self,
        adapter: &SourceAdapter,
        ctx: &FetchContext<'_>,
    ) -> Result<FetchOutcome, FetchError> {
        let session = BrowserSession::launch(ctx, adapter.country).await?;
        let result = scrape_source(&session, adapter, ctx).await;
        session.close().await;
        result
    }
}

/// Headless browser session owned by one source fetch
struct BrowserSession {
    browser: Browser,
    handler_task: tokio::task::JoinHandle<()>,
}

impl BrowserSession {
    async fn launch(ctx: &FetchContext<'_>, country: Country) -> Result<Self, FetchError> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--no-first-run")
            .arg("--no-zygote");

        if let Ok(path) = std::env::var("FIRMSCAN_CHROME_PATH") {
            builder = builder.chrome_executable(path);
        }
        if !ctx.settings.headless {
            builder = builder.with_head();
        }
        if let Some(proxy) = ctx.proxies.proxy_for(country) {
            info!(country = %country, proxy = %proxy.url, "Using proxy for browser session");
            builder = builder.arg(format!("--proxy-server={}", proxy.url));
        }

        let config = builder
            .build()
            .map_err(|e| FetchError::Browser(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Browser(format!("failed to launch browser: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        debug!("Browser session launched");
        Ok(Self {
            browser,
            handler_task,
        })
    }

    async fn close(mut self) {
        if let Err(err) = self.browser.close().await {
            debug!(error = %err, "Browser close reported an error");
        }
        self.handler_task.abort();
    }
}

async fn scrape_source(
    session: &BrowserSession,
    adapter: &SourceAdapter,
    ctx: &FetchContext<'_>,
) -> Result<FetchOutcome, FetchError> {
    let dimensions = adapter.dimensions.expand(&ctx.overrides);
    info!(
        source = adapter.id,
        dimensions = dimensions.len(),
        "Starting rendered scrape"
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

        let unit = scrape_dimension(session, adapter, ctx, dimension).await;
        if let Some(reason) = &unit.failure {
            warn!(
                source = adapter.id,
                unit = %unit.unit,
                reason = %reason,
                "Unit failed, continuing with next"
            );
        }
        units.push(unit);
    }

    Ok(FetchOutcome { units })
}

async fn scrape_dimension(
    session: &BrowserSession,
    adapter: &SourceAdapter,
    ctx: &FetchContext<'_>,
    dimension: &Dimension,
) -> UnitReport {
    let url = adapter.search_url(dimension);
    let page = match session.browser.new_page("about:blank").await {
        Ok(page) => page,
        Err(err) => {
            return UnitReport {
                unit: dimension.label.clone(),
                listings: Vec::new(),
                pages_fetched: 0,
                failure: Some(format!("failed to open page: {err}")),
            };
        }
    };

    let result = scrape_page(&page, adapter, ctx, &url).await;
    let _ = page.close().await;

    match result {
        Ok(listings) => UnitReport {
            unit: dimension.label.clone(),
            listings,
            pages_fetched: 1,
            failure: None,
        },
        Err(err) => UnitReport {
            unit: dimension.label.clone(),
            listings: Vec::new(),
            pages_fetched: 0,
            failure: Some(err.to_string()),
        },
    }
}

async fn scrape_page(
    page: &Page,
    adapter: &SourceAdapter,
    ctx: &FetchContext<'_>,
    url: &str,
) -> Result<Vec<RawListing>, FetchError> {
    ctx.pacer.until_ready().await;
    navigate(page, url).await?;

    if !wait_for_listing(page, adapter).await {
        warn!(source = adapter.id, url, "No listing elements appeared on page");
        return Ok(Vec::new());
    }

    scroll_to_stable(page).await;

    let html: String = evaluate(page, "document.documentElement.outerHTML").await?;
    extract_listings(&html, adapter, url)
}

/// Navigate with cascading wait strategies, each with its own timeout:
/// document ready, then the load event, then a readiness poll standing in
/// for network idle. The first that succeeds wins.
async fn navigate(page: &Page, url: &str) -> Result<(), FetchError> {
    match tokio::time::timeout(Duration::from_secs(15), page.goto(url)).await {
        Ok(Ok(_)) => {
            debug!(url, strategy = "document ready", "Navigation complete");
            return Ok(());
        }
        Ok(Err(err)) => {
            warn!(url, error = %err, "Direct navigation failed, waiting for load event");
        }
        Err(_) => {
            warn!(url, "Direct navigation timed out, waiting for load event");
        }
    }

    if let Ok(Ok(_)) =
        tokio::time::timeout(Duration::from_secs(20), page.wait_for_navigation()).await
    {
        debug!(url, strategy = "load event", "Navigation complete");
        return Ok(());
    }

    let deadline = Instant::now() + Duration::from_secs(25);
    while Instant::now() < deadline {
        if let Ok(Ok(state)) = tokio::time::timeout(
            Duration::from_secs(2),
            evaluate::<String>(page, "document.readyState"),
        )
        .await
        {
            if state == "complete" {
                debug!(url, strategy = "readiness poll", "Navigation complete");
                return Ok(());
            }
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    Err(FetchError::Browser(format!(
        "all navigation wait strategies failed for {url}"
    )))
}

/// Wait for one of the adapter's listing selectors; the primary gets the
/// long timeout, alternatives and the generic fallbacks a short one.
async fn wait_for_listing(page: &Page, adapter: &SourceAdapter) -> bool {
    let mut candidates = adapter.wait_selectors.iter().copied();
    if let Some(primary) = candidates.next() {
        if wait_for_selector(page, primary, Duration::from_secs(10)).await {
            return true;
        }
        debug!(
            source = adapter.id,
            selector = primary,
            "Primary selector absent, trying alternatives"
        );
    }
    for selector in candidates.chain(FALLBACK_LISTING_SELECTORS.iter().copied()) {
        if wait_for_selector(page, selector, Duration::from_secs(2)).await {
            return true;
        }
    }
    false
}

async fn wait_for_selector(page: &Page, selector: &str, timeout: Duration) -> bool {
    let script = format!("document.querySelector({selector:?}) !== null");
    let deadline = Instant::now() + timeout;
    loop {
        if let Ok(true) = evaluate::<bool>(page, &script).await {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

/// Scroll to the bottom until the page height stops growing, triggering
/// lazy-loaded listings
async fn scroll_to_stable(page: &Page) {
    let mut previous = -1.0_f64;
    loop {
        let current = match evaluate::<f64>(page, "document.body.scrollHeight").await {
            Ok(height) => height,
            Err(_) => break,
        };
        if current <= previous {
            break;
        }
        previous = current;
        if evaluate::<f64>(page, "window.scrollTo(0, document.body.scrollHeight); 0")
            .await
            .is_err()
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(SCROLL_DELAY_MS)).await;
    }
}

async fn evaluate<T: DeserializeOwned>(page: &Page, script: &str) -> Result<T, FetchError> {
    let result = page
        .evaluate(script)
        .await
        .map_err(|e| FetchError::Browser(format!("JS evaluation failed: {e}")))?;
    result
        .into_value::<T>()
        .map_err(|e| FetchError::Browser(format!("failed to convert JS result: {e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{NoProxy, Pacer};
    use crate::sources::{DimensionOverrides, SourceRegistry};
    use firmscan_common::config::ScrapingSettings;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    #[ignore] // Requires a local Chromium installation
    async fn test_rendered_scrape_of_inline_page() {
        let settings = ScrapingSettings::default();
        let pacer = Pacer::per_minute(600);
        let cancel = CancellationToken::new();
        let ctx = FetchContext {
            settings: &settings,
            pacer: &pacer,
            proxies: &NoProxy,
            cancel: &cancel,
            overrides: DimensionOverrides::default(),
        };

        let session = BrowserSession::launch(&ctx, Country::Romania)
            .await
            .expect("browser should launch");
        let page = session
            .browser
            .new_page("data:text/html,<div class=\"member-item\"><h3>Beta SRL</h3></div>")
            .await
            .expect("page should open");

        let registry = SourceRegistry::with_known_sources();
        let adapter = registry.get("anis").unwrap();
        assert!(wait_for_listing(&page, adapter).await);

        let html: String = evaluate(&page, "document.documentElement.outerHTML")
            .await
            .expect("outerHTML should serialize");
        let listings = extract_listings(&html, adapter, "data:page").unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].company_name.as_deref(), Some("Beta SRL"));

        let _ = page.close().await;
        session.close().await;
    }
}
