//! Configuration loading
//!
//! Settings resolve from environment variables (`FIRMSCAN_*`) with compiled
//! defaults, so the services start unconfigured in development and pick up
//! deployment overrides without a config file.

use std::str::FromStr;
use tracing::warn;

/// Network and pacing knobs for the fetch layer
#[derive(Debug, Clone)]
pub struct ScrapingSettings {
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// User agent sent on every HTTP request and browser session
    pub user_agent: String,
    /// Maximum attempts per network call before the unit is marked failed
    pub max_retries: u32,
    /// Base delay for exponential backoff between attempts, in milliseconds
    pub retry_base_delay_ms: u64,
    /// Delay between successive result pages of one search
    pub page_delay_ms: u64,
    /// Delay between dimension iterations (category x city, region, county)
    pub dimension_delay_ms: u64,
    /// Upper bound on outgoing requests per minute, per source run
    pub requests_per_minute: u32,
    /// Run browser sessions headless
    pub headless: bool,
}

impl Default for ScrapingSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"
                .to_string(),
            max_retries: 3,
            retry_base_delay_ms: 1000,
            page_delay_ms: 2000,
            dimension_delay_ms: 3000,
            requests_per_minute: 60,
            headless: true,
        }
    }
}

/// Data quality thresholds applied after normalization
#[derive(Debug, Clone)]
pub struct QualitySettings {
    /// Records scoring below this are still returned but flagged in logs
    pub min_score: u8,
    /// Run deduplication automatically at the end of multi-source runs
    pub auto_deduplication: bool,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            min_score: 50,
            auto_deduplication: true,
        }
    }
}

/// Per-country focus lists; empty means "use the source defaults"
#[derive(Debug, Clone, Default)]
pub struct CountryFocus {
    pub cities: Vec<String>,
    pub regions: Vec<String>,
}

/// Top-level service settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub scraping: ScrapingSettings,
    pub quality: QualitySettings,
    pub italy: CountryFocus,
    pub romania: CountryFocus,
    /// Interval between background scrape cycles, in seconds
    pub auto_scrape_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scraping: ScrapingSettings::default(),
            quality: QualitySettings::default(),
            italy: CountryFocus::default(),
            romania: CountryFocus::default(),
            auto_scrape_interval_secs: 6 * 60 * 60,
        }
    }
}

impl Settings {
    /// Load settings from the environment, falling back to defaults.
    ///
    /// Unparseable values are ignored with a warning rather than aborting
    /// startup; a missing variable silently keeps the default.
    pub fn from_env() -> Self {
        let mut settings = Settings::default();

        let s = &mut settings.scraping;
        env_parse("FIRMSCAN_REQUEST_TIMEOUT_SECS", &mut s.request_timeout_secs);
        env_string("FIRMSCAN_USER_AGENT", &mut s.user_agent);
        env_parse("FIRMSCAN_MAX_RETRIES", &mut s.max_retries);
        env_parse("FIRMSCAN_RETRY_BASE_DELAY_MS", &mut s.retry_base_delay_ms);
        env_parse("FIRMSCAN_PAGE_DELAY_MS", &mut s.page_delay_ms);
        env_parse("FIRMSCAN_DIMENSION_DELAY_MS", &mut s.dimension_delay_ms);
        env_parse("FIRMSCAN_REQUESTS_PER_MINUTE", &mut s.requests_per_minute);
        env_parse("FIRMSCAN_HEADLESS", &mut s.headless);

        env_parse("FIRMSCAN_MIN_QUALITY_SCORE", &mut settings.quality.min_score);
        env_parse(
            "FIRMSCAN_AUTO_DEDUPLICATION",
            &mut settings.quality.auto_deduplication,
        );

        env_list("FIRMSCAN_ITALY_FOCUS_CITIES", &mut settings.italy.cities);
        env_list("FIRMSCAN_ITALY_FOCUS_REGIONS", &mut settings.italy.regions);
        env_list("FIRMSCAN_ROMANIA_FOCUS_CITIES", &mut settings.romania.cities);
        env_list(
            "FIRMSCAN_ROMANIA_FOCUS_COUNTIES",
            &mut settings.romania.regions,
        );

        env_parse(
            "FIRMSCAN_AUTO_SCRAPE_INTERVAL_SECS",
            &mut settings.auto_scrape_interval_secs,
        );

        settings
    }
}

fn env_parse<T: FromStr>(name: &str, slot: &mut T) {
    if let Ok(raw) = std::env::var(name) {
        match raw.trim().parse::<T>() {
            Ok(value) => *slot = value,
            Err(_) => warn!(var = name, value = %raw, "Ignoring unparseable setting"),
        }
    }
}

fn env_string(name: &str, slot: &mut String) {
    if let Ok(raw) = std::env::var(name) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            *slot = trimmed.to_string();
        }
    }
}

fn env_list(name: &str, slot: &mut Vec<String>) {
    if let Ok(raw) = std::env::var(name) {
        let values: Vec<String> = raw
            .split(',')
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        if !values.is_empty() {
            *slot = values;
        }
    }
}
