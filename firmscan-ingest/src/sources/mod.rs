//! Source adapters and the registry
//!
//! A source is one external registry/directory site. Per-source behavior is
//! plain data: which fetch strategy to run, the base URL and search-path
//! template, CSS selectors, the dimensions to cross (category x city,
//! region, county), and pagination bounds. The registry is a value built
//! once at startup and passed into the pipeline; there is no global
//! scraper state.

pub mod italy;
pub mod romania;

use firmscan_common::{Country, Error, Result};
use std::collections::HashMap;
use url::form_urlencoded::byte_serialize;

/// Which fetch strategy a source requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Single HTTP GET per page, server-rendered markup
    Static,
    /// Headless browser session, client-rendered markup
    Rendered,
    /// JSON API endpoint
    Api,
}

/// CSS selectors for one source's listing markup.
///
/// `listing` selects the per-company container; the rest are evaluated
/// relative to it. Comma-separated alternatives are allowed anywhere.
#[derive(Debug, Clone, Copy)]
pub struct SelectorMap {
    pub listing: &'static str,
    pub company_name: &'static str,
    pub legal_name: Option<&'static str>,
    pub tax_id: Option<&'static str>,
    pub registration_number: Option<&'static str>,
    pub website: Option<&'static str>,
    pub email: Option<&'static str>,
    pub phone: Option<&'static str>,
    pub address: Option<&'static str>,
    pub city: Option<&'static str>,
    pub description: Option<&'static str>,
    pub industry: Option<&'static str>,
    pub legal_form: Option<&'static str>,
    pub registration_date: Option<&'static str>,
    pub share_capital: Option<&'static str>,
}

impl SelectorMap {
    /// Map with only the two required selectors set
    pub const fn minimal(listing: &'static str, company_name: &'static str) -> Self {
        Self {
            listing,
            company_name,
            legal_name: None,
            tax_id: None,
            registration_number: None,
            website: None,
            email: None,
            phone: None,
            address: None,
            city: None,
            description: None,
            industry: None,
            legal_form: None,
            registration_date: None,
            share_capital: None,
        }
    }
}

/// The enumerable search space of one source
#[derive(Debug, Clone, Copy)]
pub enum Dimensions {
    /// Cross product of category and city searches
    CategoryCity {
        categories: &'static [&'static str],
        cities: &'static [&'static str],
    },
    /// Category searches only (membership directories)
    Categories(&'static [&'static str]),
    /// One search per region
    Regions(&'static [&'static str]),
    /// One search per county
    Counties(&'static [&'static str]),
}

/// Caller overrides for the search space of one run
#[derive(Debug, Clone, Default)]
pub struct DimensionOverrides {
    pub cities: Vec<String>,
    pub regions: Vec<String>,
    pub max_pages: Option<u32>,
}

/// One concrete unit of the search space
#[derive(Debug, Clone)]
pub struct Dimension {
    pub label: String,
    pub category: Option<String>,
    pub place: Option<String>,
}

impl Dimensions {
    /// Expand into concrete dimensions, honoring caller overrides.
    ///
    /// Override lists replace the source defaults for the matching axis;
    /// `Counties` accept the `regions` override (one place axis per source).
    pub fn expand(&self, overrides: &DimensionOverrides) -> Vec<Dimension> {
        fn pick(defaults: &[&str], override_list: &[String]) -> Vec<String> {
            if override_list.is_empty() {
                defaults.iter().map(|v| v.to_string()).collect()
            } else {
                override_list.to_vec()
            }
        }

        match self {
            Dimensions::CategoryCity { categories, cities } => {
                let cities = pick(cities, &overrides.cities);
                categories
                    .iter()
                    .flat_map(|category| {
                        cities.iter().map(move |city| Dimension {
                            label: format!("{category} / {city}"),
                            category: Some(category.to_string()),
                            place: Some(city.clone()),
                        })
                    })
                    .collect()
            }
            Dimensions::Categories(categories) => categories
                .iter()
                .map(|category| Dimension {
                    label: category.to_string(),
                    category: Some(category.to_string()),
                    place: None,
                })
                .collect(),
            Dimensions::Regions(regions) => pick(regions, &overrides.regions)
                .into_iter()
                .map(|region| Dimension {
                    label: region.clone(),
                    category: None,
                    place: Some(region),
                })
                .collect(),
            Dimensions::Counties(counties) => pick(counties, &overrides.regions)
                .into_iter()
                .map(|county| Dimension {
                    label: county.clone(),
                    category: None,
                    place: Some(county),
                })
                .collect(),
        }
    }
}

/// Pre-fetch authentication shape for API sources
#[derive(Debug, Clone, Copy)]
pub struct ApiAuth {
    /// Token endpoint, relative to the base URL
    pub endpoint: &'static str,
    /// Environment variable holding the client id
    pub client_id_env: &'static str,
    /// Environment variable holding the client secret
    pub client_secret_env: &'static str,
}

/// Endpoint shape for API sources
#[derive(Debug, Clone, Copy)]
pub struct ApiShape {
    /// Search endpoint, relative to the base URL
    pub endpoint: &'static str,
    /// Page size requested via the `limit` parameter
    pub page_size: u32,
    /// Fixed query parameters sent on every request
    pub base_params: &'static [(&'static str, &'static str)],
    /// Query parameter carrying the place dimension, when the API filters by one
    pub place_param: Option<&'static str>,
    /// Environment variable holding a static bearer token, if the API uses one
    pub api_key_env: Option<&'static str>,
    /// Token-acquisition step, if the API requires it
    pub auth: Option<ApiAuth>,
}

/// Everything the pipeline needs to scrape one source
#[derive(Debug)]
pub struct SourceAdapter {
    /// Stable identifier used in job configs and the registry
    pub id: &'static str,
    /// Human-readable name for logs
    pub label: &'static str,
    pub country: Country,
    pub strategy: StrategyKind,
    pub base_url: &'static str,
    /// Search path template; `{category}`, `{city}`, `{city_lower}`,
    /// `{place}` are replaced per dimension (values URL-encoded)
    pub search_path: &'static str,
    pub selectors: SelectorMap,
    /// Rendered sources: listing selector to await, then fallbacks in order
    pub wait_selectors: &'static [&'static str],
    pub dimensions: Dimensions,
    /// Pagination bound; page 1 is always fetched
    pub max_pages: u32,
    pub api: Option<ApiShape>,
}

fn encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

impl SourceAdapter {
    /// Build the search URL for one dimension
    pub fn search_url(&self, dimension: &Dimension) -> String {
        let mut path = self.search_path.to_string();
        if let Some(category) = &dimension.category {
            path = path.replace("{category}", &encode(category));
        }
        if let Some(place) = &dimension.place {
            path = path
                .replace("{city}", &encode(place))
                .replace("{city_lower}", &encode(&place.to_lowercase()))
                .replace("{place}", &encode(place));
        }
        format!("{}{}", self.base_url, path)
    }

    /// Append the page parameter for pages past the first
    pub fn page_url(&self, search_url: &str, page: u32) -> String {
        if page <= 1 {
            return search_url.to_string();
        }
        if search_url.contains('?') {
            format!("{search_url}&page={page}")
        } else {
            format!("{search_url}?page={page}")
        }
    }
}

/// Lookup table from source identifier to adapter.
///
/// Built once at startup and injected into the pipeline runner.
#[derive(Debug)]
pub struct SourceRegistry {
    adapters: HashMap<&'static str, &'static SourceAdapter>,
}

impl SourceRegistry {
    /// Registry with every known source registered
    pub fn with_known_sources() -> Self {
        let mut registry = Self::empty();
        for adapter in italy::ADAPTERS.iter().chain(romania::ADAPTERS.iter()) {
            registry.register(adapter);
        }
        registry
    }

    /// Empty registry; sources are added with [`register`](Self::register)
    pub fn empty() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Register an adapter, replacing any previous one with the same id
    pub fn register(&mut self, adapter: &'static SourceAdapter) {
        self.adapters.insert(adapter.id, adapter);
    }

    /// Resolve a source id; unknown ids are a configuration error
    pub fn get(&self, id: &str) -> Result<&'static SourceAdapter> {
        self.adapters
            .get(id)
            .copied()
            .ok_or_else(|| Error::UnknownSource(id.to_string()))
    }

    /// All adapters registered for one country
    pub fn for_country(&self, country: Country) -> Vec<&'static SourceAdapter> {
        let mut adapters: Vec<_> = self
            .adapters
            .values()
            .copied()
            .filter(|a| a.country == country)
            .collect();
        adapters.sort_by_key(|a| a.id);
        adapters
    }

    /// Registered source identifiers, sorted
    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.adapters.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
