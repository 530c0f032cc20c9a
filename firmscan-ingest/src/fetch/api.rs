//! API strategy
//!
//! JSON endpoints with configured params, optional bearer-token pre-auth,
//! and metadata-driven pagination. Response shapes vary per provider, so
//! the listing array is discovered (top level, then `results`/`data`, then
//! the first array among object values) and fields are mapped through an
//! alias table covering the Italian registry vocabulary.

use super::{build_client, retry, FetchContext, FetchOutcome, FetchStrategy, UnitReport};
use crate::error::FetchError;
use crate::models::RawListing;
use crate::sources::{ApiShape, Dimension, SourceAdapter};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

/// API fetch strategy
pub struct ApiFetcher;

#[async_trait]
impl FetchStrategy for ApiFetcher {
    async fn fetch(
        &self,
        adapter: &SourceAdapter,
        ctx: &FetchContext<'_>,
    ) -> Result<FetchOutcome, FetchError> {
        let shape = adapter.api.as_ref().ok_or_else(|| {
            FetchError::Config(format!("source '{}' declares Api but has no API shape", adapter.id))
        })?;
        let client = build_client(ctx, adapter.country)?;
        let bearer = resolve_bearer(&client, adapter, shape).await?;

        let dimensions = adapter.dimensions.expand(&ctx.overrides);
        info!(
            source = adapter.id,
            dimensions = dimensions.len(),
            authenticated = bearer.is_some(),
            "Starting API scrape"
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
            let unit =
                scrape_dimension(&client, adapter, shape, ctx, bearer.as_deref(), dimension).await;
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
}

/// Acquire a bearer token: credential-based pre-auth first, static API key
/// from the environment as fallback, none when unconfigured.
async fn resolve_bearer(
    client: &reqwest::Client,
    adapter: &SourceAdapter,
    shape: &ApiShape,
) -> Result<Option<String>, FetchError> {
    if let Some(auth) = &shape.auth {
        let credentials = (
            std::env::var(auth.client_id_env),
            std::env::var(auth.client_secret_env),
        );
        if let (Ok(client_id), Ok(client_secret)) = credentials {
            let url = format!("{}{}", adapter.base_url, auth.endpoint);
            let response = client
                .post(&url)
                .json(&serde_json::json!({
                    "client_id": client_id,
                    "client_secret": client_secret,
                }))
                .send()
                .await
                .map_err(FetchError::from_reqwest)?;
            if !response.status().is_success() {
                return Err(FetchError::Auth(format!(
                    "token endpoint returned HTTP {}",
                    response.status().as_u16()
                )));
            }
            let body: Value = response
                .json()
                .await
                .map_err(|e| FetchError::Auth(e.to_string()))?;
            let token = body
                .get("token")
                .and_then(Value::as_str)
                .ok_or_else(|| FetchError::Auth("token missing from response".into()))?;
            info!(source = adapter.id, "API authentication successful");
            return Ok(Some(token.to_string()));
        }
    }

    if let Some(env_name) = shape.api_key_env {
        if let Ok(key) = std::env::var(env_name) {
            if !key.trim().is_empty() {
                return Ok(Some(key.trim().to_string()));
            }
        }
    }
    Ok(None)
}

async fn scrape_dimension(
    client: &reqwest::Client,
    adapter: &SourceAdapter,
    shape: &ApiShape,
    ctx: &FetchContext<'_>,
    bearer: Option<&str>,
    dimension: &Dimension,
) -> UnitReport {
    let endpoint = format!("{}{}", adapter.base_url, shape.endpoint);
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

        let response =
            fetch_json(client, ctx, &endpoint, shape, bearer, dimension, page).await;
        let value = match response {
            Ok(value) => value,
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
        let items = listing_array(&value);
        let count = items.len();
        listings.extend(items.iter().map(|item| map_listing(item, adapter, &endpoint)));

        if count == 0 {
            debug!(source = adapter.id, page, "API page yielded no listings, stopping");
            break;
        }
        if !has_next_page(&value, count, shape.page_size) {
            break;
        }
    }

    UnitReport {
        unit: dimension.label.clone(),
        listings,
        pages_fetched,
        failure: None,
    }
}

async fn fetch_json(
    client: &reqwest::Client,
    ctx: &FetchContext<'_>,
    endpoint: &str,
    shape: &ApiShape,
    bearer: Option<&str>,
    dimension: &Dimension,
    page: u32,
) -> Result<Value, FetchError> {
    let mut params: Vec<(String, String)> = shape
        .base_params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    if let (Some(param), Some(place)) = (shape.place_param, &dimension.place) {
        params.push((param.to_string(), place.clone()));
    }
    params.push(("page".into(), page.to_string()));
    params.push(("limit".into(), shape.page_size.to_string()));

    retry::with_backoff(
        "api fetch",
        ctx.settings.max_retries,
        ctx.settings.retry_base_delay_ms,
        || async {
            ctx.pacer.until_ready().await;
            let mut request = client.get(endpoint).query(&params);
            if let Some(token) = bearer {
                request = request.bearer_auth(token);
            }
            let response = request.send().await.map_err(FetchError::from_reqwest)?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    url: endpoint.to_string(),
                });
            }
            response
                .json::<Value>()
                .await
                .map_err(|e| FetchError::Parse(e.to_string()))
        },
    )
    .await
}

static NO_LISTINGS: Vec<Value> = Vec::new();

/// Locate the listing array in a response of unknown shape
pub(crate) fn listing_array(value: &Value) -> &Vec<Value> {
    if let Value::Array(items) = value {
        return items;
    }
    for key in ["results", "data"] {
        if let Some(Value::Array(items)) = value.get(key) {
            return items;
        }
    }
    if let Value::Object(map) = value {
        for nested in map.values() {
            if let Value::Array(items) = nested {
                return items;
            }
        }
    }
    &NO_LISTINGS
}

/// Whether response metadata promises another page
pub(crate) fn has_next_page(value: &Value, count: usize, page_size: u32) -> bool {
    if let Some(pagination) = value.get("pagination") {
        if let Some(has_next) = pagination
            .get("has_next")
            .or_else(|| pagination.get("hasNext"))
            .and_then(Value::as_bool)
        {
            return has_next;
        }
        if let (Some(page), Some(total)) = (
            pagination.get("page").and_then(Value::as_u64),
            pagination
                .get("total_pages")
                .or_else(|| pagination.get("totalPages"))
                .and_then(Value::as_u64),
        ) {
            return page < total;
        }
    }
    if let Some(meta) = value.get("meta") {
        if let (Some(current), Some(total)) = (
            meta.get("current_page").and_then(Value::as_u64),
            meta.get("total_pages").and_then(Value::as_u64),
        ) {
            return current < total;
        }
    }
    // Array-length heuristic: a short page means the last one
    count as u64 >= page_size as u64
}

fn string_field(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match item.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn list_field(item: &Value, keys: &[&str]) -> Vec<String> {
    for key in keys {
        match item.get(*key) {
            Some(Value::Array(values)) => {
                return values
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
            Some(Value::String(joined)) => {
                return joined
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
            _ => continue,
        }
    }
    Vec::new()
}

/// Map one API object to a raw listing through the alias table
pub(crate) fn map_listing(item: &Value, adapter: &SourceAdapter, endpoint: &str) -> RawListing {
    RawListing {
        company_name: string_field(item, &["denominazione", "company_name", "name"]),
        legal_name: string_field(item, &["denominazione", "legal_name", "name"]),
        tax_id: string_field(item, &["partita_iva", "tax_id", "cui", "vat_number"]),
        registration_number: string_field(item, &["numero_rea", "registration_number"]),
        website: string_field(item, &["website", "sito_web"]),
        email: string_field(item, &["email"]),
        phone: string_field(item, &["phone", "telefono"]),
        address: string_field(item, &["sede_legale", "address"]),
        city: string_field(item, &["comune", "city"]),
        description: string_field(item, &["description", "descrizione"]),
        legal_form: string_field(item, &["forma_giuridica", "legal_form"]),
        registration_date: string_field(item, &["data_iscrizione", "registration_date"]),
        share_capital: string_field(item, &["capitale_sociale", "share_capital"]),
        industry: string_field(item, &["industry", "settore"]),
        industry_codes: list_field(item, &["codici_ateco", "industry_codes"]),
        linkedin_url: string_field(item, &["linkedin_url", "linkedin"]),
        technologies: list_field(item, &["technologies"]),
        specialties: list_field(item, &["specialties"]),
        source_platform: adapter.id.to_string(),
        source_url: endpoint.to_string(),
        country: Some(adapter.country),
    }
}
