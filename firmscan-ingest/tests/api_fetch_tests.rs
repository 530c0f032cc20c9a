//! API strategy behavior against a local mock server

use firmscan_common::config::ScrapingSettings;
use firmscan_common::Country;
use firmscan_ingest::fetch::api::ApiFetcher;
use firmscan_ingest::fetch::{FetchContext, FetchStrategy, NoProxy, Pacer};
use firmscan_ingest::sources::{
    ApiAuth, ApiShape, Dimensions, DimensionOverrides, SelectorMap, SourceAdapter, StrategyKind,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_settings() -> ScrapingSettings {
    ScrapingSettings {
        request_timeout_secs: 5,
        user_agent: "firmscan-tests".into(),
        max_retries: 2,
        retry_base_delay_ms: 1,
        page_delay_ms: 0,
        dimension_delay_ms: 0,
        requests_per_minute: 60_000,
        headless: true,
    }
}

fn api_adapter(base_url: &str, shape: ApiShape) -> &'static SourceAdapter {
    Box::leak(Box::new(SourceAdapter {
        id: "test_api",
        label: "Test API",
        country: Country::Italy,
        strategy: StrategyKind::Api,
        base_url: Box::leak(base_url.to_string().into_boxed_str()),
        search_path: "/v1/companies",
        selectors: SelectorMap::minimal("", ""),
        wait_selectors: &[],
        dimensions: Dimensions::Regions(&["Lombardia"]),
        max_pages: 5,
        api: Some(shape),
    }))
}

async fn fetch_with(adapter: &'static SourceAdapter) -> firmscan_ingest::fetch::FetchOutcome {
    let settings = fast_settings();
    let pacer = Pacer::per_minute(settings.requests_per_minute);
    let cancel = CancellationToken::new();
    let ctx = FetchContext {
        settings: &settings,
        pacer: &pacer,
        proxies: &NoProxy,
        cancel: &cancel,
        overrides: DimensionOverrides::default(),
    };
    ApiFetcher
        .fetch(adapter, &ctx)
        .await
        .expect("api fetch succeeds")
}

#[tokio::test]
async fn paginates_until_metadata_says_stop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/companies"))
        .and(query_param("page", "1"))
        .and(query_param("region", "Lombardia"))
        .and(query_param("sector", "62"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"denominazione": "Acme S.r.l.", "partita_iva": "12345678901"},
                {"denominazione": "Beta S.p.A.", "partita_iva": "10987654321"},
            ],
            "meta": {"current_page": 1, "total_pages": 2},
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/companies"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"denominazione": "Gamma S.r.l."}],
            "meta": {"current_page": 2, "total_pages": 2},
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = api_adapter(
        &server.uri(),
        ApiShape {
            endpoint: "/v1/companies",
            page_size: 50,
            base_params: &[("sector", "62")],
            place_param: Some("region"),
            api_key_env: None,
            auth: None,
        },
    );
    let outcome = fetch_with(adapter).await;

    assert_eq!(outcome.units.len(), 1);
    assert_eq!(outcome.units[0].pages_fetched, 2);
    let listings = outcome.into_listings();
    assert_eq!(listings.len(), 3);
    assert_eq!(listings[0].company_name.as_deref(), Some("Acme S.r.l."));
    assert_eq!(listings[0].tax_id.as_deref(), Some("12345678901"));
}

#[tokio::test]
async fn discovers_listing_array_in_nested_object() {
    let server = MockServer::start().await;
    // No results/data key; the first array among object values is used,
    // and the full-page length heuristic drives pagination
    Mock::given(method("GET"))
        .and(path("/v1/companies"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "note": "wrapped",
            "companies": [
                {"name": "Alpha"},
                {"name": "Beta"},
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/companies"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "companies": [{"name": "Gamma"}],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = api_adapter(
        &server.uri(),
        ApiShape {
            endpoint: "/v1/companies",
            page_size: 2,
            base_params: &[],
            place_param: None,
            api_key_env: None,
            auth: None,
        },
    );
    let outcome = fetch_with(adapter).await;

    assert_eq!(outcome.units[0].pages_fetched, 2);
    assert_eq!(outcome.into_listings().len(), 3);
}

#[tokio::test]
async fn acquires_bearer_token_before_fetching() {
    let server = MockServer::start().await;
    std::env::set_var("FIRMSCAN_TEST_AUTH_CLIENT_ID", "client-1");
    std::env::set_var("FIRMSCAN_TEST_AUTH_CLIENT_SECRET", "shh");

    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "secret-token"})))
        .expect(1)
        .mount(&server)
        .await;
    // Search only matches when the bearer header is present
    Mock::given(method("GET"))
        .and(path("/v1/companies"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"denominazione": "Acme S.r.l."}],
            "meta": {"current_page": 1, "total_pages": 1},
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = api_adapter(
        &server.uri(),
        ApiShape {
            endpoint: "/v1/companies",
            page_size: 50,
            base_params: &[],
            place_param: None,
            api_key_env: None,
            auth: Some(ApiAuth {
                endpoint: "/v1/token",
                client_id_env: "FIRMSCAN_TEST_AUTH_CLIENT_ID",
                client_secret_env: "FIRMSCAN_TEST_AUTH_CLIENT_SECRET",
            }),
        },
    );
    let outcome = fetch_with(adapter).await;

    std::env::remove_var("FIRMSCAN_TEST_AUTH_CLIENT_ID");
    std::env::remove_var("FIRMSCAN_TEST_AUTH_CLIENT_SECRET");

    assert_eq!(outcome.failed_units(), 0);
    assert_eq!(outcome.into_listings().len(), 1);
}

#[tokio::test]
async fn server_errors_surface_as_unit_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/companies"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let adapter = api_adapter(
        &server.uri(),
        ApiShape {
            endpoint: "/v1/companies",
            page_size: 50,
            base_params: &[],
            place_param: None,
            api_key_env: None,
            auth: None,
        },
    );
    let outcome = fetch_with(adapter).await;

    assert_eq!(outcome.units.len(), 1);
    assert_eq!(outcome.failed_units(), 1);
    assert!(outcome.units[0]
        .failure
        .as_ref()
        .unwrap()
        .contains("500"));
}
