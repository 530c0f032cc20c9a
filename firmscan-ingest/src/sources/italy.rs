//! Italian sources
//!
//! Pagine Gialle (static directory), Registro Imprese (rendered company
//! register search), and InfoCamere (chamber-of-commerce API). ATECO
//! division 62 is the software/IT sector filter used on the register
//! searches.

use super::{ApiAuth, ApiShape, Dimensions, SelectorMap, SourceAdapter, StrategyKind};
use firmscan_common::Country;

/// Default search categories on Pagine Gialle
const PAGINE_GIALLE_CATEGORIES: &[&str] = &[
    "software-house",
    "sviluppo-software",
    "consulenza-informatica",
    "web-agency",
    "sviluppo-app-mobile",
];

const FOCUS_CITIES: &[&str] = &["Milano", "Roma", "Torino", "Bologna", "Firenze"];

const FOCUS_REGIONS: &[&str] = &["Lombardia", "Lazio", "Piemonte", "Emilia-Romagna"];

pub static PAGINE_GIALLE: SourceAdapter = SourceAdapter {
    id: "pagine_gialle",
    label: "Pagine Gialle",
    country: Country::Italy,
    strategy: StrategyKind::Static,
    base_url: "https://www.paginegialle.it",
    search_path: "/ricerca/{category}/{city_lower}",
    selectors: SelectorMap {
        listing: ".vcard, .listing-item, .result-item, .company-card",
        company_name: ".fn, .company-name, .business-name, h3, .title",
        legal_name: None,
        tax_id: None,
        registration_number: None,
        website: Some(".url a, .website a"),
        email: None,
        phone: Some(".tel, .phone, .telephone"),
        address: Some(".adr, .address, .location"),
        city: None,
        description: Some(".summary, .description, .about"),
        industry: None,
        legal_form: None,
        registration_date: None,
        share_capital: None,
    },
    wait_selectors: &[],
    dimensions: Dimensions::CategoryCity {
        categories: PAGINE_GIALLE_CATEGORIES,
        cities: FOCUS_CITIES,
    },
    max_pages: 5,
    api: None,
};

pub static REGISTRO_IMPRESE: SourceAdapter = SourceAdapter {
    id: "registro_imprese",
    label: "Registro Imprese",
    country: Country::Italy,
    strategy: StrategyKind::Rendered,
    base_url: "https://www.registroimprese.it",
    search_path: "/ricerca?regione={place}&settore=62",
    selectors: SelectorMap {
        listing: ".company-result, .search-result",
        company_name: ".company-name, .denominazione",
        legal_name: Some(".company-name, .denominazione"),
        tax_id: Some(".partita-iva, .p-iva"),
        registration_number: Some(".rea-number, .numero-rea"),
        website: None,
        email: None,
        phone: None,
        address: Some(".sede-legale, .address"),
        city: None,
        description: None,
        industry: None,
        legal_form: Some(".forma-giuridica, .legal-form"),
        registration_date: Some(".data-iscrizione"),
        share_capital: Some(".capitale-sociale"),
    },
    wait_selectors: &[".search-results", ".company-result"],
    dimensions: Dimensions::Regions(FOCUS_REGIONS),
    max_pages: 3,
    api: None,
};

pub static INFOCAMERE: SourceAdapter = SourceAdapter {
    id: "infocamere",
    label: "InfoCamere",
    country: Country::Italy,
    strategy: StrategyKind::Api,
    base_url: "https://api.infocamere.it",
    search_path: "/api/v1/companies/search",
    selectors: SelectorMap::minimal("", ""),
    wait_selectors: &[],
    dimensions: Dimensions::Regions(&["Lombardia", "Lazio", "Piemonte"]),
    max_pages: 5,
    api: Some(ApiShape {
        endpoint: "/api/v1/companies/search",
        page_size: 100,
        base_params: &[("sector", "62"), ("status", "active")],
        place_param: Some("region"),
        api_key_env: Some("FIRMSCAN_INFOCAMERE_API_KEY"),
        auth: Some(ApiAuth {
            endpoint: "/api/v1/auth/token",
            client_id_env: "FIRMSCAN_INFOCAMERE_CLIENT_ID",
            client_secret_env: "FIRMSCAN_INFOCAMERE_CLIENT_SECRET",
        }),
    }),
};

/// All Italian adapters, registration order
pub static ADAPTERS: &[&SourceAdapter] = &[&PAGINE_GIALLE, &REGISTRO_IMPRESE, &INFOCAMERE];
