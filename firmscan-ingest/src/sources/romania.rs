//! Romanian sources
//!
//! Lista Firme (static directory), ONRC (rendered trade-register search),
//! and ANIS (rendered member directory of the software industry
//! association).

use super::{Dimensions, SelectorMap, SourceAdapter, StrategyKind};
use firmscan_common::Country;

const LISTAFIRME_CATEGORIES: &[&str] = &[
    "dezvoltare-software",
    "outsourcing-it",
    "consultanta-it",
    "web-design",
    "aplicatii-mobile",
];

const FOCUS_CITIES: &[&str] = &["București", "Cluj-Napoca", "Timișoara", "Iași", "Brașov"];

const FOCUS_COUNTIES: &[&str] = &["București", "Cluj", "Timiș", "Iași"];

const ANIS_CATEGORIES: &[&str] = &[
    "software-development",
    "it-services",
    "consulting",
    "outsourcing",
    "digital-transformation",
];

pub static LISTAFIRME: SourceAdapter = SourceAdapter {
    id: "listafirme",
    label: "Lista Firme",
    country: Country::Romania,
    strategy: StrategyKind::Static,
    base_url: "https://www.listafirme.ro",
    search_path: "/search?q={category}&location={city}",
    selectors: SelectorMap {
        listing: ".company-item, .firma-item, .result-item, .listing-item",
        company_name: ".company-name, .denumire-firma, .title, h3",
        legal_name: None,
        tax_id: Some(".cui, .cod-unic-identificare, .tax-id"),
        registration_number: Some(".numar-registrul-comertului, .registration-number"),
        website: Some(".website a, .site-web a, .url a"),
        email: Some(".email, .contact-email, .mail"),
        phone: Some(".telefon, .phone, .tel"),
        address: Some(".adresa, .sediu-social, .address"),
        city: None,
        description: Some(".descriere, .description"),
        industry: None,
        legal_form: None,
        registration_date: None,
        share_capital: None,
    },
    wait_selectors: &[],
    dimensions: Dimensions::CategoryCity {
        categories: LISTAFIRME_CATEGORIES,
        cities: FOCUS_CITIES,
    },
    max_pages: 5,
    api: None,
};

pub static ONRC: SourceAdapter = SourceAdapter {
    id: "onrc",
    label: "ONRC",
    country: Country::Romania,
    strategy: StrategyKind::Rendered,
    base_url: "https://www.onrc.ro",
    search_path: "/cautare?judet={place}&domeniu=software",
    selectors: SelectorMap {
        listing: ".company-result, .search-result",
        company_name: ".denumire-firma, .company-name",
        legal_name: None,
        tax_id: Some(".cod-unic-identificare, .cui"),
        registration_number: Some(".numar-registrul-comertului"),
        website: None,
        email: None,
        phone: None,
        address: Some(".sediu-social, .address"),
        city: None,
        description: None,
        industry: None,
        legal_form: Some(".forma-juridica, .legal-form"),
        registration_date: None,
        share_capital: None,
    },
    wait_selectors: &[".search-results", ".company-result"],
    dimensions: Dimensions::Counties(FOCUS_COUNTIES),
    max_pages: 3,
    api: None,
};

pub static ANIS: SourceAdapter = SourceAdapter {
    id: "anis",
    label: "ANIS",
    country: Country::Romania,
    strategy: StrategyKind::Rendered,
    base_url: "https://www.anis.ro",
    search_path: "/en/members/{category}",
    selectors: SelectorMap {
        listing: ".member-item, .company-card, .result-item",
        company_name: ".member-name, .company-name, h3, .title",
        legal_name: None,
        tax_id: None,
        registration_number: None,
        website: Some(".website a, .url a"),
        email: Some(".email, .mail, a[href^=\"mailto:\"]"),
        phone: Some(".phone, .tel, .telephone"),
        address: Some(".address, .location, .street"),
        city: None,
        description: Some(".description, .summary, .about"),
        industry: Some(".industry, .sector, .category"),
        legal_form: None,
        registration_date: None,
        share_capital: None,
    },
    wait_selectors: &[".member-item", ".company-card", ".result-item"],
    dimensions: Dimensions::Categories(ANIS_CATEGORIES),
    max_pages: 3,
    api: None,
};

/// All Romanian adapters, registration order
pub static ADAPTERS: &[&SourceAdapter] = &[&LISTAFIRME, &ONRC, &ANIS];
