//! Country-specific cleaning rules
//!
//! National formats the generic normalizer cannot know: address-to-city
//! extraction (postal-code shapes differ per country), registration date
//! formats, and address punctuation habits. Tax-id and phone validation
//! live on their newtypes in `models`; this profile supplies everything
//! else a source adapter needs for its country.

use chrono::NaiveDate;
use firmscan_common::Country;
use once_cell::sync::Lazy;
use regex::Regex;

// Italian addresses carry "CAP city" (e.g. "20100 Milano")
static IT_CITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{5}\s+([A-Za-zàèéìòù\s]+)").expect("IT city regex"));

// Romanian addresses end with "city, county" (e.g. "Cluj-Napoca, Cluj")
static RO_CITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-zăâîșțĂÂÎȘȚ\s-]+),\s*[A-Za-zăâîșțĂÂÎȘȚ\s]+$").expect("RO city regex")
});

static DUPLICATED_COMMAS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*,").expect("comma regex"));

static CAPITAL_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\d.,]+").expect("capital regex"));

const ITALIAN_CITIES: &[&str] = &[
    "Milano", "Roma", "Torino", "Bologna", "Firenze", "Napoli", "Venezia",
];

const ROMANIAN_CITIES: &[&str] = &[
    "București",
    "Cluj-Napoca",
    "Timișoara",
    "Iași",
    "Brașov",
    "Constanța",
    "Craiova",
];

/// Per-country cleaning rules applied after generic normalization
#[derive(Debug)]
pub struct CountryProfile {
    country: Country,
    city_pattern: &'static Lazy<Regex>,
    gazetteer: &'static [&'static str],
    date_formats: &'static [&'static str],
}

static ITALY: CountryProfile = CountryProfile {
    country: Country::Italy,
    city_pattern: &IT_CITY,
    gazetteer: ITALIAN_CITIES,
    date_formats: &["%d/%m/%Y", "%Y-%m-%d"],
};

static ROMANIA: CountryProfile = CountryProfile {
    country: Country::Romania,
    city_pattern: &RO_CITY,
    gazetteer: ROMANIAN_CITIES,
    date_formats: &["%d.%m.%Y", "%d/%m/%Y", "%Y-%m-%d"],
};

impl CountryProfile {
    /// Profile for a country; profiles are static values, not built per run
    pub fn for_country(country: Country) -> &'static CountryProfile {
        match country {
            Country::Italy => &ITALY,
            Country::Romania => &ROMANIA,
        }
    }

    pub fn country(&self) -> Country {
        self.country
    }

    /// Extract the city from a free-form address.
    ///
    /// Tries the national address shape first, then falls back to matching
    /// well-known city names as substrings.
    pub fn extract_city(&self, address: &str) -> Option<String> {
        if let Some(captures) = self.city_pattern.captures(address) {
            let city = captures.get(1)?.as_str().trim();
            if !city.is_empty() {
                return Some(city.to_string());
            }
        }
        self.gazetteer
            .iter()
            .find(|city| address.contains(*city))
            .map(|city| city.to_string())
    }

    /// Collapse duplicated commas left behind by template-driven listings
    pub fn clean_address(&self, address: &str) -> String {
        DUPLICATED_COMMAS
            .replace_all(address, ",")
            .trim()
            .to_string()
    }

    /// Registration numbers keep their separator but lose stray whitespace
    /// (e.g. "MI - 1234567" becomes "MI-1234567")
    pub fn clean_registration_number(&self, number: &str) -> String {
        number.chars().filter(|c| !c.is_whitespace()).collect()
    }

    /// Parse a registration date in the national format, ISO as fallback.
    ///
    /// Unparseable dates become `None`; they are expected input noise.
    pub fn parse_date(&self, raw: &str) -> Option<NaiveDate> {
        let trimmed = raw.trim();
        self.date_formats
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
    }
}

/// Extract a numeric share capital from currency text.
///
/// Handles the continental format ("1.250.000,50") by treating dots as
/// thousands separators whenever a comma decimal is present.
pub fn parse_share_capital(raw: &str) -> Option<f64> {
    let matched = CAPITAL_AMOUNT.find(raw)?.as_str();
    let normalized = if matched.contains(',') {
        matched.replace('.', "").replace(',', ".")
    } else {
        matched.to_string()
    };
    normalized.parse::<f64>().ok()
}
