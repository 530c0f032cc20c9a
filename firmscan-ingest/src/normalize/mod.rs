//! Record normalization
//!
//! Pure transforms from `RawListing` to `CompanyRecord`. Generic cleaning
//! (whitespace, URL, email shape) runs first, then the country profile
//! applies national formats (tax id, phone, dates, address-to-city
//! extraction), and finally the quality score is computed from field
//! presence. Malformed field values degrade to `None`; nothing in this
//! module performs I/O or returns an error for bad input.

pub mod country;
pub mod industry;
pub mod quality;

pub use country::CountryProfile;

use crate::models::{CompanyRecord, Email, Phone, RawListing, TaxId};
use url::Url;

/// Trim and collapse internal whitespace; empty input becomes `None`.
pub fn clean_text(raw: Option<&str>) -> Option<String> {
    let cleaned = raw?.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Normalize a website value into an absolute URL.
///
/// Scheme-less values get `https://` prefixed; anything that still fails
/// to parse as an absolute URL is rejected.
pub fn normalize_website(raw: &str) -> Option<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let candidate = if trimmed.starts_with("http") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let url = Url::parse(&candidate).ok()?;
    url.host_str()?;
    Some(url)
}

/// Normalize one raw listing into a canonical company record.
///
/// Returns `None` when the listing has no usable company name; every other
/// malformed field degrades to `None` on the record.
pub fn normalize(raw: &RawListing, profile: &CountryProfile) -> Option<CompanyRecord> {
    let country = raw.country.unwrap_or(profile.country());
    let company_name = clean_text(raw.company_name.as_deref())?;

    let address = clean_text(raw.address.as_deref()).map(|a| profile.clean_address(&a));
    let city = clean_text(raw.city.as_deref())
        .or_else(|| address.as_deref().and_then(|a| profile.extract_city(a)));
    let description = clean_text(raw.description.as_deref());
    let industry = clean_text(raw.industry.as_deref())
        .or_else(|| Some(industry::classify(&company_name, description.as_deref(), country).to_string()));

    let mut record = CompanyRecord {
        company_name,
        legal_name: clean_text(raw.legal_name.as_deref()),
        tax_id: raw
            .tax_id
            .as_deref()
            .and_then(|t| TaxId::parse(t, country)),
        registration_number: clean_text(raw.registration_number.as_deref())
            .map(|r| profile.clean_registration_number(&r)),
        website: raw.website.as_deref().and_then(normalize_website),
        email: raw.email.as_deref().and_then(Email::parse),
        phone: raw.phone.as_deref().and_then(|p| Phone::parse(p, country)),
        address,
        city,
        description,
        legal_form: clean_text(raw.legal_form.as_deref()),
        registration_date: raw
            .registration_date
            .as_deref()
            .and_then(|d| profile.parse_date(d)),
        share_capital: raw
            .share_capital
            .as_deref()
            .and_then(country::parse_share_capital),
        industry,
        industry_codes: raw
            .industry_codes
            .iter()
            .filter_map(|c| clean_text(Some(c.as_str())))
            .collect(),
        linkedin_url: raw.linkedin_url.as_deref().and_then(normalize_website),
        technologies: raw
            .technologies
            .iter()
            .filter_map(|t| clean_text(Some(t.as_str())))
            .collect(),
        specialties: raw
            .specialties
            .iter()
            .filter_map(|s| clean_text(Some(s.as_str())))
            .collect(),
        country,
        source_platform: raw.source_platform.clone(),
        source_url: raw.source_url.clone(),
        data_quality_score: 0,
    };
    quality::rescore(&mut record);
    Some(record)
}
