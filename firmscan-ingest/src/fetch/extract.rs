//! CSS-selector extraction of raw listings
//!
//! Shared by the static and rendered strategies: the rendered strategy
//! extracts from the browser's serialized DOM, the static strategy from
//! the response body, both through the same selector map.

use crate::error::FetchError;
use crate::models::RawListing;
use crate::sources::{SelectorMap, SourceAdapter};
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

struct CompiledSelectors {
    listing: Selector,
    company_name: Selector,
    legal_name: Option<Selector>,
    tax_id: Option<Selector>,
    registration_number: Option<Selector>,
    website: Option<Selector>,
    email: Option<Selector>,
    phone: Option<Selector>,
    address: Option<Selector>,
    city: Option<Selector>,
    description: Option<Selector>,
    industry: Option<Selector>,
    legal_form: Option<Selector>,
    registration_date: Option<Selector>,
    share_capital: Option<Selector>,
}

fn compile(raw: &str) -> Result<Selector, FetchError> {
    Selector::parse(raw)
        .map_err(|e| FetchError::Config(format!("invalid selector '{raw}': {e:?}")))
}

fn compile_optional(raw: Option<&str>) -> Result<Option<Selector>, FetchError> {
    raw.map(compile).transpose()
}

impl CompiledSelectors {
    fn from_map(map: &SelectorMap) -> Result<Self, FetchError> {
        Ok(Self {
            listing: compile(map.listing)?,
            company_name: compile(map.company_name)?,
            legal_name: compile_optional(map.legal_name)?,
            tax_id: compile_optional(map.tax_id)?,
            registration_number: compile_optional(map.registration_number)?,
            website: compile_optional(map.website)?,
            email: compile_optional(map.email)?,
            phone: compile_optional(map.phone)?,
            address: compile_optional(map.address)?,
            city: compile_optional(map.city)?,
            description: compile_optional(map.description)?,
            industry: compile_optional(map.industry)?,
            legal_form: compile_optional(map.legal_form)?,
            registration_date: compile_optional(map.registration_date)?,
            share_capital: compile_optional(map.share_capital)?,
        })
    }
}

fn text_of(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    let found = element.select(selector).next()?;
    let text = found.text().collect::<String>();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn optional_text(element: &ElementRef<'_>, selector: &Option<Selector>) -> Option<String> {
    selector.as_ref().and_then(|s| text_of(element, s))
}

fn href_of(element: &ElementRef<'_>, selector: &Option<Selector>) -> Option<String> {
    let found = element.select(selector.as_ref()?).next()?;
    let href = found.value().attr("href")?.trim();
    if href.is_empty() {
        None
    } else {
        Some(href.to_string())
    }
}

/// Email cell content; falls back to the `mailto:` target when the anchor
/// has no visible text
fn email_of(element: &ElementRef<'_>, selector: &Option<Selector>) -> Option<String> {
    let found = element.select(selector.as_ref()?).next()?;
    let text = found.text().collect::<String>();
    let text = text.trim();
    if !text.is_empty() {
        return Some(text.to_string());
    }
    found
        .value()
        .attr("href")?
        .strip_prefix("mailto:")
        .map(|addr| addr.trim().to_string())
}

/// Extract one raw listing per matched listing element.
///
/// Listings without a company name are dropped; a selector map that fails
/// to compile is an adapter configuration error.
pub fn extract_listings(
    html: &str,
    adapter: &SourceAdapter,
    page_url: &str,
) -> Result<Vec<RawListing>, FetchError> {
    let selectors = CompiledSelectors::from_map(&adapter.selectors)?;
    let document = Html::parse_document(html);
    let mut listings = Vec::new();
    let mut skipped = 0usize;

    for element in document.select(&selectors.listing) {
        let Some(company_name) = text_of(&element, &selectors.company_name) else {
            skipped += 1;
            continue;
        };

        listings.push(RawListing {
            company_name: Some(company_name),
            legal_name: optional_text(&element, &selectors.legal_name),
            tax_id: optional_text(&element, &selectors.tax_id),
            registration_number: optional_text(&element, &selectors.registration_number),
            website: href_of(&element, &selectors.website),
            email: email_of(&element, &selectors.email),
            phone: optional_text(&element, &selectors.phone),
            address: optional_text(&element, &selectors.address),
            city: optional_text(&element, &selectors.city),
            description: optional_text(&element, &selectors.description),
            legal_form: optional_text(&element, &selectors.legal_form),
            registration_date: optional_text(&element, &selectors.registration_date),
            share_capital: optional_text(&element, &selectors.share_capital),
            industry: optional_text(&element, &selectors.industry),
            industry_codes: Vec::new(),
            linkedin_url: None,
            technologies: Vec::new(),
            specialties: Vec::new(),
            source_platform: adapter.id.to_string(),
            source_url: page_url.to_string(),
            country: Some(adapter.country),
        });
    }

    if skipped > 0 {
        warn!(
            source = adapter.id,
            skipped, "Dropped listing elements without a company name"
        );
    }

    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SourceRegistry;

    const PAGE: &str = r#"
        <html><body>
          <div class="vcard">
            <span class="fn">Acme Software SRL</span>
            <span class="adr">Via Roma 1, 20100 Milano</span>
            <span class="tel">+39 02 12345678</span>
            <span class="url"><a href="https://acme.it">acme.it</a></span>
            <p class="summary">Software house</p>
          </div>
          <div class="vcard">
            <span class="adr">No name here</span>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_extracts_fields_per_listing() {
        let registry = SourceRegistry::with_known_sources();
        let adapter = registry.get("pagine_gialle").unwrap();
        let listings = extract_listings(PAGE, adapter, "https://page.test").unwrap();
        assert_eq!(listings.len(), 1);

        let listing = &listings[0];
        assert_eq!(listing.company_name.as_deref(), Some("Acme Software SRL"));
        assert_eq!(listing.phone.as_deref(), Some("+39 02 12345678"));
        assert_eq!(listing.website.as_deref(), Some("https://acme.it"));
        assert_eq!(listing.source_platform, "pagine_gialle");
        assert_eq!(listing.source_url, "https://page.test");
    }

    #[test]
    fn test_no_listings_yields_empty() {
        let registry = SourceRegistry::with_known_sources();
        let adapter = registry.get("pagine_gialle").unwrap();
        let listings =
            extract_listings("<html><body><p>nothing</p></body></html>", adapter, "u").unwrap();
        assert!(listings.is_empty());
    }

    #[test]
    fn test_all_registered_selector_maps_compile() {
        let registry = SourceRegistry::with_known_sources();
        for id in registry.ids() {
            let adapter = registry.get(id).unwrap();
            if adapter.selectors.listing.is_empty() {
                continue; // API sources carry no selectors
            }
            CompiledSelectors::from_map(&adapter.selectors)
                .unwrap_or_else(|e| panic!("selectors for {id} must compile: {e}"));
        }
    }
}
