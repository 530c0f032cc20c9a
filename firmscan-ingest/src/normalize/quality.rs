//! Data quality scoring
//!
//! Weighted-presence scores summarizing field completeness. The scraping
//! scorer weighs contact and identity fields; the import scorer covers the
//! profile fields a manual import carries (technologies, specialties,
//! LinkedIn). Both exclude the `"Not publicly listed"` placeholder some
//! directories return instead of a real value.

use crate::models::CompanyRecord;

/// Placeholder value some sources emit for withheld fields
const NOT_LISTED: &str = "Not publicly listed";

fn present(text: Option<&str>) -> bool {
    text.map(|t| {
        let t = t.trim();
        !t.is_empty() && t != NOT_LISTED
    })
    .unwrap_or(false)
}

/// Scraping quality score in [0, 100].
///
/// Weights: company_name 20, tax_id 15, website 15, email 15, phone 10,
/// address 10, city 10, description 5.
pub fn score(record: &CompanyRecord) -> u8 {
    let mut score = 0u32;
    if present(Some(&record.company_name)) {
        score += 20;
    }
    if record.tax_id.is_some() {
        score += 15;
    }
    if record.website.is_some() {
        score += 15;
    }
    if record.email.is_some() {
        score += 15;
    }
    if record.phone.is_some() {
        score += 10;
    }
    if present(record.address.as_deref()) {
        score += 10;
    }
    if present(record.city.as_deref()) {
        score += 10;
    }
    if present(record.description.as_deref()) {
        score += 5;
    }
    score.min(100) as u8
}

/// Import quality score in [0, 100], used for manually imported profiles.
///
/// Weights: name 20, website 15, email 15, city 10, address 10,
/// technologies 10, specialties 10, linkedin 10.
pub fn import_score(record: &CompanyRecord) -> u8 {
    let mut score = 0u32;
    if present(Some(&record.company_name)) {
        score += 20;
    }
    if record.website.is_some() {
        score += 15;
    }
    if record.email.is_some() {
        score += 15;
    }
    if present(record.city.as_deref()) {
        score += 10;
    }
    if present(record.address.as_deref()) {
        score += 10;
    }
    if !record.technologies.is_empty() {
        score += 10;
    }
    if !record.specialties.is_empty() {
        score += 10;
    }
    if record.linkedin_url.is_some() {
        score += 10;
    }
    score.min(100) as u8
}

/// Equal-weight completeness ratio over the profile fields, in [0, 100]
pub fn completeness(record: &CompanyRecord) -> u8 {
    const FIELD_COUNT: u32 = 7;
    let step = (100.0 / FIELD_COUNT as f64).round() as u32;
    let mut score = 0u32;
    if present(Some(&record.company_name)) {
        score += step;
    }
    if record.website.is_some() {
        score += step;
    }
    if record.email.is_some() {
        score += step;
    }
    if present(record.city.as_deref()) {
        score += step;
    }
    if present(record.address.as_deref()) {
        score += step;
    }
    if !record.technologies.is_empty() {
        score += step;
    }
    if !record.specialties.is_empty() {
        score += step;
    }
    score.min(100) as u8
}

/// Recompute the record's quality score in place.
///
/// The only sanctioned way to set `data_quality_score`.
pub fn rescore(record: &mut CompanyRecord) {
    record.data_quality_score = score(record);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Email, TaxId};
    use firmscan_common::Country;

    #[test]
    fn test_score_bare_record() {
        let record = CompanyRecord::bare("Acme", Country::Italy);
        assert_eq!(score(&record), 20);
    }

    #[test]
    fn test_score_monotonically_increases_with_fields() {
        let mut record = CompanyRecord::bare("Acme", Country::Italy);
        let base = score(&record);

        record.tax_id = TaxId::parse("12345678901", Country::Italy);
        let with_tax = score(&record);
        assert!(with_tax > base);

        record.email = Email::parse("info@acme.it");
        let with_email = score(&record);
        assert!(with_email > with_tax);

        record.city = Some("Milano".into());
        assert!(score(&record) > with_email);
    }

    #[test]
    fn test_score_bounds() {
        let mut record = CompanyRecord::bare("Acme", Country::Italy);
        record.tax_id = TaxId::parse("12345678901", Country::Italy);
        record.website = Some("https://acme.it".parse().unwrap());
        record.email = Email::parse("info@acme.it");
        record.phone = crate::models::Phone::parse("0212345678", Country::Italy);
        record.address = Some("Via Roma 1, 20100 Milano".into());
        record.city = Some("Milano".into());
        record.description = Some("Software house".into());
        assert_eq!(score(&record), 100);
    }

    #[test]
    fn test_not_listed_sentinel_excluded() {
        let mut record = CompanyRecord::bare("Acme", Country::Italy);
        let base = score(&record);
        record.address = Some(NOT_LISTED.into());
        record.city = Some(NOT_LISTED.into());
        assert_eq!(score(&record), base);
    }

    #[test]
    fn test_import_score_counts_profile_fields() {
        let mut record = CompanyRecord::bare("Acme", Country::Italy);
        assert_eq!(import_score(&record), 20);
        record.technologies = vec!["rust".into()];
        record.specialties = vec!["fintech".into()];
        record.linkedin_url = Some("https://linkedin.com/company/acme".parse().unwrap());
        assert_eq!(import_score(&record), 50);
    }

    #[test]
    fn test_completeness_ratio() {
        let mut record = CompanyRecord::bare("Acme", Country::Italy);
        assert_eq!(completeness(&record), 14);
        record.website = Some("https://acme.it".parse().unwrap());
        record.email = Email::parse("info@acme.it");
        record.city = Some("Milano".into());
        record.address = Some("Via Roma 1".into());
        record.technologies = vec!["rust".into()];
        record.specialties = vec!["fintech".into()];
        assert_eq!(completeness(&record), 98);
    }
}
