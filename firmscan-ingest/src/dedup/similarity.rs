//! Pairwise record similarity
//!
//! A character-equal tax id settles the question outright. Otherwise the
//! score is a weighted average over whichever signals both records carry
//! (name, tax id, website, address), with the weights renormalized over
//! the present subset; two records sharing no signal score 0.

use crate::models::{CompanyRecord, TaxId};
use std::collections::HashSet;
use url::Url;

/// Records scoring at or above this are considered the same company
pub const SIMILARITY_THRESHOLD: f64 = 0.8;

const NAME_WEIGHT: f64 = 0.4;
const TAX_ID_WEIGHT: f64 = 0.3;
const WEBSITE_WEIGHT: f64 = 0.2;
const ADDRESS_WEIGHT: f64 = 0.1;

/// Legal-form tokens stripped before comparing names
const LEGAL_FORM_TOKENS: &[&str] = &[
    "srl", "spa", "sa", "pfa", "snc", "sas", "inc", "ltd", "llc", "corp", "corporation",
];

/// Lower-case, drop punctuation and legal-form tokens, collapse whitespace.
///
/// Punctuation is deleted, not blanked, so dotted legal forms ("S.R.L.")
/// collapse into their token before the strip.
pub fn normalize_company_name(name: &str) -> String {
    let lowered: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    lowered
        .split_whitespace()
        .filter(|token| !LEGAL_FORM_TOKENS.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

fn jaccard_words(a: &str, b: &str) -> f64 {
    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();
    let union = words_a.union(&words_b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = words_a.intersection(&words_b).count();
    intersection as f64 / union as f64
}

/// Blended name similarity: bigram similarity, word-set Jaccard, and
/// normalized edit distance over the normalized names
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let normalized_a = normalize_company_name(a);
    let normalized_b = normalize_company_name(b);
    if normalized_a.is_empty() || normalized_b.is_empty() {
        return 0.0;
    }
    if normalized_a == normalized_b {
        return 1.0;
    }

    let bigram = strsim::sorensen_dice(&normalized_a, &normalized_b);
    let jaccard = jaccard_words(&normalized_a, &normalized_b);
    let levenshtein = strsim::normalized_levenshtein(&normalized_a, &normalized_b);

    bigram * 0.4 + jaccard * 0.3 + levenshtein * 0.3
}

fn registrable_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// Hostname equality, bigram similarity of the hostnames otherwise
pub fn website_similarity(a: &Url, b: &Url) -> f64 {
    match (registrable_host(a), registrable_host(b)) {
        (Some(host_a), Some(host_b)) => {
            if host_a == host_b {
                1.0
            } else {
                strsim::sorensen_dice(&host_a, &host_b)
            }
        }
        _ => 0.0,
    }
}

fn normalize_address(address: &str) -> String {
    let lowered: String = address
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn address_similarity(a: &str, b: &str) -> f64 {
    let normalized_a = normalize_address(a);
    let normalized_b = normalize_address(b);
    if normalized_a.is_empty() || normalized_b.is_empty() {
        return 0.0;
    }
    strsim::sorensen_dice(&normalized_a, &normalized_b)
}

/// Non-exact tax-id comparison: equal digits 1.0, one a substring of the
/// other 0.8, anything else 0
pub fn tax_id_similarity(a: &TaxId, b: &TaxId) -> f64 {
    let digits_a = a.as_str();
    let digits_b = b.as_str();
    if digits_a == digits_b {
        1.0
    } else if digits_a.contains(digits_b) || digits_b.contains(digits_a) {
        0.8
    } else {
        0.0
    }
}

/// Overall pairwise similarity in [0, 1]
pub fn record_similarity(a: &CompanyRecord, b: &CompanyRecord) -> f64 {
    // Exact tax-id match short-circuits everything else
    if let (Some(tax_a), Some(tax_b)) = (&a.tax_id, &b.tax_id) {
        if tax_a == tax_b {
            return 1.0;
        }
    }

    let mut total = 0.0;
    let mut weight = 0.0;

    total += name_similarity(&a.company_name, &b.company_name) * NAME_WEIGHT;
    weight += NAME_WEIGHT;

    if let (Some(site_a), Some(site_b)) = (&a.website, &b.website) {
        total += website_similarity(site_a, site_b) * WEBSITE_WEIGHT;
        weight += WEBSITE_WEIGHT;
    }

    if let (Some(addr_a), Some(addr_b)) = (&a.address, &b.address) {
        total += address_similarity(addr_a, addr_b) * ADDRESS_WEIGHT;
        weight += ADDRESS_WEIGHT;
    }

    if let (Some(tax_a), Some(tax_b)) = (&a.tax_id, &b.tax_id) {
        total += tax_id_similarity(tax_a, tax_b) * TAX_ID_WEIGHT;
        weight += TAX_ID_WEIGHT;
    }

    if weight > 0.0 {
        total / weight
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firmscan_common::Country;

    #[test]
    fn test_name_normalization_strips_legal_forms() {
        assert_eq!(normalize_company_name("Acme Software S.R.L."), "acme software");
        assert_eq!(normalize_company_name("ACME SOFTWARE SRL"), "acme software");
        assert_eq!(normalize_company_name("Beta, Inc."), "beta");
    }

    #[test]
    fn test_name_similarity_equal_after_normalization() {
        assert_eq!(
            name_similarity("Acme Software SRL", "ACME Software S.R.L."),
            1.0
        );
    }

    #[test]
    fn test_name_similarity_different_names_low() {
        let similarity = name_similarity("Alpha Tech", "Beta Consulting");
        assert!(similarity < 0.5, "got {similarity}");
    }

    #[test]
    fn test_website_similarity_ignores_scheme_and_www() {
        let a: Url = "http://www.acme.it/contact".parse().unwrap();
        let b: Url = "https://acme.it".parse().unwrap();
        assert_eq!(website_similarity(&a, &b), 1.0);
    }

    #[test]
    fn test_tax_id_substring_rule() {
        let full = TaxId::parse("12345678", Country::Romania).unwrap();
        let partial = TaxId::parse("345678", Country::Romania).unwrap();
        let other = TaxId::parse("99", Country::Romania).unwrap();
        assert_eq!(tax_id_similarity(&full, &full), 1.0);
        assert_eq!(tax_id_similarity(&full, &partial), 0.8);
        assert_eq!(tax_id_similarity(&full, &other), 0.0);
    }

    #[test]
    fn test_exact_tax_id_overrides_everything() {
        let mut a = CompanyRecord::bare("Acme Software SRL", Country::Italy);
        let mut b = CompanyRecord::bare("Completely Different Name", Country::Italy);
        a.tax_id = TaxId::parse("12345678901", Country::Italy);
        b.tax_id = TaxId::parse("12345678901", Country::Italy);
        assert_eq!(record_similarity(&a, &b), 1.0);
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let mut a = CompanyRecord::bare("Acme Software", Country::Italy);
        let mut b = CompanyRecord::bare("Acme Soft", Country::Italy);
        a.website = Some("https://acme.it".parse().unwrap());
        b.website = Some("https://acmesoft.it".parse().unwrap());
        a.address = Some("Via Roma 1 Milano".into());
        b.address = Some("Via Roma 1, Milano".into());
        let ab = record_similarity(&a, &b);
        let ba = record_similarity(&b, &a);
        assert!((ab - ba).abs() < f64::EPSILON);
    }

    #[test]
    fn test_weights_renormalize_over_present_signals() {
        // Name-only comparison still reaches 1.0 for identical names
        let a = CompanyRecord::bare("Acme", Country::Italy);
        let b = CompanyRecord::bare("Acme", Country::Italy);
        assert_eq!(record_similarity(&a, &b), 1.0);
    }
}
