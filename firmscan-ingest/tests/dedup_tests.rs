//! Deduplication scenarios across the public API

use firmscan_common::Country;
use firmscan_ingest::dedup::{record_similarity, DeduplicationEngine, SIMILARITY_THRESHOLD};
use firmscan_ingest::models::{CompanyRecord, TaxId, MERGED_PLATFORM};
use firmscan_ingest::normalize::quality;

fn record(name: &str, country: Country) -> CompanyRecord {
    let mut record = CompanyRecord::bare(name, country);
    record.source_platform = "test".into();
    record.source_url = "https://example.test".into();
    quality::rescore(&mut record);
    record
}

#[test]
fn same_tax_id_merges_despite_name_styling() {
    let mut a = record("Acme Software SRL", Country::Italy);
    let mut b = record("ACME Software S.R.L.", Country::Italy);
    a.tax_id = TaxId::parse("12345678901", Country::Italy);
    b.tax_id = TaxId::parse("12345678901", Country::Italy);

    assert_eq!(record_similarity(&a, &b), 1.0);

    let result = DeduplicationEngine::new().process(vec![a, b]);
    assert_eq!(result.original, 2);
    assert_eq!(result.duplicates, 1);
    assert_eq!(result.merged, 1);
    let merged = &result.companies[0];
    assert_eq!(merged.tax_id.as_ref().unwrap().as_str(), "12345678901");
    assert_eq!(merged.source_platform, MERGED_PLATFORM);
}

#[test]
fn unrelated_companies_pass_through() {
    let mut a = record("Alpha Tech", Country::Romania);
    let mut b = record("Beta Consulting", Country::Romania);
    a.website = Some("http://alphatech.ro".parse().unwrap());
    b.website = Some("http://betaconsulting.ro".parse().unwrap());

    let similarity = record_similarity(&a, &b);
    assert!(
        similarity < SIMILARITY_THRESHOLD,
        "similarity {similarity} should stay below the threshold"
    );

    let result = DeduplicationEngine::new().process(vec![a.clone(), b.clone()]);
    assert_eq!(result.duplicates, 0);
    assert_eq!(result.merged, 2);
    assert_eq!(result.companies, vec![a, b]);
}

#[test]
fn similarity_is_symmetric_for_mixed_signals() {
    let mut a = record("Gamma Data SRL", Country::Italy);
    let mut b = record("Gamma Dati", Country::Italy);
    a.tax_id = TaxId::parse("11122233344", Country::Italy);
    b.tax_id = TaxId::parse("22233344", Country::Romania); // substring digits
    a.address = Some("Via Milano 5".into());
    b.address = Some("Via Milano 5, Milano".into());

    assert_eq!(record_similarity(&a, &b), record_similarity(&b, &a));
}

#[test]
fn merge_fills_gaps_without_overwriting_primary() {
    let mut primary = record("Acme Software", Country::Italy);
    let mut duplicate = record("Acme Software", Country::Italy);
    primary.description = Some("Primary description".into());
    duplicate.description = Some("Duplicate description".into());
    duplicate.city = Some("Milano".into());
    duplicate.technologies = vec!["rust".into()];

    let result = DeduplicationEngine::new().process(vec![primary, duplicate]);
    assert_eq!(result.merged, 1);
    let merged = &result.companies[0];
    assert_eq!(merged.description.as_deref(), Some("Primary description"));
    assert_eq!(merged.city.as_deref(), Some("Milano"));
    assert_eq!(merged.technologies, vec!["rust"]);
    assert_eq!(merged.data_quality_score, quality::score(merged));
}

#[test]
fn empty_batch_yields_empty_result() {
    let result = DeduplicationEngine::new().process(Vec::new());
    assert_eq!(result.original, 0);
    assert_eq!(result.duplicates, 0);
    assert_eq!(result.merged, 0);
    assert!(result.companies.is_empty());
}

#[test]
fn sparse_records_never_panic() {
    // Records carrying nothing but a name share no optional signal
    let batch: Vec<CompanyRecord> = (0..5)
        .map(|i| record(&format!("Company {i}"), Country::Romania))
        .collect();
    let result = DeduplicationEngine::new().process(batch);
    assert_eq!(result.original, 5);
    assert_eq!(result.merged, 5);
}
