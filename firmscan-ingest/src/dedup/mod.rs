//! Cross-source deduplication
//!
//! A batch of normalized records (possibly from several sources) is scanned
//! for near-duplicate clusters; each cluster collapses into one record via
//! a field-wise union where the primary's values win and duplicates only
//! fill gaps. The engine is stateless and safe to run concurrently from
//! independent batches.

pub mod similarity;

pub use similarity::{record_similarity, SIMILARITY_THRESHOLD};

use crate::models::{CompanyRecord, MERGED_PLATFORM, MULTIPLE_SOURCES};
use crate::normalize::quality;
use serde::Serialize;
use tracing::{debug, info};

/// Outcome of one deduplication pass
#[derive(Debug, Clone, Serialize)]
pub struct DeduplicationResult {
    /// Records in the input batch
    pub original: usize,
    /// Duplicate clusters found (each merged into one record)
    pub duplicates: usize,
    /// Records in the output batch
    pub merged: usize,
    pub companies: Vec<CompanyRecord>,
}

/// Stateless duplicate-detection and merge engine
#[derive(Debug, Default)]
pub struct DeduplicationEngine;

impl DeduplicationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Find duplicate clusters and merge each into one record.
    ///
    /// Records that match nothing pass through unchanged, in input order
    /// relative to each other. Tolerates arbitrarily sparse records; a
    /// pair sharing no comparable signal simply scores 0.
    pub fn process(&self, records: Vec<CompanyRecord>) -> DeduplicationResult {
        let original = records.len();
        let mut claimed = vec![false; records.len()];
        let mut clusters = 0usize;
        let mut companies = Vec::with_capacity(records.len());

        for i in 0..records.len() {
            if claimed[i] {
                continue;
            }

            let mut duplicates: Vec<(usize, f64)> = Vec::new();
            for j in (i + 1)..records.len() {
                if claimed[j] {
                    continue;
                }
                let score = record_similarity(&records[i], &records[j]);
                if score >= SIMILARITY_THRESHOLD {
                    claimed[j] = true;
                    duplicates.push((j, score));
                }
            }

            if duplicates.is_empty() {
                companies.push(records[i].clone());
                continue;
            }

            clusters += 1;
            let max_similarity = duplicates
                .iter()
                .map(|(_, s)| *s)
                .fold(f64::MIN, f64::max);
            debug!(
                primary = %records[i].company_name,
                duplicates = duplicates.len(),
                max_similarity,
                "Merging duplicate cluster"
            );
            companies.push(merge_cluster(
                &records[i],
                duplicates.iter().map(|(j, _)| &records[*j]),
            ));
        }

        let merged = companies.len();
        info!(original, duplicates = clusters, merged, "Deduplication complete");
        DeduplicationResult {
            original,
            duplicates: clusters,
            merged,
            companies,
        }
    }
}

fn fill_gap<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
    if slot.is_none() {
        *slot = value.clone();
    }
}

fn union_into(target: &mut Vec<String>, values: &[String]) {
    for value in values {
        if !target.contains(value) {
            target.push(value.clone());
        }
    }
}

/// Fold a cluster into one record: primary's non-null values are never
/// overwritten, duplicates only fill nulls; list fields union as sets.
fn merge_cluster<'a>(
    primary: &CompanyRecord,
    duplicates: impl Iterator<Item = &'a CompanyRecord>,
) -> CompanyRecord {
    let mut merged = primary.clone();

    for duplicate in duplicates {
        fill_gap(&mut merged.legal_name, &duplicate.legal_name);
        fill_gap(&mut merged.tax_id, &duplicate.tax_id);
        fill_gap(&mut merged.registration_number, &duplicate.registration_number);
        fill_gap(&mut merged.website, &duplicate.website);
        fill_gap(&mut merged.email, &duplicate.email);
        fill_gap(&mut merged.phone, &duplicate.phone);
        fill_gap(&mut merged.address, &duplicate.address);
        fill_gap(&mut merged.city, &duplicate.city);
        fill_gap(&mut merged.description, &duplicate.description);
        fill_gap(&mut merged.legal_form, &duplicate.legal_form);
        fill_gap(&mut merged.registration_date, &duplicate.registration_date);
        fill_gap(&mut merged.share_capital, &duplicate.share_capital);
        fill_gap(&mut merged.industry, &duplicate.industry);
        fill_gap(&mut merged.linkedin_url, &duplicate.linkedin_url);
        union_into(&mut merged.industry_codes, &duplicate.industry_codes);
        union_into(&mut merged.technologies, &duplicate.technologies);
        union_into(&mut merged.specialties, &duplicate.specialties);
    }

    merged.source_platform = MERGED_PLATFORM.to_string();
    merged.source_url = MULTIPLE_SOURCES.to_string();
    quality::rescore(&mut merged);
    merged
}
