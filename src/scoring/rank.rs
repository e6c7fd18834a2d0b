use std::cmp::Ordering;
use std::collections::HashSet;

use super::evidence::{EvidenceRecord, EvidenceSet};

/// Ranking order: `weighted_total` descending, ties by `url` then `statement`
/// ascending. A total order, so the output never depends on the order in
/// which evidence sets were produced.
pub fn compare_records(a: &EvidenceRecord, b: &EvidenceRecord) -> Ordering {
    b.weighted_total
        .total_cmp(&a.weighted_total)
        .then_with(|| a.url.cmp(&b.url))
        .then_with(|| a.statement.cmp(&b.statement))
}

/// Merge scored evidence sets into one ranking with a single record, the
/// best-supported statement, per resource URL.
pub fn rank(sets: impl IntoIterator<Item = EvidenceSet>) -> Vec<EvidenceRecord> {
    let mut records: Vec<EvidenceRecord> = sets
        .into_iter()
        .flat_map(|set| set.into_values())
        .collect();

    records.sort_by(compare_records);

    // First occurrence per URL is its highest-scoring record
    let mut seen_urls = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen_urls.insert(record.url.clone()))
        .collect()
}
