use serde::Serialize;
use std::collections::BTreeMap;

use super::statement::StatementFilter;
use crate::classifier::ClassifierMatch;
use crate::repository::ResourceEntry;

/// Identifies one (statement, resource) pairing
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EvidenceKey {
    pub statement: String,
    pub url: String,
}

impl EvidenceKey {
    pub fn new(statement: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            url: url.into(),
        }
    }
}

/// Evidence that a resource aligns with a statement.
///
/// Raw values after extraction; scaled into `[0, 1]` and summed into
/// `weighted_total` by [`normalize`](super::normalize::normalize).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvidenceRecord {
    pub url: String,
    pub statement: String,
    /// Expert citation count
    pub expert: f64,
    /// Summed paradata hits
    pub usage: f64,
    /// Classifier score; 0 when the classifier offered none
    pub text_based: f64,
    pub weighted_total: f64,
    pub content: String,
}

impl EvidenceRecord {
    fn empty(statement: &str, entry: &ResourceEntry) -> Self {
        Self {
            url: entry.url.clone(),
            statement: statement.to_string(),
            expert: 0.0,
            usage: 0.0,
            text_based: 0.0,
            weighted_total: 0.0,
            content: entry.content.clone(),
        }
    }
}

/// Evidence records for one resource, keyed by (statement, url)
pub type EvidenceSet = BTreeMap<EvidenceKey, EvidenceRecord>;

/// Build the raw evidence for one entry.
///
/// - every `manual_alignment` citation admitted by `filter` adds 1 to `expert`
/// - every `paradata` count admitted by `filter` adds to `usage`
/// - every classifier match sets `text_based`, whether or not the filter
///   admits it; the filter is applied after normalization so the scaling
///   range covers the full candidate set
///
/// `text_matches` is `None` when the classifier call for this entry failed;
/// the entry then contributes expert and usage evidence only.
pub fn extract_evidence(
    entry: &ResourceEntry,
    filter: &StatementFilter,
    text_matches: Option<&[ClassifierMatch]>,
) -> EvidenceSet {
    let mut evidence = EvidenceSet::new();

    for statement in &entry.manual_alignment {
        if !filter.admits(statement) {
            continue;
        }
        record_for(&mut evidence, statement, entry).expert += 1.0;
    }

    for (statement, hits) in &entry.paradata {
        if !filter.admits(statement) {
            continue;
        }
        record_for(&mut evidence, statement, entry).usage += *hits as f64;
    }

    for m in text_matches.unwrap_or_default() {
        record_for(&mut evidence, &m.item, entry).text_based = m.score;
    }

    evidence
}

fn record_for<'a>(
    evidence: &'a mut EvidenceSet,
    statement: &str,
    entry: &ResourceEntry,
) -> &'a mut EvidenceRecord {
    evidence
        .entry(EvidenceKey::new(statement, entry.url.as_str()))
        .or_insert_with(|| EvidenceRecord::empty(statement, entry))
}
