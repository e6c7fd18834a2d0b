use std::collections::{BTreeMap, BTreeSet};

use super::types::ResourceEntry;

/// Build a Science / year 8 entry with the given evidence
pub fn sample_entry(
    url: &str,
    content: &str,
    manual_alignment: &[&str],
    paradata: &[(&str, u64)],
) -> ResourceEntry {
    ResourceEntry {
        url: url.to_string(),
        content: content.to_string(),
        paradata: paradata
            .iter()
            .map(|(s, n)| (s.to_string(), *n))
            .collect::<BTreeMap<_, _>>(),
        manual_alignment: manual_alignment.iter().map(|s| s.to_string()).collect(),
        learning_area: BTreeSet::from(["Science".to_string()]),
        year: BTreeSet::from(["8".to_string()]),
    }
}
