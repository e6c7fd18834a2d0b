use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A resource in the repository, with its expert citations and usage paradata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub url: String,
    pub content: String,
    /// Statement id -> observed hit count
    pub paradata: BTreeMap<String, u64>,
    /// Statement ids cited by an expert; a repeated id is a repeated citation
    pub manual_alignment: Vec<String>,
    pub learning_area: BTreeSet<String>,
    pub year: BTreeSet<String>,
}

impl ResourceEntry {
    /// True if the entry covers any of the requested years.
    /// An empty request imposes no constraint.
    pub fn covers_year(&self, years: &BTreeSet<String>) -> bool {
        years.is_empty() || !self.year.is_disjoint(years)
    }

    /// True if the entry covers any of the requested learning areas.
    /// An empty request imposes no constraint.
    pub fn covers_learning_area(&self, areas: &BTreeSet<String>) -> bool {
        areas.is_empty() || !self.learning_area.is_disjoint(areas)
    }
}

/// Immutable view of the whole repository, keyed by resource URL.
///
/// Built once at startup and shared behind an `Arc`; nothing mutates it while
/// requests are in flight.
#[derive(Debug, Clone, Default)]
pub struct RepositorySnapshot {
    entries: BTreeMap<String, ResourceEntry>,
}

impl RepositorySnapshot {
    /// Build a snapshot. Entries sharing a URL overwrite earlier ones.
    pub fn from_entries(entries: impl IntoIterator<Item = ResourceEntry>) -> Self {
        let mut map = BTreeMap::new();
        for entry in entries {
            map.insert(entry.url.clone(), entry);
        }
        Self { entries: map }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, url: &str) -> Option<&ResourceEntry> {
        self.entries.get(url)
    }

    /// Entries in ascending URL order
    pub fn entries(&self) -> impl Iterator<Item = &ResourceEntry> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str, content: &str) -> ResourceEntry {
        ResourceEntry {
            url: url.to_string(),
            content: content.to_string(),
            paradata: BTreeMap::new(),
            manual_alignment: vec![],
            learning_area: BTreeSet::from(["Science".to_string()]),
            year: BTreeSet::from(["7".to_string(), "8".to_string()]),
        }
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_last_write_wins_on_duplicate_url() {
        let snapshot = RepositorySnapshot::from_entries(vec![
            entry("http://a", "first"),
            entry("http://b", "other"),
            entry("http://a", "second"),
        ]);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("http://a").unwrap().content, "second");
    }

    #[test]
    fn test_entries_iterate_in_url_order() {
        let snapshot = RepositorySnapshot::from_entries(vec![
            entry("http://c", ""),
            entry("http://a", ""),
            entry("http://b", ""),
        ]);
        let urls: Vec<_> = snapshot.entries().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec!["http://a", "http://b", "http://c"]);
    }

    #[test]
    fn test_empty_request_is_unconstrained() {
        let e = entry("http://a", "");
        assert!(e.covers_year(&BTreeSet::new()));
        assert!(e.covers_learning_area(&BTreeSet::new()));
    }

    #[test]
    fn test_coverage_needs_overlap() {
        let e = entry("http://a", "");
        assert!(e.covers_year(&set(&["8", "9"])));
        assert!(!e.covers_year(&set(&["9", "10"])));
        assert!(e.covers_learning_area(&set(&["Science", "Mathematics"])));
        assert!(!e.covers_learning_area(&set(&["English"])));
    }
}
