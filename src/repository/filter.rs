use super::types::{RepositorySnapshot, ResourceEntry};
use std::collections::BTreeSet;

/// Select the entries applicable to the requested learning areas and years.
///
/// An entry is kept when it shares at least one year with `years` and at least
/// one learning area with `areas`. An empty set on either axis does not
/// constrain that axis. Entries come back in snapshot (URL) order.
pub fn filter_applicable<'a>(
    snapshot: &'a RepositorySnapshot,
    areas: &BTreeSet<String>,
    years: &BTreeSet<String>,
) -> Vec<&'a ResourceEntry> {
    snapshot
        .entries()
        .filter(|entry| entry.covers_year(years) && entry.covers_learning_area(areas))
        .collect()
}
