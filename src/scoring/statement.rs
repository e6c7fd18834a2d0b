use std::collections::BTreeSet;

use crate::classifier::{Classifier, ClassifierError};

/// Content-neutral text sent to the classifier so that it returns every
/// statement in scope for the area/year, rather than a text-specific subset.
pub const NEUTRAL_PROBE: &str = "a a a a a a a a";

/// Set of statement ids a request is restricted to.
///
/// An empty filter admits every statement; it never means "reject all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementFilter {
    statements: BTreeSet<String>,
}

impl StatementFilter {
    pub fn unconstrained() -> Self {
        Self::default()
    }

    pub fn from_statements(statements: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            statements: statements.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a filter from classifier candidates, keeping only those in
    /// `allow_list` unless the allow-list is empty.
    ///
    /// Only candidate ids ever enter the set. If none survive, the filter is
    /// unconstrained.
    pub fn from_candidates<'a>(
        candidates: impl IntoIterator<Item = &'a str>,
        allow_list: &BTreeSet<String>,
    ) -> Self {
        Self::from_statements(
            candidates
                .into_iter()
                .filter(|id| allow_list.is_empty() || allow_list.contains(*id)),
        )
    }

    pub fn admits(&self, statement: &str) -> bool {
        self.statements.is_empty() || self.statements.contains(statement)
    }

    pub fn is_unconstrained(&self) -> bool {
        self.statements.is_empty()
    }

    /// Number of admitted statements; zero for an unconstrained filter
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Ask the classifier which statements apply to `area`/`year` and narrow
/// them by `allow_list`.
///
/// Errors are returned rather than swallowed: every later step is bounded by
/// this filter, so a request cannot proceed without it.
pub async fn resolve_statement_filter<C: Classifier>(
    classifier: &C,
    area: &str,
    year: &str,
    allow_list: &BTreeSet<String>,
) -> Result<StatementFilter, ClassifierError> {
    let candidates = classifier.classify(area, year, NEUTRAL_PROBE).await?;
    Ok(StatementFilter::from_candidates(
        candidates.iter().map(|m| m.item.as_str()),
        allow_list,
    ))
}
