use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::classifier::{Classifier, ClassifierMatch};
use crate::config::RankingConfig;
use crate::error::AlignError;
use crate::repository::{filter_applicable, parse_list, RepositorySnapshot, ResourceEntry};
use crate::scoring::{
    extract_evidence, normalize, rank, resolve_statement_filter, EvidenceRecord, EvidenceSet,
    StatementFilter,
};

/// Runtime knobs for ranking requests, parsed from [`RankingConfig`]
#[derive(Debug, Clone, PartialEq)]
pub struct AlignSettings {
    pub max_concurrent_classifications: usize,
    pub request_timeout: Duration,
    pub require_learning_area: bool,
    pub default_years: Vec<String>,
}

impl AlignSettings {
    pub fn from_config(config: &RankingConfig) -> Result<Self> {
        let request_timeout = humantime::parse_duration(&config.request_timeout)
            .with_context(|| format!("Invalid request_timeout '{}'", config.request_timeout))?;
        Ok(Self {
            max_concurrent_classifications: config.max_concurrent_classifications.max(1),
            request_timeout,
            require_learning_area: config.require_learning_area,
            default_years: config.default_years.clone(),
        })
    }
}

impl Default for AlignSettings {
    fn default() -> Self {
        Self {
            max_concurrent_classifications: 10,
            request_timeout: Duration::from_secs(60),
            require_learning_area: true,
            default_years: crate::config::DEFAULT_YEARS
                .iter()
                .map(|y| y.to_string())
                .collect(),
        }
    }
}

/// A parsed ranking request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignRequest {
    pub learning_areas: BTreeSet<String>,
    pub years: BTreeSet<String>,
    /// Statement ids the caller wants; empty means no preference
    pub allowed_statements: BTreeSet<String>,
    /// Display cap applied after ranking
    pub limit: Option<usize>,
    /// Area and year strings as the caller sent them, for the classifier
    area_query: String,
    year_query: String,
}

impl AlignRequest {
    /// Build a request from raw comma separated parameters.
    ///
    /// A missing `year` falls back to `settings.default_years`. A missing
    /// `area` is rejected when `settings.require_learning_area` is set.
    pub fn from_params(
        area: Option<&str>,
        year: Option<&str>,
        item: Option<&str>,
        limit: Option<usize>,
        settings: &AlignSettings,
    ) -> Result<Self, AlignError> {
        let learning_areas = area.map(parse_list).unwrap_or_default();
        if learning_areas.is_empty() && settings.require_learning_area {
            return Err(AlignError::MissingParameter("area"));
        }

        let mut years = year.map(parse_list).unwrap_or_default();
        let year_query = if years.is_empty() {
            years = settings.default_years.iter().cloned().collect();
            settings.default_years.join(",")
        } else {
            year.unwrap_or_default().to_string()
        };

        Ok(Self {
            learning_areas,
            years,
            allowed_statements: item.map(parse_list).unwrap_or_default(),
            limit,
            area_query: area.unwrap_or_default().to_string(),
            year_query,
        })
    }

    /// Learning area parameter passed through to the classifier unchanged
    pub fn area_param(&self) -> &str {
        &self.area_query
    }

    /// Year parameter passed through to the classifier; the configured
    /// default years, comma joined, when the caller named none
    pub fn year_param(&self) -> &str {
        &self.year_query
    }
}

/// Rank the repository's resources for one request.
///
/// Resolves the applicable statements, scores every applicable resource with
/// at most `max_concurrent_classifications` classifier calls in flight, and
/// ranks once all of them have finished. Dropping the returned future cancels
/// every outstanding call; so does exceeding `request_timeout`.
pub async fn rank_resources<C: Classifier>(
    snapshot: &RepositorySnapshot,
    classifier: &C,
    request: &AlignRequest,
    settings: &AlignSettings,
) -> Result<Vec<EvidenceRecord>, AlignError> {
    match tokio::time::timeout(
        settings.request_timeout,
        rank_within_deadline(snapshot, classifier, request, settings),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => {
            warn!(
                timeout = %humantime::format_duration(settings.request_timeout),
                "ranking request timed out"
            );
            Err(AlignError::Timeout(settings.request_timeout))
        }
    }
}

async fn rank_within_deadline<C: Classifier>(
    snapshot: &RepositorySnapshot,
    classifier: &C,
    request: &AlignRequest,
    settings: &AlignSettings,
) -> Result<Vec<EvidenceRecord>, AlignError> {
    let area = request.area_param();
    let year = request.year_param();

    let applicable = filter_applicable(snapshot, &request.learning_areas, &request.years);
    debug!(
        applicable = applicable.len(),
        total = snapshot.len(),
        "filtered repository"
    );

    let filter = resolve_statement_filter(classifier, area, year, &request.allowed_statements)
        .await
        .map_err(AlignError::StatementFilter)?;
    debug!(
        statements = filter.len(),
        unconstrained = filter.is_unconstrained(),
        "resolved statement filter"
    );

    let max_in_flight = settings.max_concurrent_classifications.max(1);
    let mut pending = applicable.into_iter();
    let mut futures = FuturesUnordered::new();
    let mut scored = Vec::new();

    // Fill initial window
    for entry in pending.by_ref().take(max_in_flight) {
        futures.push(score_entry(classifier, entry, &filter, area, year));
    }

    // Collect results and keep the window full
    while let Some(evidence) = futures.next().await {
        scored.push(evidence);
        if let Some(entry) = pending.next() {
            futures.push(score_entry(classifier, entry, &filter, area, year));
        }
    }

    let resources = scored.len();
    let mut ranked = rank(scored);
    if let Some(limit) = request.limit {
        ranked.truncate(limit);
    }

    info!(
        area = %area,
        year = %year,
        resources,
        ranked = ranked.len(),
        "ranked resources"
    );
    Ok(ranked)
}

/// Extract and normalize one resource's evidence
async fn score_entry<C: Classifier>(
    classifier: &C,
    entry: &ResourceEntry,
    filter: &StatementFilter,
    area: &str,
    year: &str,
) -> EvidenceSet {
    let matches = classify_entry(classifier, entry, area, year).await;
    normalize(extract_evidence(entry, filter, matches.as_deref()), filter)
}

/// Classify one resource's content, or `None` if the classifier failed.
///
/// A failure only costs this resource its text evidence.
pub async fn classify_entry<C: Classifier>(
    classifier: &C,
    entry: &ResourceEntry,
    area: &str,
    year: &str,
) -> Option<Vec<ClassifierMatch>> {
    match classifier.classify(area, year, &entry.content).await {
        Ok(matches) => Some(matches),
        Err(e) => {
            warn!(
                url = %entry.url,
                error = %e,
                "classifier failed; using expert and usage evidence only"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::test_utils::FixedClassifier;
    use crate::repository::test_utils::sample_entry;
    use crate::scoring::NEUTRAL_PROBE;

    fn settings() -> AlignSettings {
        AlignSettings::default()
    }

    fn science_request() -> AlignRequest {
        AlignRequest::from_params(Some("Science"), Some("8"), None, None, &settings()).unwrap()
    }

    fn probe(statements: &[&str]) -> Vec<ClassifierMatch> {
        statements
            .iter()
            .map(|s| ClassifierMatch::new(*s, -1.0))
            .collect()
    }

    fn pairs(ranked: &[EvidenceRecord]) -> Vec<(&str, &str)> {
        ranked
            .iter()
            .map(|r| (r.url.as_str(), r.statement.as_str()))
            .collect()
    }

    #[test]
    fn test_request_requires_area_when_strict() {
        let err = AlignRequest::from_params(None, Some("8"), None, None, &settings()).unwrap_err();
        assert!(matches!(err, AlignError::MissingParameter("area")));
        let err = AlignRequest::from_params(Some(" , "), None, None, None, &settings()).unwrap_err();
        assert!(matches!(err, AlignError::MissingParameter("area")));
    }

    #[test]
    fn test_request_area_optional_when_lenient() {
        let lenient = AlignSettings {
            require_learning_area: false,
            ..settings()
        };
        let request = AlignRequest::from_params(None, None, None, None, &lenient).unwrap();
        assert!(request.learning_areas.is_empty());
        assert_eq!(request.area_param(), "");
    }

    #[test]
    fn test_request_defaults_years() {
        let request =
            AlignRequest::from_params(Some("Science"), None, None, None, &settings()).unwrap();
        assert_eq!(request.years.len(), 14);
        assert!(request.years.contains("K"));
        assert!(request.years.contains("12"));
        assert_eq!(request.year_param(), "K,P,1,2,3,4,5,6,7,8,9,10,11,12");
    }

    #[test]
    fn test_request_parses_lists() {
        let request = AlignRequest::from_params(
            Some("\"Science\",Mathematics"),
            Some("7;8"),
            Some("S1, S2"),
            Some(5),
            &settings(),
        )
        .unwrap();
        assert_eq!(request.area_param(), "\"Science\",Mathematics");
        assert_eq!(request.year_param(), "7;8");
        assert_eq!(
            request.learning_areas,
            BTreeSet::from(["Mathematics".to_string(), "Science".to_string()])
        );
        assert_eq!(request.allowed_statements.len(), 2);
        assert_eq!(request.limit, Some(5));
    }

    #[test]
    fn test_settings_from_config() {
        let config = RankingConfig {
            max_concurrent_classifications: 0,
            request_timeout: "1500ms".to_string(),
            ..RankingConfig::default()
        };
        let parsed = AlignSettings::from_config(&config).unwrap();
        assert_eq!(parsed.max_concurrent_classifications, 1);
        assert_eq!(parsed.request_timeout, Duration::from_millis(1500));

        let bad = RankingConfig {
            request_timeout: "soon".to_string(),
            ..RankingConfig::default()
        };
        assert!(AlignSettings::from_config(&bad).is_err());
    }

    #[tokio::test]
    async fn test_single_resource_mixed_evidence() {
        let snapshot = RepositorySnapshot::from_entries(vec![sample_entry(
            "http://r1",
            "r1 text",
            &["S1", "S1", "S2"],
            &[("S1", 10)],
        )]);
        let classifier = FixedClassifier::new()
            .respond(NEUTRAL_PROBE, probe(&["S1", "S2"]))
            .respond(
                "r1 text",
                vec![
                    ClassifierMatch::new("S1", -2.0),
                    ClassifierMatch::new("S2", -5.0),
                ],
            );

        let ranked = rank_resources(&snapshot, &classifier, &science_request(), &settings())
            .await
            .unwrap();

        assert_eq!(pairs(&ranked), vec![("http://r1", "S1")]);
        assert!((ranked[0].weighted_total - 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_classifier_failure_degrades_single_resource() {
        let snapshot = RepositorySnapshot::from_entries(vec![
            sample_entry("http://r1", "r1 text", &[], &[]),
            sample_entry("http://r2", "r2 text", &["S2"], &[("S2", 3)]),
            sample_entry("http://r3", "r3 text", &[], &[]),
        ]);
        let classifier = FixedClassifier::new()
            .respond(NEUTRAL_PROBE, probe(&["S1", "S2", "S3"]))
            .respond("r1 text", vec![ClassifierMatch::new("S1", -1.0)])
            .fail_on("r2 text")
            .respond("r3 text", vec![ClassifierMatch::new("S3", -2.0)]);

        let ranked = rank_resources(&snapshot, &classifier, &science_request(), &settings())
            .await
            .unwrap();

        assert_eq!(ranked.len(), 3);
        let r2 = ranked.iter().find(|r| r.url == "http://r2").unwrap();
        assert_eq!(r2.statement, "S2");
        assert_eq!(r2.text_based, 0.0);
        assert!((r2.weighted_total - 2.0).abs() < 1e-9);
        // probe + one call per resource
        assert_eq!(classifier.calls(), 4);
    }

    #[tokio::test]
    async fn test_statement_filter_failure_fails_request() {
        let snapshot =
            RepositorySnapshot::from_entries(vec![sample_entry("http://r1", "r1 text", &["S1"], &[])]);
        let classifier = FixedClassifier::new().fail_on(NEUTRAL_PROBE);

        let err = rank_resources(&snapshot, &classifier, &science_request(), &settings())
            .await
            .unwrap_err();
        assert!(matches!(err, AlignError::StatementFilter(_)));
        // No resource was classified
        assert_eq!(classifier.calls(), 1);
    }

    #[tokio::test]
    async fn test_only_applicable_resources_are_ranked() {
        let mut maths = sample_entry("http://maths", "maths text", &["S1"], &[]);
        maths.learning_area = BTreeSet::from(["Mathematics".to_string()]);
        let mut year10 = sample_entry("http://year10", "year10 text", &["S1"], &[]);
        year10.year = BTreeSet::from(["10".to_string()]);
        let snapshot = RepositorySnapshot::from_entries(vec![
            maths,
            year10,
            sample_entry("http://science8", "science text", &["S1"], &[]),
        ]);
        let classifier = FixedClassifier::new();

        let ranked = rank_resources(&snapshot, &classifier, &science_request(), &settings())
            .await
            .unwrap();
        assert_eq!(pairs(&ranked), vec![("http://science8", "S1")]);
    }

    #[tokio::test]
    async fn test_allow_list_narrows_statements() {
        let snapshot = RepositorySnapshot::from_entries(vec![sample_entry(
            "http://r1",
            "r1 text",
            &["S1", "S1", "S2"],
            &[],
        )]);
        let classifier = FixedClassifier::new().respond(NEUTRAL_PROBE, probe(&["S1", "S2"]));
        let request =
            AlignRequest::from_params(Some("Science"), Some("8"), Some("S2"), None, &settings())
                .unwrap();

        let ranked = rank_resources(&snapshot, &classifier, &request, &settings())
            .await
            .unwrap();
        assert_eq!(pairs(&ranked), vec![("http://r1", "S2")]);
        assert!((ranked[0].expert - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_allow_list_outside_candidates_leaves_ranking_unfiltered() {
        let snapshot = RepositorySnapshot::from_entries(vec![sample_entry(
            "http://r1",
            "r1 text",
            &["S1", "S1", "S2"],
            &[],
        )]);
        let classifier = FixedClassifier::new().respond(NEUTRAL_PROBE, probe(&["S1", "S2"]));
        let request =
            AlignRequest::from_params(Some("Science"), Some("8"), Some("S9"), None, &settings())
                .unwrap();

        let ranked = rank_resources(&snapshot, &classifier, &request, &settings())
            .await
            .unwrap();
        assert_eq!(pairs(&ranked), vec![("http://r1", "S1")]);
    }

    #[tokio::test]
    async fn test_classifier_receives_caller_parameters() {
        let snapshot = RepositorySnapshot::from_entries(vec![sample_entry(
            "http://r1",
            "r1 text",
            &["S1"],
            &[],
        )]);
        let classifier = FixedClassifier::new();
        let request = AlignRequest::from_params(
            Some("Science,\"Mathematics\""),
            Some("8,7"),
            None,
            None,
            &settings(),
        )
        .unwrap();

        rank_resources(&snapshot, &classifier, &request, &settings())
            .await
            .unwrap();

        let expected = ("Science,\"Mathematics\"".to_string(), "8,7".to_string());
        assert_eq!(classifier.queries(), vec![expected.clone(), expected]);
    }

    #[tokio::test]
    async fn test_ranking_is_deterministic_across_concurrency() {
        let entries: Vec<_> = (0..12)
            .map(|i| {
                sample_entry(
                    &format!("http://r{:02}", i),
                    &format!("text {}", i),
                    &["S1", "S2"],
                    &[("S1", (i % 3) as u64)],
                )
            })
            .collect();
        let snapshot = RepositorySnapshot::from_entries(entries);
        let mut classifier = FixedClassifier::new()
            .respond(NEUTRAL_PROBE, probe(&["S1", "S2", "S3"]))
            .with_delay(Duration::from_millis(1));
        for i in 0..12 {
            classifier = classifier.respond(
                &format!("text {}", i),
                vec![
                    ClassifierMatch::new("S3", -((i % 4) as f64)),
                    ClassifierMatch::new("S2", -4.0),
                ],
            );
        }

        let serial = AlignSettings {
            max_concurrent_classifications: 1,
            ..settings()
        };
        let first = rank_resources(&snapshot, &classifier, &science_request(), &serial)
            .await
            .unwrap();
        let second = rank_resources(&snapshot, &classifier, &science_request(), &settings())
            .await
            .unwrap();

        assert_eq!(first.len(), 12);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let entries: Vec<_> = (0..9)
            .map(|i| sample_entry(&format!("http://r{}", i), &format!("text {}", i), &["S1"], &[]))
            .collect();
        let snapshot = RepositorySnapshot::from_entries(entries);
        let classifier = FixedClassifier::new().with_delay(Duration::from_millis(10));
        let bounded = AlignSettings {
            max_concurrent_classifications: 3,
            ..settings()
        };

        let ranked = rank_resources(&snapshot, &classifier, &science_request(), &bounded)
            .await
            .unwrap();
        assert_eq!(ranked.len(), 9);
        assert!(classifier.max_in_flight() <= 3);
    }

    #[tokio::test]
    async fn test_limit_truncates_after_dedup() {
        let snapshot = RepositorySnapshot::from_entries(vec![
            sample_entry("http://a", "a", &["S1", "S2"], &[]),
            sample_entry("http://b", "b", &["S1"], &[]),
            sample_entry("http://c", "c", &["S1"], &[]),
        ]);
        let classifier = FixedClassifier::new();
        let request =
            AlignRequest::from_params(Some("Science"), None, None, Some(2), &settings()).unwrap();

        let ranked = rank_resources(&snapshot, &classifier, &request, &settings())
            .await
            .unwrap();
        assert_eq!(pairs(&ranked), vec![("http://a", "S1"), ("http://b", "S1")]);
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let snapshot =
            RepositorySnapshot::from_entries(vec![sample_entry("http://r1", "r1 text", &["S1"], &[])]);
        let classifier = FixedClassifier::new().with_delay(Duration::from_millis(500));
        let impatient = AlignSettings {
            request_timeout: Duration::from_millis(20),
            ..settings()
        };

        let err = rank_resources(&snapshot, &classifier, &science_request(), &impatient)
            .await
            .unwrap_err();
        assert!(matches!(err, AlignError::Timeout(_)));
    }
}
