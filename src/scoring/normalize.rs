use super::evidence::EvidenceSet;
use super::statement::StatementFilter;

/// Scale one resource's evidence onto a common range, drop statements outside
/// `filter`, and compute `weighted_total`.
///
/// The steps run in a fixed order. Scaling uses the range of the whole set,
/// including statements the filter will drop, so an entry's best classifier
/// match is not inflated just because its competitors were filtered out.
///
/// 1. `expert` is divided by the set's maximum, when that maximum is positive
/// 2. `usage` likewise
/// 3. `text_based` is min-max scaled, with the minimum clamped to at most 0,
///    but only when some score is negative; otherwise it is left as is
/// 4. records whose statement the filter rejects are removed
/// 5. `weighted_total = expert + usage + text_based`
pub fn normalize(mut evidence: EvidenceSet, filter: &StatementFilter) -> EvidenceSet {
    let max_expert = evidence.values().map(|r| r.expert).fold(0.0, f64::max);
    if max_expert > 0.0 {
        for record in evidence.values_mut() {
            record.expert /= max_expert;
        }
    }

    let max_usage = evidence.values().map(|r| r.usage).fold(0.0, f64::max);
    if max_usage > 0.0 {
        for record in evidence.values_mut() {
            record.usage /= max_usage;
        }
    }

    let max_text = evidence
        .values()
        .map(|r| r.text_based)
        .fold(f64::NEG_INFINITY, f64::max);
    let min_text = evidence.values().map(|r| r.text_based).fold(0.0, f64::min);
    if min_text < 0.0 {
        let range = max_text - min_text;
        for record in evidence.values_mut() {
            record.text_based = if range > 0.0 {
                (record.text_based - min_text) / range
            } else {
                // Every score is the same negative value
                1.0
            };
        }
    }

    evidence.retain(|key, _| filter.admits(&key.statement));

    for record in evidence.values_mut() {
        // Equal weights for now
        record.weighted_total = record.expert + record.usage + record.text_based;
    }

    evidence
}
