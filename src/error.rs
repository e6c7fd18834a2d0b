use std::time::Duration;
use thiserror::Error;

use crate::classifier::ClassifierError;

/// Why a ranking request produced no ranking.
///
/// Per-resource classifier failures are not represented here: they degrade
/// that resource's text evidence and the request carries on.
#[derive(Debug, Error)]
pub enum AlignError {
    #[error("{0} parameter not supplied")]
    MissingParameter(&'static str),

    #[error("could not resolve applicable curriculum statements: {0}")]
    StatementFilter(#[source] ClassifierError),

    #[error("ranking did not finish within {}", format_timeout(.0))]
    Timeout(Duration),
}

fn format_timeout(timeout: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*timeout)
}
