use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

/// One candidate statement scored against a piece of text.
///
/// The score scale is classifier-defined; only the ordering is meaningful.
/// The reference classifier returns negative log-likelihoods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierMatch {
    #[serde(rename = "Item")]
    pub item: String,
    #[serde(rename = "Score")]
    pub score: f64,
}

impl ClassifierMatch {
    pub fn new(item: impl Into<String>, score: f64) -> Self {
        Self {
            item: item.into(),
            score,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("invalid classifier URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("classifier request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("classifier returned HTTP {0}")]
    Status(u16),

    #[error("classifier returned malformed data: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ClassifierError {
    /// Whether retrying the same call might succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ClassifierError::Transport(_) => true,
            ClassifierError::Status(code) => *code >= 500 || *code == 429,
            ClassifierError::InvalidUrl { .. } | ClassifierError::Decode(_) => false,
        }
    }
}

/// The external curriculum classifier.
///
/// Given a learning area, a year and free text, returns every candidate
/// statement with its score. `area` and `year` are passed through verbatim
/// (comma separated lists) so the classifier applies its own curriculum
/// scoping.
pub trait Classifier: Send + Sync {
    fn classify(
        &self,
        area: &str,
        year: &str,
        text: &str,
    ) -> impl Future<Output = Result<Vec<ClassifierMatch>, ClassifierError>> + Send;
}
