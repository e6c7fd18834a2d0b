use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Years offered when a request does not name any
pub const DEFAULT_YEARS: [&str; 14] = [
    "K", "P", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12",
];

/// Top-level configuration.
///
/// Example YAML:
/// ```yaml
/// repository: ./repository
/// server:
///   bind: 127.0.0.1:1577
/// classifier:
///   url: http://localhost:1576/curricalign
///   timeout: 10s
///   retries: 2
/// ranking:
///   max_concurrent_classifications: 10
///   request_timeout: 60s
///   require_learning_area: true
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding `*.txt` / `*.json` repository files
    #[serde(default = "default_repository")]
    pub repository: PathBuf,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub ranking: RankingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repository: default_repository(),
            server: ServerConfig::default(),
            classifier: ClassifierConfig::default(),
            ranking: RankingConfig::default(),
        }
    }
}

fn default_repository() -> PathBuf {
    PathBuf::from("./repository")
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:1577".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Classifier endpoint; `area`, `year` and `text` are appended as query parameters
    #[serde(default = "default_classifier_url")]
    pub url: String,

    /// Per-attempt timeout, e.g. "10s" or "500ms"
    #[serde(default = "default_classifier_timeout")]
    pub timeout: String,

    /// Extra attempts after a transient failure
    #[serde(default = "default_retries")]
    pub retries: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            url: default_classifier_url(),
            timeout: default_classifier_timeout(),
            retries: default_retries(),
        }
    }
}

fn default_classifier_url() -> String {
    "http://localhost:1576/curricalign".to_string()
}

fn default_classifier_timeout() -> String {
    "10s".to_string()
}

fn default_retries() -> usize {
    2
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RankingConfig {
    /// Upper bound on in-flight classifier calls per request
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_classifications: usize,

    /// Deadline for a whole ranking request, e.g. "60s"
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,

    /// Reject requests that do not name a learning area
    #[serde(default = "default_require_learning_area")]
    pub require_learning_area: bool,

    /// Years used when a request names none
    #[serde(default = "default_years")]
    pub default_years: Vec<String>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            max_concurrent_classifications: default_max_concurrent(),
            request_timeout: default_request_timeout(),
            require_learning_area: default_require_learning_area(),
            default_years: default_years(),
        }
    }
}

fn default_max_concurrent() -> usize {
    10
}

fn default_request_timeout() -> String {
    "60s".to_string()
}

fn default_require_learning_area() -> bool {
    true
}

fn default_years() -> Vec<String> {
    DEFAULT_YEARS.iter().map(|y| y.to_string()).collect()
}
