use reqwest::Url;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tracing::debug;

use super::types::{Classifier, ClassifierError, ClassifierMatch};

/// Classifier reached over HTTP: `GET {endpoint}?area=..&year=..&text=..`
/// answered with a JSON array of `{"Item", "Score"}` objects.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: reqwest::Client,
    endpoint: Url,
    retries: usize,
}

impl HttpClassifier {
    /// Create a client for `endpoint`. `timeout` bounds each attempt;
    /// `retries` is the number of extra attempts after a transient failure.
    pub fn new(endpoint: &str, timeout: Duration, retries: usize) -> Result<Self, ClassifierError> {
        let endpoint = Url::parse(endpoint).map_err(|e| ClassifierError::InvalidUrl {
            url: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("resource-align/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClassifierError::Transport)?;
        Ok(Self {
            client,
            endpoint,
            retries,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build the query URL; free text is form-urlencoded.
    fn query_url(&self, area: &str, year: &str, text: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("area", area)
            .append_pair("year", year)
            .append_pair("text", text);
        url
    }

    async fn fetch(&self, url: &Url) -> Result<Vec<ClassifierMatch>, ClassifierError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(ClassifierError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifierError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(ClassifierError::Transport)?;
        serde_json::from_slice(&body).map_err(ClassifierError::Decode)
    }
}

impl Classifier for HttpClassifier {
    async fn classify(
        &self,
        area: &str,
        year: &str,
        text: &str,
    ) -> Result<Vec<ClassifierMatch>, ClassifierError> {
        let url = self.query_url(area, year, text);
        debug!(%url, "querying classifier");

        let retry_strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(5))
            .take(self.retries);

        let matches = RetryIf::spawn(
            retry_strategy,
            || self.fetch(&url),
            |e: &ClassifierError| e.is_transient(),
        )
        .await?;

        debug!(matches = matches.len(), "classifier answered");
        Ok(matches)
    }
}
