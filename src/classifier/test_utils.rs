//! In-memory classifier double for tests that exercise the ranking pipeline.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::types::{Classifier, ClassifierError, ClassifierMatch};

/// Answers by looking up the queried text. Unknown text gets an empty answer;
/// text registered with [`FixedClassifier::fail_on`] gets HTTP 503.
#[derive(Debug, Default)]
pub struct FixedClassifier {
    responses: HashMap<String, Vec<ClassifierMatch>>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    queries: Mutex<Vec<(String, String)>>,
}

impl FixedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, text: &str, matches: Vec<ClassifierMatch>) -> Self {
        self.responses.insert(text.to_string(), matches);
        self
    }

    pub fn fail_on(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(area, year)` of every call, in call order
    pub fn queries(&self) -> Vec<(String, String)> {
        self.queries.lock().unwrap().clone()
    }

    /// Highest number of calls observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Classifier for FixedClassifier {
    async fn classify(
        &self,
        area: &str,
        year: &str,
        text: &str,
    ) -> Result<Vec<ClassifierMatch>, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries
            .lock()
            .unwrap()
            .push((area.to_string(), year.to_string()));
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.failing.contains(text) {
            return Err(ClassifierError::Status(503));
        }
        Ok(self.responses.get(text).cloned().unwrap_or_default())
    }
}
