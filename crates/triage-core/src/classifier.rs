//! The classifier seam.
//!
//! The assignee model is opaque: anything that can turn report text into a
//! ranked list of `(identity, confidence)` pairs implements [`Classifier`].
//! An empty list means the classifier is unavailable.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{Result, ScoredCandidate, TriageError};

/// Scores report text against the known identities.
///
/// Implementations are constructed once and shared read-only.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Scored candidates, `top_n` requested. Empty when unavailable.
    ///
    /// Callers rank and cut the list themselves; implementations may return
    /// more than `top_n` entries in any order.
    async fn score(&self, text: &str, top_n: usize) -> Vec<ScoredCandidate>;
}

// ---------------------------------------------------------------------------
// StaticClassifier
// ---------------------------------------------------------------------------

/// Deterministic in-process classifier.
///
/// Returns the candidates of the first rule whose keyword occurs in the
/// text, or the default list when none does.
#[derive(Debug, Default)]
pub struct StaticClassifier {
    rules: Vec<(String, Vec<ScoredCandidate>)>,
    default: Vec<ScoredCandidate>,
    calls: AtomicUsize,
}

impl StaticClassifier {
    /// Always answers with `candidates`.
    pub fn new(candidates: Vec<ScoredCandidate>) -> Self {
        Self {
            default: candidates,
            ..Self::default()
        }
    }

    /// Always answers with an empty list.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Answer with `candidates` when `keyword` occurs in the scored text.
    pub fn with_rule(mut self, keyword: impl Into<String>, candidates: Vec<ScoredCandidate>) -> Self {
        self.rules.push((keyword.into(), candidates));
        self
    }

    /// Number of `score` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Classifier for StaticClassifier {
    async fn score(&self, text: &str, top_n: usize) -> Vec<ScoredCandidate> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let chosen = self
            .rules
            .iter()
            .find(|(keyword, _)| text.contains(keyword.as_str()))
            .map(|(_, candidates)| candidates)
            .unwrap_or(&self.default);
        chosen.iter().take(top_n).cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// HttpClassifier
// ---------------------------------------------------------------------------

const USER_AGENT: &str = concat!("bugtriage/", env!("CARGO_PKG_VERSION"));

/// Connection settings for a remote inference endpoint.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Full URL of the scoring endpoint
    pub url: String,
    /// Per-request transport timeout
    pub timeout: Duration,
}

impl ClassifierConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - TRIAGE_CLASSIFIER_URL (required)
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("TRIAGE_CLASSIFIER_URL")
            .map_err(|_| TriageError::Config("TRIAGE_CLASSIFIER_URL not set".to_string()))?;
        Ok(Self::new(url))
    }
}

#[derive(Serialize)]
struct ScoreRequest<'a> {
    text: &'a str,
    top_n: usize,
}

/// Classifier backed by an HTTP inference service.
///
/// POSTs `{"text", "top_n"}` and expects `[{"developer", "confidence"}]`.
/// Transport, status and decode failures are logged and reported as an
/// empty list.
pub struct HttpClassifier {
    config: ClassifierConfig,
    http_client: reqwest::Client,
}

impl HttpClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| TriageError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ClassifierConfig::from_env()?)
    }

    async fn request(&self, text: &str, top_n: usize) -> reqwest::Result<Vec<ScoredCandidate>> {
        self.http_client
            .post(&self.config.url)
            .json(&ScoreRequest { text, top_n })
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<ScoredCandidate>>()
            .await
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn score(&self, text: &str, top_n: usize) -> Vec<ScoredCandidate> {
        match self.request(text, top_n).await {
            Ok(candidates) => {
                debug!(url = %self.config.url, count = candidates.len(), "classifier answered");
                candidates
            }
            Err(e) => {
                warn!(url = %self.config.url, error = %e, "classifier request failed");
                Vec::new()
            }
        }
    }
}
