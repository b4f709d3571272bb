//! Runtime configuration for triage.
//!
//! Thresholds are validated once when the configuration is built and then
//! passed explicitly to every routing call.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{Result, TriageError};

/// Auto-assignment threshold used by interactive prediction.
pub const DEFAULT_PREDICT_THRESHOLD: f64 = 0.50;
/// Auto-assignment threshold used by bulk import.
pub const DEFAULT_IMPORT_THRESHOLD: f64 = 0.40;
pub const DEFAULT_TOP_N: usize = 3;
pub const DEFAULT_IMPORT_CONCURRENCY: usize = 4;
pub const DEFAULT_CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(10);

/// A confidence threshold in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Threshold(f64);

impl Threshold {
    /// Validate `value`; NaN and values outside `[0, 1]` are rejected.
    pub fn new(value: f64) -> Result<Self> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(TriageError::InvalidThreshold { value })
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Threshold {
    type Error = TriageError;

    fn try_from(value: f64) -> Result<Self> {
        Threshold::new(value)
    }
}

impl From<Threshold> for f64 {
    fn from(t: Threshold) -> Self {
        t.0
    }
}

impl std::fmt::Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Call path a report is triaged on. Each context has its own threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriageContext {
    Predict,
    BulkImport,
}

/// Triage settings.
#[derive(Debug, Clone, PartialEq)]
pub struct TriageConfig {
    pub predict_threshold: Threshold,
    pub import_threshold: Threshold,
    /// Number of ranked candidates requested from the classifier
    pub top_n: usize,
    /// Maximum reports triaged concurrently during bulk import
    pub import_concurrency: usize,
    pub classifier_timeout: Duration,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            predict_threshold: Threshold(DEFAULT_PREDICT_THRESHOLD),
            import_threshold: Threshold(DEFAULT_IMPORT_THRESHOLD),
            top_n: DEFAULT_TOP_N,
            import_concurrency: DEFAULT_IMPORT_CONCURRENCY,
            classifier_timeout: DEFAULT_CLASSIFIER_TIMEOUT,
        }
    }
}

impl TriageConfig {
    /// Threshold for the given call path.
    pub fn threshold_for(&self, context: TriageContext) -> Threshold {
        match context {
            TriageContext::Predict => self.predict_threshold,
            TriageContext::BulkImport => self.import_threshold,
        }
    }

    pub fn with_predict_threshold(mut self, threshold: Threshold) -> Self {
        self.predict_threshold = threshold;
        self
    }

    pub fn with_import_threshold(mut self, threshold: Threshold) -> Self {
        self.import_threshold = threshold;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n.max(1);
        self
    }

    pub fn with_import_concurrency(mut self, n: usize) -> Self {
        self.import_concurrency = n.max(1);
        self
    }

    pub fn with_classifier_timeout(mut self, timeout: Duration) -> Self {
        self.classifier_timeout = timeout;
        self
    }

    /// Create from environment variables, falling back to defaults.
    ///
    /// Reads:
    /// - TRIAGE_PREDICT_THRESHOLD (default: 0.50)
    /// - TRIAGE_IMPORT_THRESHOLD (default: 0.40)
    /// - TRIAGE_TOP_N (default: 3)
    /// - TRIAGE_IMPORT_CONCURRENCY (default: 4)
    /// - TRIAGE_CLASSIFIER_TIMEOUT_MS (default: 10000)
    ///
    /// Any value that is set but unparsable or out of range is an error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`TriageConfig::from_env`] over an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("TRIAGE_PREDICT_THRESHOLD") {
            config.predict_threshold = Threshold::new(parse_var("TRIAGE_PREDICT_THRESHOLD", &v)?)?;
        }
        if let Some(v) = lookup("TRIAGE_IMPORT_THRESHOLD") {
            config.import_threshold = Threshold::new(parse_var("TRIAGE_IMPORT_THRESHOLD", &v)?)?;
        }
        if let Some(v) = lookup("TRIAGE_TOP_N") {
            config.top_n = positive("TRIAGE_TOP_N", parse_var("TRIAGE_TOP_N", &v)?)?;
        }
        if let Some(v) = lookup("TRIAGE_IMPORT_CONCURRENCY") {
            config.import_concurrency = positive(
                "TRIAGE_IMPORT_CONCURRENCY",
                parse_var("TRIAGE_IMPORT_CONCURRENCY", &v)?,
            )?;
        }
        if let Some(v) = lookup("TRIAGE_CLASSIFIER_TIMEOUT_MS") {
            config.classifier_timeout =
                Duration::from_millis(parse_var("TRIAGE_CLASSIFIER_TIMEOUT_MS", &v)?);
        }

        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| TriageError::Config(format!("{key}: cannot parse {raw:?}")))
}

fn positive(key: &str, n: usize) -> Result<usize> {
    if n == 0 {
        Err(TriageError::Config(format!("{key} must be at least 1")))
    } else {
        Ok(n)
    }
}
