//! Domain-level error taxonomy for triage.

use triage_state::{BugId, StorageError};

/// Triage errors.
///
/// Ambiguous identity hints are not an error: they are recorded on the
/// decision and routing falls back to the classifier.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("classifier unavailable: no candidates returned")]
    ClassifierUnavailable,

    #[error("classifier did not answer within {after_ms} ms")]
    ClassifierTimeout { after_ms: u64 },

    #[error("invalid threshold {value}: must be within [0, 1]")]
    InvalidThreshold { value: f64 },

    #[error("invalid report: {0}")]
    InvalidReport(String),

    #[error("duplicate report: a bug titled {title:?} already exists ({existing})")]
    DuplicateReport { title: String, existing: BugId },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl TriageError {
    /// Whether retrying the same report later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TriageError::ClassifierUnavailable | TriageError::ClassifierTimeout { .. }
        )
    }
}

/// Result type for triage operations.
pub type Result<T> = std::result::Result<T, TriageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifier_errors_are_retryable() {
        assert!(TriageError::ClassifierUnavailable.is_retryable());
        assert!(TriageError::ClassifierTimeout { after_ms: 10 }.is_retryable());
        assert!(!TriageError::InvalidThreshold { value: 1.5 }.is_retryable());
        assert!(!TriageError::Config("x".to_string()).is_retryable());
    }

    #[test]
    fn test_duplicate_report_display() {
        let err = TriageError::DuplicateReport {
            title: "App crash".to_string(),
            existing: BugId::from("b-7"),
        };
        let msg = err.to_string();
        assert!(msg.contains("App crash"));
        assert!(msg.contains("b-7"));
    }

    #[test]
    fn test_storage_error_converts() {
        let err: TriageError = StorageError::Backend("down".to_string()).into();
        assert!(err.to_string().contains("storage error"));
        assert!(err.to_string().contains("down"));
    }
}
