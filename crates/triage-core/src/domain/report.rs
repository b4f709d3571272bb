//! Incoming defect reports.

use serde::{Deserialize, Serialize};
use triage_state::ReportSource;

use super::error::{Result, TriageError};

const DEFAULT_PRIORITY: &str = "medium";

fn default_priority() -> String {
    DEFAULT_PRIORITY.to_string()
}

/// A defect report as received, before any triage.
///
/// Deserializes from the bulk-import JSON shape
/// (`{"title", "body", "source"?, "assignee_hint"?, "priority"?}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReport {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub source: ReportSource,
    /// Assignee name as written by the reporter or an external tracker.
    #[serde(default, alias = "assignee")]
    pub assignee_hint: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: String,
}

impl RawReport {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            source: ReportSource::Manual,
            assignee_hint: None,
            priority: default_priority(),
        }
    }

    pub fn with_source(mut self, source: ReportSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_assignee_hint(mut self, hint: impl Into<String>) -> Self {
        self.assignee_hint = Some(hint.into());
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = priority.into();
        self
    }

    /// Title and body joined the way they are fed to the classifier and tagger.
    pub fn combined_text(&self) -> String {
        if self.body.is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.title, self.body)
        }
    }

    /// Reject reports that cannot be stored or de-duplicated.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(TriageError::InvalidReport(
                "title must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
