//! Storage trait definitions for bug triage
//!
//! These traits define the persistence collaborators of the triage core:
//! - `RecordStore`: bug, prediction and assignment records plus aggregates
//! - `Roster`: the set of known identities a hint is resolved against
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// Identifiers and enumerations
// ---------------------------------------------------------------------------

/// Unique identifier for a stored bug
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BugId(pub String);

impl BugId {
    /// Generate a new random BugId
    pub fn new() -> Self {
        BugId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BugId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BugId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BugId {
    fn from(s: &str) -> Self {
        BugId(s.to_string())
    }
}

/// Where a report entered the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReportSource {
    #[default]
    Manual,
    ImportedTracker,
    BulkImport,
}

impl ReportSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportSource::Manual => "manual",
            ReportSource::ImportedTracker => "imported-tracker",
            ReportSource::BulkImport => "bulk-import",
        }
    }
}

impl fmt::Display for ReportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportSource {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(ReportSource::Manual),
            "imported-tracker" => Ok(ReportSource::ImportedTracker),
            "bulk-import" => Ok(ReportSource::BulkImport),
            other => Err(StorageError::UnknownValue {
                field: "source",
                value: other.to_string(),
            }),
        }
    }
}

/// Lifecycle status of a stored bug.
///
/// Transitions: `Open` on insert, `Assigned` after an auto assignment,
/// `ManualReview` after a manual assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BugStatus {
    Open,
    Assigned,
    ManualReview,
}

impl BugStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BugStatus::Open => "open",
            BugStatus::Assigned => "assigned",
            BugStatus::ManualReview => "manual-review",
        }
    }
}

impl fmt::Display for BugStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BugStatus {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(BugStatus::Open),
            "assigned" => Ok(BugStatus::Assigned),
            "manual-review" => Ok(BugStatus::ManualReview),
            other => Err(StorageError::UnknownValue {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// How an assignment was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentKind {
    Auto,
    Manual,
}

impl AssignmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentKind::Auto => "auto",
            AssignmentKind::Manual => "manual",
        }
    }

    /// Status a bug moves to once an assignment of this kind is recorded.
    pub fn resulting_status(&self) -> BugStatus {
        match self {
            AssignmentKind::Auto => BugStatus::Assigned,
            AssignmentKind::Manual => BugStatus::ManualReview,
        }
    }
}

impl fmt::Display for AssignmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(AssignmentKind::Auto),
            "manual" => Ok(AssignmentKind::Manual),
            other => Err(StorageError::UnknownValue {
                field: "assignment_type",
                value: other.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A bug about to be inserted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBug {
    pub title: String,
    pub body: String,
    pub source: ReportSource,
    /// Free-form priority label ("low", "medium", "critical", ...)
    pub priority: String,
    /// Ordered category tags. Empty means "not tagged yet".
    pub tags: Vec<String>,
}

/// A stored bug
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BugRecord {
    pub bug_id: BugId,
    pub title: String,
    pub body: String,
    pub source: ReportSource,
    pub priority: String,
    pub tags: Vec<String>,
    pub status: BugStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of an atomic duplicate-checked insert
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// The bug was new and has been stored
    Inserted(BugRecord),
    /// A bug with the same title already existed; nothing was written
    Duplicate(BugRecord),
}

/// One ranked candidate as persisted alongside a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub developer: String,
    pub confidence: f64,
}

/// A prediction about to be recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPrediction {
    pub predicted_developer: String,
    pub confidence: f64,
    /// Full ranked list returned by the classifier, for audit and review
    pub alternatives: Vec<CandidateRecord>,
    pub threshold_used: f64,
    pub matched_from_external_hint: bool,
}

/// A stored prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub bug_id: BugId,
    pub predicted_developer: String,
    pub confidence: f64,
    pub alternatives: Vec<CandidateRecord>,
    pub threshold_used: f64,
    pub matched_from_external_hint: bool,
    pub predicted_at: DateTime<Utc>,
}

/// A stored assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub bug_id: BugId,
    pub developer_name: String,
    pub kind: AssignmentKind,
    pub assigned_at: DateTime<Utc>,
}

/// Dashboard aggregates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriageStats {
    pub total_bugs: u64,
    pub auto_assigned: u64,
    pub manual_review: u64,
    pub bugs_per_developer: BTreeMap<String, u64>,
    pub pending_bugs: u64,
}

/// A known candidate assignee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    /// Canonical display name reported on a match ("Alice Smith")
    pub display_name: String,
    /// Login handle ("alice_s")
    pub login: String,
    /// Contact address; its local part is one of the matchable names
    pub email: Option<String>,
    /// "developer", "reporter", "admin", ...
    pub role: String,
}

impl Identity {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        login: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            login: login.into(),
            email: None,
            role: "developer".to_string(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    /// The part of the contact address before `@`, if any.
    pub fn email_local_part(&self) -> Option<&str> {
        self.email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .filter(|local| !local.is_empty())
    }
}

// ---------------------------------------------------------------------------
// RecordStore
// ---------------------------------------------------------------------------

/// Persistence for bugs, predictions and assignments.
///
/// Guarantees:
/// - `insert_bug` checks for an existing title and inserts under one logical
///   transaction; two concurrent inserts of the same title yield exactly one
///   `Inserted` and one `Duplicate`.
/// - `insert_assignment` moves the bug to `kind.resulting_status()`.
/// - `list_bugs` returns bugs in insertion order.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Look up a bug by exact title.
    async fn find_by_title(&self, title: &str) -> StorageResult<Option<BugRecord>>;

    /// Insert a bug unless one with the same title exists.
    async fn insert_bug(&self, bug: NewBug) -> StorageResult<InsertOutcome>;

    /// Fetch a bug. Returns `StorageError::BugNotFound` if absent.
    async fn get_bug(&self, bug_id: &BugId) -> StorageResult<BugRecord>;

    /// Delete a bug with its predictions and assignments. Returns whether it existed.
    async fn delete_bug(&self, bug_id: &BugId) -> StorageResult<bool>;

    /// Replace the tags of a bug.
    async fn update_tags(&self, bug_id: &BugId, tags: Vec<String>) -> StorageResult<()>;

    /// Bugs that were stored without tags.
    async fn list_untagged(&self) -> StorageResult<Vec<BugRecord>>;

    /// Page through bugs.
    async fn list_bugs(&self, offset: usize, limit: usize) -> StorageResult<Vec<BugRecord>>;

    /// Record a prediction for a bug.
    async fn insert_prediction(
        &self,
        bug_id: &BugId,
        prediction: NewPrediction,
    ) -> StorageResult<PredictionRecord>;

    /// Most recent prediction for a bug, if any.
    async fn latest_prediction(&self, bug_id: &BugId) -> StorageResult<Option<PredictionRecord>>;

    /// Record an assignment and update the bug status.
    async fn insert_assignment(
        &self,
        bug_id: &BugId,
        developer_name: &str,
        kind: AssignmentKind,
    ) -> StorageResult<AssignmentRecord>;

    /// All assignments for a bug, oldest first.
    async fn assignments(&self, bug_id: &BugId) -> StorageResult<Vec<AssignmentRecord>>;

    /// Aggregate counters for dashboards.
    async fn aggregate_stats(&self) -> StorageResult<TriageStats>;
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// Source of known identities.
#[async_trait]
pub trait Roster: Send + Sync {
    /// List identities, optionally restricted to one role.
    async fn list_identities(&self, role: Option<&str>) -> StorageResult<Vec<Identity>>;

    /// Register a new identity. Fails with `DuplicateIdentity` if the id is taken.
    async fn register_identity(&self, identity: Identity) -> StorageResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_local_part_is_prefix_before_at() {
        let dev = Identity::new("2", "Bob Jones", "bob-dev").with_email("bjones@company.com");
        assert_eq!(dev.email_local_part(), Some("bjones"));
    }

    #[test]
    fn email_local_part_absent_without_email() {
        let dev = Identity::new("3", "Charlie Chaplin", "charlie");
        assert_eq!(dev.email_local_part(), None);

        let odd = Identity::new("4", "Odd", "odd").with_email("@nowhere");
        assert_eq!(odd.email_local_part(), None);
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [BugStatus::Open, BugStatus::Assigned, BugStatus::ManualReview] {
            assert_eq!(status.as_str().parse::<BugStatus>().unwrap(), status);
        }
        assert!("closed".parse::<BugStatus>().is_err());
    }

    #[test]
    fn assignment_kind_drives_status() {
        assert_eq!(AssignmentKind::Auto.resulting_status(), BugStatus::Assigned);
        assert_eq!(
            AssignmentKind::Manual.resulting_status(),
            BugStatus::ManualReview
        );
    }

    #[test]
    fn source_serializes_kebab_case() {
        let json = serde_json::to_string(&ReportSource::ImportedTracker).unwrap();
        assert_eq!(json, "\"imported-tracker\"");
        assert_eq!(
            "bulk-import".parse::<ReportSource>().unwrap(),
            ReportSource::BulkImport
        );
    }
}
