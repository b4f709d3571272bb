//! SurrealDB row types
//!
//! These mirror the tables created in `migrations` and are converted to and
//! from the `storage_traits` types at the `SurrealRecordStore` boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage_traits::{
    AssignmentKind, AssignmentRecord, BugId, BugRecord, CandidateRecord, Identity, NewBug,
    NewPrediction, PredictionRecord, StorageResult,
};

/// Module for serializing chrono DateTime to SurrealDB datetime format
mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

/// Tags are stored comma-joined; `None` marks a bug that was never tagged.
fn join_tags(tags: &[String]) -> Option<String> {
    if tags.is_empty() {
        None
    } else {
        Some(tags.join(","))
    }
}

fn split_tags(tags: Option<&str>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Row in the `bugs` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugRow {
    /// SurrealDB record ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    pub bug_id: String,
    pub title: String,
    pub body: String,
    pub source: String,
    pub priority: String,
    pub tags: Option<String>,
    pub status: String,
    #[serde(with = "surreal_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "surreal_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl BugRow {
    /// Create a new row in "open" state
    pub fn new(bug_id: &BugId, bug: &NewBug) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            bug_id: bug_id.0.clone(),
            title: bug.title.clone(),
            body: bug.body.clone(),
            source: bug.source.as_str().to_string(),
            priority: bug.priority.clone(),
            tags: join_tags(&bug.tags),
            status: "open".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_record(self) -> StorageResult<BugRecord> {
        Ok(BugRecord {
            bug_id: BugId(self.bug_id),
            source: self.source.parse()?,
            status: self.status.parse()?,
            tags: split_tags(self.tags.as_deref()),
            title: self.title,
            body: self.body,
            priority: self.priority,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Encode a tag list for an UPDATE statement
pub fn encode_tags(tags: &[String]) -> Option<String> {
    join_tags(tags)
}

/// Row in the `predictions` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    pub bug_id: String,
    pub predicted_developer: String,
    pub confidence: f64,
    /// JSON-encoded ranked candidate list
    pub top_alternatives: String,
    pub threshold_used: f64,
    pub matched_from_external_hint: bool,
    #[serde(with = "surreal_datetime")]
    pub predicted_at: DateTime<Utc>,
}

impl PredictionRow {
    pub fn new(bug_id: &BugId, prediction: &NewPrediction) -> StorageResult<Self> {
        Ok(Self {
            id: None,
            bug_id: bug_id.0.clone(),
            predicted_developer: prediction.predicted_developer.clone(),
            confidence: prediction.confidence,
            top_alternatives: serde_json::to_string(&prediction.alternatives)?,
            threshold_used: prediction.threshold_used,
            matched_from_external_hint: prediction.matched_from_external_hint,
            predicted_at: Utc::now(),
        })
    }

    pub fn into_record(self) -> StorageResult<PredictionRecord> {
        let alternatives: Vec<CandidateRecord> = serde_json::from_str(&self.top_alternatives)?;
        Ok(PredictionRecord {
            bug_id: BugId(self.bug_id),
            predicted_developer: self.predicted_developer,
            confidence: self.confidence,
            alternatives,
            threshold_used: self.threshold_used,
            matched_from_external_hint: self.matched_from_external_hint,
            predicted_at: self.predicted_at,
        })
    }
}

/// Row in the `assignments` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    pub bug_id: String,
    pub developer_name: String,
    pub assignment_type: String,
    #[serde(with = "surreal_datetime")]
    pub assigned_at: DateTime<Utc>,
}

impl AssignmentRow {
    pub fn new(bug_id: &BugId, developer_name: &str, kind: AssignmentKind) -> Self {
        Self {
            id: None,
            bug_id: bug_id.0.clone(),
            developer_name: developer_name.to_string(),
            assignment_type: kind.as_str().to_string(),
            assigned_at: Utc::now(),
        }
    }

    pub fn into_record(self) -> StorageResult<AssignmentRecord> {
        Ok(AssignmentRecord {
            bug_id: BugId(self.bug_id),
            developer_name: self.developer_name,
            kind: self.assignment_type.parse()?,
            assigned_at: self.assigned_at,
        })
    }
}

/// Row in the `identities` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    pub identity_id: String,
    pub full_name: String,
    pub username: String,
    pub email: Option<String>,
    pub role: String,
}

impl From<&Identity> for IdentityRow {
    fn from(identity: &Identity) -> Self {
        Self {
            id: None,
            identity_id: identity.id.clone(),
            full_name: identity.display_name.clone(),
            username: identity.login.clone(),
            email: identity.email.clone(),
            role: identity.role.clone(),
        }
    }
}

impl From<IdentityRow> for Identity {
    fn from(row: IdentityRow) -> Self {
        Identity {
            id: row.identity_id,
            display_name: row.full_name,
            login: row.username,
            email: row.email,
            role: row.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage_traits::{BugStatus, ReportSource};

    #[test]
    fn tags_round_trip_through_comma_string() {
        let tags = vec!["UI/UX".to_string(), "Performance".to_string()];
        let encoded = join_tags(&tags);
        assert_eq!(encoded.as_deref(), Some("UI/UX,Performance"));
        assert_eq!(split_tags(encoded.as_deref()), tags);
    }

    #[test]
    fn empty_tags_are_stored_as_null() {
        assert_eq!(join_tags(&[]), None);
        assert!(split_tags(None).is_empty());
    }

    #[test]
    fn new_bug_row_is_open() {
        let bug = NewBug {
            title: "App crash".to_string(),
            body: "Crashes on start".to_string(),
            source: ReportSource::BulkImport,
            priority: "medium".to_string(),
            tags: vec![],
        };
        let row = BugRow::new(&BugId::from("b-1"), &bug);
        let record = row.into_record().unwrap();
        assert_eq!(record.status, BugStatus::Open);
        assert_eq!(record.source, ReportSource::BulkImport);
        assert!(record.tags.is_empty());
    }
}
