//! SurrealDB-backed RecordStore and Roster implementation
//!
//! Uses the row types in `schema`, converting to/from `storage_traits` types
//! at the boundary.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::handle;
use crate::schema::{encode_tags, AssignmentRow, BugRow, IdentityRow, PredictionRow};
use crate::storage_traits::{
    AssignmentKind, AssignmentRecord, BugId, BugRecord, BugStatus, Identity, InsertOutcome,
    NewBug, NewPrediction, PredictionRecord, RecordStore, Roster, StorageResult, TriageStats,
};

fn backend(e: surrealdb::Error) -> StorageError {
    StorageError::Backend(e.to_string())
}

/// SurrealDB-backed implementation of [`RecordStore`] and [`Roster`].
#[derive(Clone)]
pub struct SurrealRecordStore {
    db: Surreal<Any>,
}

impl SurrealRecordStore {
    /// Wrap an already-migrated connection.
    pub fn new(db: Surreal<Any>) -> Self {
        Self { db }
    }

    /// Create an in-memory instance for testing.
    pub async fn in_memory() -> crate::Result<Self> {
        let db = handle::connect_in_memory().await?;
        info!("SurrealRecordStore ready (in-memory)");
        Ok(Self { db })
    }

    /// Create from environment variables.
    ///
    /// Uses the env-var chain of [`handle::connect_from_env`].
    pub async fn from_env() -> crate::Result<Self> {
        let db = handle::connect_from_env().await?;
        Ok(Self { db })
    }

    // -- private helpers -----------------------------------------------------

    async fn select_where<T: DeserializeOwned>(
        &self,
        sql: &'static str,
        key: &'static str,
        value: String,
    ) -> StorageResult<Vec<T>> {
        let mut res = self
            .db
            .query(sql)
            .bind((key, value))
            .await
            .map_err(backend)?;
        res.take(0).map_err(backend)
    }

    async fn select_all<T: DeserializeOwned>(&self, sql: &'static str) -> StorageResult<Vec<T>> {
        let mut res = self.db.query(sql).await.map_err(backend)?;
        res.take(0).map_err(backend)
    }

    /// Fetch a bug row by ID, or BugNotFound.
    async fn fetch_bug(&self, bug_id: &BugId) -> StorageResult<BugRow> {
        let rows: Vec<BugRow> = self
            .select_where(
                "SELECT * FROM bugs WHERE bug_id = $bid",
                "bid",
                bug_id.0.clone(),
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StorageError::BugNotFound {
                bug_id: bug_id.0.clone(),
            })
    }
}

#[async_trait]
impl RecordStore for SurrealRecordStore {
    async fn find_by_title(&self, title: &str) -> StorageResult<Option<BugRecord>> {
        let rows: Vec<BugRow> = self
            .select_where(
                "SELECT * FROM bugs WHERE title = $title",
                "title",
                title.to_string(),
            )
            .await?;
        rows.into_iter().next().map(BugRow::into_record).transpose()
    }

    async fn insert_bug(&self, bug: NewBug) -> StorageResult<InsertOutcome> {
        if let Some(existing) = self.find_by_title(&bug.title).await? {
            return Ok(InsertOutcome::Duplicate(existing));
        }

        let bug_id = BugId::new();
        let row = BugRow::new(&bug_id, &bug);
        debug!(bug_id = %bug_id, "creating bug");

        let created: Result<Option<BugRow>, StorageError> = self
            .db
            .create("bugs")
            .content(row)
            .await
            .map_err(backend);

        match created {
            Ok(Some(row)) => Ok(InsertOutcome::Inserted(row.into_record()?)),
            Ok(None) => Err(StorageError::Backend(
                "bug insert returned no row".to_string(),
            )),
            Err(err) => {
                // The unique title index rejects a racing insert of the same title.
                match self.find_by_title(&bug.title).await? {
                    Some(existing) => Ok(InsertOutcome::Duplicate(existing)),
                    None => Err(err),
                }
            }
        }
    }

    async fn get_bug(&self, bug_id: &BugId) -> StorageResult<BugRecord> {
        self.fetch_bug(bug_id).await?.into_record()
    }

    async fn delete_bug(&self, bug_id: &BugId) -> StorageResult<bool> {
        match self.fetch_bug(bug_id).await {
            Ok(_) => {}
            Err(StorageError::BugNotFound { .. }) => return Ok(false),
            Err(e) => return Err(e),
        }

        self.db
            .query(
                "DELETE predictions WHERE bug_id = $bid; \
                 DELETE assignments WHERE bug_id = $bid; \
                 DELETE bugs WHERE bug_id = $bid;",
            )
            .bind(("bid", bug_id.0.clone()))
            .await
            .map_err(backend)?
            .check()
            .map_err(backend)?;

        debug!(bug_id = %bug_id, "deleted bug");
        Ok(true)
    }

    async fn update_tags(&self, bug_id: &BugId, tags: Vec<String>) -> StorageResult<()> {
        self.fetch_bug(bug_id).await?;

        self.db
            .query("UPDATE bugs SET tags = $tags, updated_at = time::now() WHERE bug_id = $bid")
            .bind(("tags", encode_tags(&tags)))
            .bind(("bid", bug_id.0.clone()))
            .await
            .map_err(backend)?
            .check()
            .map_err(backend)?;
        Ok(())
    }

    async fn list_untagged(&self) -> StorageResult<Vec<BugRecord>> {
        let rows: Vec<BugRow> = self
            .select_all("SELECT * FROM bugs ORDER BY created_at ASC")
            .await?;
        rows.into_iter()
            .map(BugRow::into_record)
            .filter(|r| r.as_ref().map(|b| b.tags.is_empty()).unwrap_or(true))
            .collect()
    }

    async fn list_bugs(&self, offset: usize, limit: usize) -> StorageResult<Vec<BugRecord>> {
        let mut res = self
            .db
            .query("SELECT * FROM bugs ORDER BY created_at ASC LIMIT $limit START $offset")
            .bind(("limit", limit as i64))
            .bind(("offset", offset as i64))
            .await
            .map_err(backend)?;
        let rows: Vec<BugRow> = res.take(0).map_err(backend)?;
        rows.into_iter().map(BugRow::into_record).collect()
    }

    async fn insert_prediction(
        &self,
        bug_id: &BugId,
        prediction: NewPrediction,
    ) -> StorageResult<PredictionRecord> {
        self.fetch_bug(bug_id).await?;

        let row = PredictionRow::new(bug_id, &prediction)?;
        let created: Option<PredictionRow> = self
            .db
            .create("predictions")
            .content(row)
            .await
            .map_err(backend)?;

        created
            .ok_or_else(|| StorageError::Backend("prediction insert returned no row".to_string()))?
            .into_record()
    }

    async fn latest_prediction(&self, bug_id: &BugId) -> StorageResult<Option<PredictionRecord>> {
        let rows: Vec<PredictionRow> = self
            .select_where(
                "SELECT * FROM predictions WHERE bug_id = $bid ORDER BY predicted_at DESC LIMIT 1",
                "bid",
                bug_id.0.clone(),
            )
            .await?;
        rows.into_iter()
            .next()
            .map(PredictionRow::into_record)
            .transpose()
    }

    async fn insert_assignment(
        &self,
        bug_id: &BugId,
        developer_name: &str,
        kind: AssignmentKind,
    ) -> StorageResult<AssignmentRecord> {
        self.fetch_bug(bug_id).await?;

        let row = AssignmentRow::new(bug_id, developer_name, kind);
        let created: Option<AssignmentRow> = self
            .db
            .create("assignments")
            .content(row)
            .await
            .map_err(backend)?;
        let record = created
            .ok_or_else(|| StorageError::Backend("assignment insert returned no row".to_string()))?
            .into_record()?;

        self.db
            .query("UPDATE bugs SET status = $status, updated_at = time::now() WHERE bug_id = $bid")
            .bind(("status", kind.resulting_status().as_str().to_string()))
            .bind(("bid", bug_id.0.clone()))
            .await
            .map_err(backend)?
            .check()
            .map_err(backend)?;

        Ok(record)
    }

    async fn assignments(&self, bug_id: &BugId) -> StorageResult<Vec<AssignmentRecord>> {
        let rows: Vec<AssignmentRow> = self
            .select_where(
                "SELECT * FROM assignments WHERE bug_id = $bid ORDER BY assigned_at ASC",
                "bid",
                bug_id.0.clone(),
            )
            .await?;
        rows.into_iter().map(AssignmentRow::into_record).collect()
    }

    async fn aggregate_stats(&self) -> StorageResult<TriageStats> {
        let bugs: Vec<BugRow> = self.select_all("SELECT * FROM bugs").await?;
        let assignments: Vec<AssignmentRow> = self.select_all("SELECT * FROM assignments").await?;

        let mut stats = TriageStats {
            total_bugs: bugs.len() as u64,
            pending_bugs: bugs
                .iter()
                .filter(|b| b.status == BugStatus::Open.as_str())
                .count() as u64,
            bugs_per_developer: BTreeMap::new(),
            ..TriageStats::default()
        };

        for row in assignments {
            match row.assignment_type.parse::<AssignmentKind>()? {
                AssignmentKind::Auto => stats.auto_assigned += 1,
                AssignmentKind::Manual => stats.manual_review += 1,
            }
            *stats
                .bugs_per_developer
                .entry(row.developer_name)
                .or_default() += 1;
        }
        Ok(stats)
    }
}

#[async_trait]
impl Roster for SurrealRecordStore {
    async fn list_identities(&self, role: Option<&str>) -> StorageResult<Vec<Identity>> {
        let rows: Vec<IdentityRow> = match role {
            Some(role) => {
                self.select_where(
                    "SELECT * FROM identities WHERE role = $role ORDER BY identity_id ASC",
                    "role",
                    role.to_string(),
                )
                .await?
            }
            None => {
                self.select_all("SELECT * FROM identities ORDER BY identity_id ASC")
                    .await?
            }
        };
        Ok(rows.into_iter().map(Identity::from).collect())
    }

    async fn register_identity(&self, identity: Identity) -> StorageResult<()> {
        let existing: Vec<IdentityRow> = self
            .select_where(
                "SELECT * FROM identities WHERE identity_id = $iid",
                "iid",
                identity.id.clone(),
            )
            .await?;
        if !existing.is_empty() {
            return Err(StorageError::DuplicateIdentity { id: identity.id });
        }

        let _created: Option<IdentityRow> = self
            .db
            .create("identities")
            .content(IdentityRow::from(&identity))
            .await
            .map_err(|e| match e.to_string() {
                msg if msg.contains("idx_identity_id") => StorageError::DuplicateIdentity {
                    id: identity.id.clone(),
                },
                msg => StorageError::Backend(msg),
            })?;

        debug!(identity_id = %identity.id, "registered identity");
        Ok(())
    }
}
