//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryRecordStore` and `MemoryRoster` that satisfy the trait
//! contracts without any external dependencies.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::StorageError;
use crate::storage_traits::*;

// ---------------------------------------------------------------------------
// MemoryRecordStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct StoreState {
    /// Insertion order is the listing order
    bugs: Vec<BugRecord>,
    predictions: Vec<PredictionRecord>,
    assignments: Vec<AssignmentRecord>,
}

impl StoreState {
    fn bug_mut(&mut self, bug_id: &BugId) -> StorageResult<&mut BugRecord> {
        self.bugs
            .iter_mut()
            .find(|b| &b.bug_id == bug_id)
            .ok_or_else(|| StorageError::BugNotFound {
                bug_id: bug_id.0.clone(),
            })
    }
}

/// In-memory record store backed by plain vectors behind one mutex.
///
/// Holding the single lock across the title check and the push makes
/// `insert_bug` atomic.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    state: Mutex<StoreState>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_by_title(&self, title: &str) -> StorageResult<Option<BugRecord>> {
        let state = self.lock();
        Ok(state.bugs.iter().find(|b| b.title == title).cloned())
    }

    async fn insert_bug(&self, bug: NewBug) -> StorageResult<InsertOutcome> {
        let mut state = self.lock();
        if let Some(existing) = state.bugs.iter().find(|b| b.title == bug.title) {
            return Ok(InsertOutcome::Duplicate(existing.clone()));
        }
        let now = Utc::now();
        let record = BugRecord {
            bug_id: BugId::new(),
            title: bug.title,
            body: bug.body,
            source: bug.source,
            priority: bug.priority,
            tags: bug.tags,
            status: BugStatus::Open,
            created_at: now,
            updated_at: now,
        };
        state.bugs.push(record.clone());
        Ok(InsertOutcome::Inserted(record))
    }

    async fn get_bug(&self, bug_id: &BugId) -> StorageResult<BugRecord> {
        let state = self.lock();
        state
            .bugs
            .iter()
            .find(|b| &b.bug_id == bug_id)
            .cloned()
            .ok_or_else(|| StorageError::BugNotFound {
                bug_id: bug_id.0.clone(),
            })
    }

    async fn delete_bug(&self, bug_id: &BugId) -> StorageResult<bool> {
        let mut state = self.lock();
        let before = state.bugs.len();
        state.bugs.retain(|b| &b.bug_id != bug_id);
        let existed = state.bugs.len() != before;
        if existed {
            state.predictions.retain(|p| &p.bug_id != bug_id);
            state.assignments.retain(|a| &a.bug_id != bug_id);
        }
        Ok(existed)
    }

    async fn update_tags(&self, bug_id: &BugId, tags: Vec<String>) -> StorageResult<()> {
        let mut state = self.lock();
        let bug = state.bug_mut(bug_id)?;
        bug.tags = tags;
        bug.updated_at = Utc::now();
        Ok(())
    }

    async fn list_untagged(&self) -> StorageResult<Vec<BugRecord>> {
        let state = self.lock();
        Ok(state
            .bugs
            .iter()
            .filter(|b| b.tags.is_empty())
            .cloned()
            .collect())
    }

    async fn list_bugs(&self, offset: usize, limit: usize) -> StorageResult<Vec<BugRecord>> {
        let state = self.lock();
        Ok(state.bugs.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn insert_prediction(
        &self,
        bug_id: &BugId,
        prediction: NewPrediction,
    ) -> StorageResult<PredictionRecord> {
        let mut state = self.lock();
        state.bug_mut(bug_id)?;
        let record = PredictionRecord {
            bug_id: bug_id.clone(),
            predicted_developer: prediction.predicted_developer,
            confidence: prediction.confidence,
            alternatives: prediction.alternatives,
            threshold_used: prediction.threshold_used,
            matched_from_external_hint: prediction.matched_from_external_hint,
            predicted_at: Utc::now(),
        };
        state.predictions.push(record.clone());
        Ok(record)
    }

    async fn latest_prediction(&self, bug_id: &BugId) -> StorageResult<Option<PredictionRecord>> {
        let state = self.lock();
        Ok(state
            .predictions
            .iter()
            .rev()
            .find(|p| &p.bug_id == bug_id)
            .cloned())
    }

    async fn insert_assignment(
        &self,
        bug_id: &BugId,
        developer_name: &str,
        kind: AssignmentKind,
    ) -> StorageResult<AssignmentRecord> {
        let mut state = self.lock();
        let now = Utc::now();
        let bug = state.bug_mut(bug_id)?;
        bug.status = kind.resulting_status();
        bug.updated_at = now;
        let record = AssignmentRecord {
            bug_id: bug_id.clone(),
            developer_name: developer_name.to_string(),
            kind,
            assigned_at: now,
        };
        state.assignments.push(record.clone());
        Ok(record)
    }

    async fn assignments(&self, bug_id: &BugId) -> StorageResult<Vec<AssignmentRecord>> {
        let state = self.lock();
        Ok(state
            .assignments
            .iter()
            .filter(|a| &a.bug_id == bug_id)
            .cloned()
            .collect())
    }

    async fn aggregate_stats(&self) -> StorageResult<TriageStats> {
        let state = self.lock();
        let mut bugs_per_developer: BTreeMap<String, u64> = BTreeMap::new();
        let mut auto_assigned = 0;
        let mut manual_review = 0;
        for a in &state.assignments {
            match a.kind {
                AssignmentKind::Auto => auto_assigned += 1,
                AssignmentKind::Manual => manual_review += 1,
            }
            *bugs_per_developer
                .entry(a.developer_name.clone())
                .or_default() += 1;
        }
        Ok(TriageStats {
            total_bugs: state.bugs.len() as u64,
            auto_assigned,
            manual_review,
            bugs_per_developer,
            pending_bugs: state
                .bugs
                .iter()
                .filter(|b| b.status == BugStatus::Open)
                .count() as u64,
        })
    }
}

// ---------------------------------------------------------------------------
// MemoryRoster
// ---------------------------------------------------------------------------

/// In-memory roster keeping identities in registration order.
#[derive(Debug, Default)]
pub struct MemoryRoster {
    identities: Mutex<Vec<Identity>>,
}

impl MemoryRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster pre-populated with `identities`.
    pub fn with_identities(identities: Vec<Identity>) -> Self {
        Self {
            identities: Mutex::new(identities),
        }
    }
}

#[async_trait]
impl Roster for MemoryRoster {
    async fn list_identities(&self, role: Option<&str>) -> StorageResult<Vec<Identity>> {
        let identities = self.identities.lock().unwrap_or_else(|p| p.into_inner());
        Ok(identities
            .iter()
            .filter(|i| role.map(|r| i.role == r).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn register_identity(&self, identity: Identity) -> StorageResult<()> {
        let mut identities = self.identities.lock().unwrap_or_else(|p| p.into_inner());
        if identities.iter().any(|i| i.id == identity.id) {
            return Err(StorageError::DuplicateIdentity { id: identity.id });
        }
        identities.push(identity);
        Ok(())
    }
}
