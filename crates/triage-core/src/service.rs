//! Persisting triage service.
//!
//! [`TriageService`] wires the pure orchestrator to a [`RecordStore`], a
//! [`Roster`] and a [`Classifier`]. It owns the duplicate-title check, the
//! classifier deadline and the bug/prediction/assignment write sequence.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use triage_state::{
    AssignmentKind, AssignmentRecord, BugId, BugRecord, Identity, InsertOutcome, NewBug,
    RecordStore, Roster, TriageStats,
};

use crate::classifier::Classifier;
use crate::domain::{RawReport, Result, TriageConfig, TriageContext, TriageDecision, TriageError};
use crate::metrics::METRICS;
use crate::obs;
use crate::orchestrator::triage_top_n;
use crate::tags::classify;

/// Role whose identities are eligible assignees.
pub const DEVELOPER_ROLE: &str = "developer";

/// A report that was triaged and stored.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub bug: BugRecord,
    pub decision: TriageDecision,
    pub assignment: AssignmentRecord,
}

/// Per-report result of a bulk import.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportStatus {
    Imported {
        bug_id: BugId,
        assignee: String,
        auto_assigned: bool,
    },
    SkippedDuplicate {
        existing: BugId,
    },
    Errored {
        error: String,
        retryable: bool,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    /// Position of the report in the input batch
    pub index: usize,
    pub title: String,
    #[serde(flatten)]
    pub status: ImportStatus,
}

/// Aggregate result of a bulk import. `outcomes` is in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped_duplicates: usize,
    pub errored: usize,
    pub outcomes: Vec<ImportOutcome>,
}

impl ImportSummary {
    fn push(&mut self, outcome: ImportOutcome) {
        match &outcome.status {
            ImportStatus::Imported { .. } => self.imported += 1,
            ImportStatus::SkippedDuplicate { .. } => self.skipped_duplicates += 1,
            ImportStatus::Errored { .. } => self.errored += 1,
        }
        self.outcomes.push(outcome);
    }
}

/// Triage plus persistence over shared backends.
#[derive(Clone)]
pub struct TriageService {
    store: Arc<dyn RecordStore>,
    roster: Arc<dyn Roster>,
    classifier: Arc<dyn Classifier>,
    config: TriageConfig,
}

impl TriageService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        roster: Arc<dyn Roster>,
        classifier: Arc<dyn Classifier>,
        config: TriageConfig,
    ) -> Self {
        Self {
            store,
            roster,
            classifier,
            config,
        }
    }

    pub fn config(&self) -> &TriageConfig {
        &self.config
    }

    /// Same backends, different routing configuration.
    pub fn with_config(mut self, config: TriageConfig) -> Self {
        self.config = config;
        self
    }

    /// Triage under the configured classifier deadline.
    async fn decide(
        &self,
        report: &RawReport,
        roster: &[Identity],
        context: TriageContext,
    ) -> Result<TriageDecision> {
        let deadline = self.config.classifier_timeout;
        let threshold = self.config.threshold_for(context);
        let fut = triage_top_n(
            report,
            roster,
            self.classifier.as_ref(),
            threshold,
            self.config.top_n,
        );
        tokio::time::timeout(deadline, fut)
            .await
            .map_err(|_| TriageError::ClassifierTimeout {
                after_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
            })?
    }

    async fn developer_snapshot(&self) -> Result<Vec<Identity>> {
        Ok(self.roster.list_identities(Some(DEVELOPER_ROLE)).await?)
    }

    /// Triage a report without storing anything.
    #[instrument(skip(self, report), fields(title = %report.title))]
    pub async fn predict(&self, report: &RawReport) -> Result<TriageDecision> {
        let roster = self.developer_snapshot().await?;
        self.decide(report, &roster, TriageContext::Predict).await
    }

    /// Triage a report and store the bug, its prediction and its assignment.
    ///
    /// Fails with [`TriageError::DuplicateReport`] when the title is taken,
    /// before the classifier is consulted.
    #[instrument(skip(self, report), fields(title = %report.title))]
    pub async fn submit(&self, report: &RawReport, context: TriageContext) -> Result<Submission> {
        let roster = self.developer_snapshot().await?;
        self.submit_with_roster(report, &roster, context).await
    }

    async fn submit_with_roster(
        &self,
        report: &RawReport,
        roster: &[Identity],
        context: TriageContext,
    ) -> Result<Submission> {
        report.validate()?;
        if let Some(existing) = self.store.find_by_title(&report.title).await? {
            return Err(TriageError::DuplicateReport {
                title: report.title.clone(),
                existing: existing.bug_id,
            });
        }

        let decision = self.decide(report, roster, context).await?;

        let new_bug = NewBug {
            title: report.title.clone(),
            body: report.body.clone(),
            source: report.source,
            priority: report.priority.clone(),
            tags: decision.tags.clone(),
        };
        // A concurrent submit may have taken the title since the first check.
        let mut bug = match self.store.insert_bug(new_bug).await? {
            InsertOutcome::Inserted(bug) => bug,
            InsertOutcome::Duplicate(existing) => {
                return Err(TriageError::DuplicateReport {
                    title: report.title.clone(),
                    existing: existing.bug_id,
                })
            }
        };

        self.store
            .insert_prediction(&bug.bug_id, decision.to_new_prediction())
            .await?;
        let assignment = self
            .store
            .insert_assignment(&bug.bug_id, &decision.top_candidate, decision.assignment_kind())
            .await?;
        bug.status = assignment.kind.resulting_status();

        debug!(bug_id = %bug.bug_id, kind = %assignment.kind, "report stored");
        Ok(Submission {
            bug,
            decision,
            assignment,
        })
    }

    /// Submit a batch of reports with bounded concurrency.
    ///
    /// The roster is read once per batch. Duplicates are skipped and per-report
    /// failures are recorded without aborting the rest of the batch.
    #[instrument(skip(self, reports), fields(count = reports.len()))]
    pub async fn import_batch(&self, reports: Vec<RawReport>) -> Result<ImportSummary> {
        let roster = Arc::new(self.developer_snapshot().await?);
        let sem = Arc::new(Semaphore::new(self.config.import_concurrency.max(1)));

        let handles: Vec<_> = reports
            .into_iter()
            .enumerate()
            .map(|(index, report)| {
                let service = self.clone();
                let roster = Arc::clone(&roster);
                let sem = Arc::clone(&sem);
                let title = report.title.clone();
                let handle = tokio::spawn(async move {
                    let _permit = sem.acquire_owned().await.ok();
                    service
                        .submit_with_roster(&report, &roster, TriageContext::BulkImport)
                        .await
                });
                (index, title, handle)
            })
            .collect();

        let mut summary = ImportSummary::default();
        for (index, title, handle) in handles {
            let status = match handle.await {
                Ok(Ok(submission)) => ImportStatus::Imported {
                    bug_id: submission.bug.bug_id,
                    assignee: submission.decision.top_candidate,
                    auto_assigned: submission.decision.is_auto_assigned,
                },
                Ok(Err(TriageError::DuplicateReport { existing, .. })) => {
                    METRICS.inc_duplicates_skipped();
                    ImportStatus::SkippedDuplicate { existing }
                }
                Ok(Err(e)) => {
                    warn!(index, title = %title, error = %e, "import of report failed");
                    METRICS.inc_import_errors();
                    ImportStatus::Errored {
                        retryable: e.is_retryable(),
                        error: e.to_string(),
                    }
                }
                Err(join_err) => {
                    warn!(index, title = %title, error = %join_err, "import task aborted");
                    METRICS.inc_import_errors();
                    ImportStatus::Errored {
                        error: join_err.to_string(),
                        retryable: false,
                    }
                }
            };
            summary.push(ImportOutcome {
                index,
                title,
                status,
            });
        }

        obs::emit_import_finished(summary.imported, summary.skipped_duplicates, summary.errored);
        METRICS.flush();
        Ok(summary)
    }

    /// Record a manual assignment, moving the bug to manual review.
    pub async fn assign_manual(&self, bug_id: &BugId, developer: &str) -> Result<AssignmentRecord> {
        if developer.trim().is_empty() {
            return Err(TriageError::InvalidReport(
                "developer name must not be empty".to_string(),
            ));
        }
        let record = self
            .store
            .insert_assignment(bug_id, developer.trim(), AssignmentKind::Manual)
            .await?;
        info!(bug_id = %bug_id, developer = %record.developer_name, "manual assignment recorded");
        Ok(record)
    }

    pub async fn list_bugs(&self, offset: usize, limit: usize) -> Result<Vec<BugRecord>> {
        Ok(self.store.list_bugs(offset, limit).await?)
    }

    pub async fn stats(&self) -> Result<TriageStats> {
        Ok(self.store.aggregate_stats().await?)
    }

    /// Delete a bug with its predictions and assignments.
    pub async fn delete_bug(&self, bug_id: &BugId) -> Result<bool> {
        Ok(self.store.delete_bug(bug_id).await?)
    }

    /// Compute and store tags for every bug that has none. Returns how many
    /// bugs were updated.
    pub async fn backfill_tags(&self) -> Result<usize> {
        let untagged = self.store.list_untagged().await?;
        let mut updated = 0;
        for bug in untagged {
            let report = RawReport::new(bug.title.as_str(), bug.body.as_str());
            let tags = classify(&report.combined_text());
            self.store.update_tags(&bug.bug_id, tags).await?;
            updated += 1;
        }
        info!(updated, "tag backfill finished");
        Ok(updated)
    }

    /// Identities, optionally filtered by role.
    pub async fn identities(&self, role: Option<&str>) -> Result<Vec<Identity>> {
        Ok(self.roster.list_identities(role).await?)
    }

    pub async fn register_identity(&self, identity: Identity) -> Result<()> {
        Ok(self.roster.register_identity(identity).await?)
    }
}
