//! Bulk import: bounded concurrency, duplicate skipping, partial failure.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use triage_core::{
    ImportStatus, RawReport, ReportSource, ScoredCandidate, StaticClassifier, TriageConfig,
    TriageService,
};
use triage_state::fakes::{MemoryRecordStore, MemoryRoster};
use triage_state::{Identity, RecordStore, Roster, StorageResult};

/// Roster that counts how often it is listed.
struct CountingRoster {
    inner: MemoryRoster,
    lists: AtomicUsize,
}

#[async_trait]
impl Roster for CountingRoster {
    async fn list_identities(&self, role: Option<&str>) -> StorageResult<Vec<Identity>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list_identities(role).await
    }

    async fn register_identity(&self, identity: Identity) -> StorageResult<()> {
        self.inner.register_identity(identity).await
    }
}

fn classifier() -> StaticClassifier {
    StaticClassifier::new(vec![ScoredCandidate::new("Tyriar", 0.45)])
        .with_rule("unscorable", Vec::new())
}

fn reports(titles: &[&str]) -> Vec<RawReport> {
    titles
        .iter()
        .map(|t| RawReport::new(*t, "imported from tracker").with_source(ReportSource::BulkImport))
        .collect()
}

#[tokio::test]
async fn import_skips_duplicates_and_keeps_going() {
    let store = Arc::new(MemoryRecordStore::new());
    let roster = Arc::new(CountingRoster {
        inner: MemoryRoster::with_identities(vec![Identity::new("u1", "Daniel Imms", "Tyriar")]),
        lists: AtomicUsize::new(0),
    });
    let service = TriageService::new(
        store.clone(),
        roster.clone(),
        Arc::new(classifier()),
        TriageConfig::default().with_import_concurrency(2),
    );

    let summary = service
        .import_batch(reports(&[
            "Terminal crash",
            "Unscorable report",
            "Editor lag",
            "Terminal crash",
            "Git merge broken",
        ]))
        .await
        .unwrap();

    assert_eq!(summary.imported + summary.skipped_duplicates, 4);
    assert_eq!(summary.errored, 1);
    assert_eq!(summary.outcomes.len(), 5);
    assert_eq!(roster.lists.load(Ordering::SeqCst), 1);

    let indices: Vec<_> = summary.outcomes.iter().map(|o| o.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert_eq!(summary.outcomes[1].title, "Unscorable report");
    assert!(matches!(
        summary.outcomes[1].status,
        ImportStatus::Errored { retryable: true, .. }
    ));

    // Both "Terminal crash" reports race; exactly one lands.
    let stored = store.list_bugs(0, 10).await.unwrap();
    assert_eq!(stored.len(), 3);
    assert_eq!(summary.imported, 3);
    assert_eq!(summary.skipped_duplicates, 1);
}

#[tokio::test]
async fn import_uses_bulk_threshold() {
    let service = TriageService::new(
        Arc::new(MemoryRecordStore::new()),
        Arc::new(MemoryRoster::new()),
        Arc::new(classifier()),
        TriageConfig::default(),
    );

    let summary = service.import_batch(reports(&["Editor lag"])).await.unwrap();

    // 0.45 clears the 0.40 import threshold but not the 0.50 predict one.
    match &summary.outcomes[0].status {
        ImportStatus::Imported { auto_assigned, assignee, .. } => {
            assert!(*auto_assigned);
            assert_eq!(assignee, "Tyriar");
        }
        other => panic!("expected Imported, got {other:?}"),
    }
    let predicted = service.predict(&RawReport::new("Editor lag", "")).await.unwrap();
    assert!(!predicted.is_auto_assigned);
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
    let service = TriageService::new(
        Arc::new(MemoryRecordStore::new()),
        Arc::new(MemoryRoster::new()),
        Arc::new(classifier()),
        TriageConfig::default(),
    );
    let summary = service.import_batch(Vec::new()).await.unwrap();
    assert_eq!(summary.imported, 0);
    assert!(summary.outcomes.is_empty());
}

#[tokio::test]
async fn previously_stored_titles_are_skipped() {
    let store = Arc::new(MemoryRecordStore::new());
    let service = TriageService::new(
        store.clone(),
        Arc::new(MemoryRoster::new()),
        Arc::new(classifier()),
        TriageConfig::default(),
    );
    service.import_batch(reports(&["Editor lag"])).await.unwrap();

    let again = service
        .import_batch(reports(&["Editor lag", "Terminal crash"]))
        .await
        .unwrap();

    assert_eq!(again.skipped_duplicates, 1);
    assert_eq!(again.imported, 1);
    let existing = store.find_by_title("Editor lag").await.unwrap().unwrap();
    assert!(matches!(
        &again.outcomes[0].status,
        ImportStatus::SkippedDuplicate { existing: id } if *id == existing.bug_id
    ));
}
