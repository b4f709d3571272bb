//! Trait contract tests for RecordStore and Roster.
//!
//! Each contract is written once against `&dyn RecordStore` / `&dyn Roster`
//! and run against both the in-memory fakes and the SurrealDB store.

use triage_state::fakes::{MemoryRecordStore, MemoryRoster};
use triage_state::storage_traits::*;
use triage_state::{StorageError, SurrealRecordStore};

fn new_bug(title: &str) -> NewBug {
    NewBug {
        title: title.to_string(),
        body: format!("{title} body"),
        source: ReportSource::Manual,
        priority: "medium".to_string(),
        tags: vec![],
    }
}

async fn inserted(store: &dyn RecordStore, title: &str) -> BugRecord {
    match store.insert_bug(new_bug(title)).await.unwrap() {
        InsertOutcome::Inserted(bug) => bug,
        InsertOutcome::Duplicate(bug) => panic!("unexpected duplicate: {}", bug.title),
    }
}

fn sample_prediction(dev: &str, confidence: f64) -> NewPrediction {
    NewPrediction {
        predicted_developer: dev.to_string(),
        confidence,
        alternatives: vec![
            CandidateRecord {
                developer: dev.to_string(),
                confidence,
            },
            CandidateRecord {
                developer: "other".to_string(),
                confidence: confidence / 2.0,
            },
        ],
        threshold_used: 0.5,
        matched_from_external_hint: false,
    }
}

// ===========================================================================
// RecordStore contracts
// ===========================================================================

async fn contract_insert_then_duplicate(store: &dyn RecordStore) {
    let first = inserted(store, "Terminal freezes").await;
    assert_eq!(first.status, BugStatus::Open);

    let second = store.insert_bug(new_bug("Terminal freezes")).await.unwrap();
    match second {
        InsertOutcome::Duplicate(existing) => assert_eq!(existing.bug_id, first.bug_id),
        InsertOutcome::Inserted(_) => panic!("duplicate title was inserted"),
    }

    let found = store.find_by_title("Terminal freezes").await.unwrap();
    assert_eq!(found.map(|b| b.bug_id), Some(first.bug_id));
    assert!(store.find_by_title("missing").await.unwrap().is_none());
}

async fn contract_assignment_moves_status(store: &dyn RecordStore) {
    let auto = inserted(store, "auto bug").await;
    let manual = inserted(store, "manual bug").await;

    store
        .insert_assignment(&auto.bug_id, "Tyriar", AssignmentKind::Auto)
        .await
        .unwrap();
    store
        .insert_assignment(&manual.bug_id, "meganrogge", AssignmentKind::Manual)
        .await
        .unwrap();

    assert_eq!(
        store.get_bug(&auto.bug_id).await.unwrap().status,
        BugStatus::Assigned
    );
    assert_eq!(
        store.get_bug(&manual.bug_id).await.unwrap().status,
        BugStatus::ManualReview
    );

    let history = store.assignments(&auto.bug_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].developer_name, "Tyriar");
    assert_eq!(history[0].kind, AssignmentKind::Auto);
}

async fn contract_prediction_round_trip(store: &dyn RecordStore) {
    let bug = inserted(store, "prediction bug").await;
    store
        .insert_prediction(&bug.bug_id, sample_prediction("Tyriar", 0.62))
        .await
        .unwrap();

    let latest = store.latest_prediction(&bug.bug_id).await.unwrap().unwrap();
    assert_eq!(latest.predicted_developer, "Tyriar");
    assert!((latest.confidence - 0.62).abs() < 1e-9);
    assert_eq!(latest.alternatives.len(), 2);
    assert_eq!(latest.alternatives[1].developer, "other");
}

async fn contract_missing_bug_errors(store: &dyn RecordStore) {
    let ghost = BugId::from("ghost");
    let err = store.get_bug(&ghost).await.unwrap_err();
    assert!(matches!(err, StorageError::BugNotFound { .. }));

    let err = store
        .insert_assignment(&ghost, "dev", AssignmentKind::Auto)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::BugNotFound { .. }));

    assert!(!store.delete_bug(&ghost).await.unwrap());
}

async fn contract_delete_cascades(store: &dyn RecordStore) {
    let bug = inserted(store, "short lived").await;
    store
        .insert_prediction(&bug.bug_id, sample_prediction("dev", 0.9))
        .await
        .unwrap();
    store
        .insert_assignment(&bug.bug_id, "dev", AssignmentKind::Auto)
        .await
        .unwrap();

    assert!(store.delete_bug(&bug.bug_id).await.unwrap());
    assert!(store.latest_prediction(&bug.bug_id).await.unwrap().is_none());
    assert!(store.assignments(&bug.bug_id).await.unwrap().is_empty());
    assert!(store.find_by_title("short lived").await.unwrap().is_none());
}

async fn contract_tags_and_untagged(store: &dyn RecordStore) {
    let bug = inserted(store, "needs tags").await;
    let untagged = store.list_untagged().await.unwrap();
    assert!(untagged.iter().any(|b| b.bug_id == bug.bug_id));

    store
        .update_tags(&bug.bug_id, vec!["Terminal".to_string(), "UI/UX".to_string()])
        .await
        .unwrap();

    let tagged = store.get_bug(&bug.bug_id).await.unwrap();
    assert_eq!(tagged.tags, vec!["Terminal", "UI/UX"]);
    let untagged = store.list_untagged().await.unwrap();
    assert!(untagged.iter().all(|b| b.bug_id != bug.bug_id));
}

async fn contract_stats(store: &dyn RecordStore) {
    let a = inserted(store, "stats a").await;
    let b = inserted(store, "stats b").await;
    let _c = inserted(store, "stats c").await;

    store
        .insert_assignment(&a.bug_id, "Tyriar", AssignmentKind::Auto)
        .await
        .unwrap();
    store
        .insert_assignment(&b.bug_id, "Tyriar", AssignmentKind::Manual)
        .await
        .unwrap();

    let stats = store.aggregate_stats().await.unwrap();
    assert_eq!(stats.total_bugs, 3);
    assert_eq!(stats.auto_assigned, 1);
    assert_eq!(stats.manual_review, 1);
    assert_eq!(stats.pending_bugs, 1);
    assert_eq!(stats.bugs_per_developer.get("Tyriar"), Some(&2));
}

async fn contract_paging(store: &dyn RecordStore) {
    for i in 0..5 {
        inserted(store, &format!("page {i}")).await;
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    let page = store.list_bugs(1, 2).await.unwrap();
    let titles: Vec<_> = page.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["page 1", "page 2"]);
}

macro_rules! record_store_contracts {
    ($module:ident, $ctor:expr) => {
        mod $module {
            use super::*;

            #[tokio::test]
            async fn insert_then_duplicate() {
                let store = $ctor;
                contract_insert_then_duplicate(&store).await;
            }

            #[tokio::test]
            async fn assignment_moves_status() {
                let store = $ctor;
                contract_assignment_moves_status(&store).await;
            }

            #[tokio::test]
            async fn prediction_round_trip() {
                let store = $ctor;
                contract_prediction_round_trip(&store).await;
            }

            #[tokio::test]
            async fn missing_bug_errors() {
                let store = $ctor;
                contract_missing_bug_errors(&store).await;
            }

            #[tokio::test]
            async fn delete_cascades() {
                let store = $ctor;
                contract_delete_cascades(&store).await;
            }

            #[tokio::test]
            async fn tags_and_untagged() {
                let store = $ctor;
                contract_tags_and_untagged(&store).await;
            }

            #[tokio::test]
            async fn stats() {
                let store = $ctor;
                contract_stats(&store).await;
            }

            #[tokio::test]
            async fn paging() {
                let store = $ctor;
                contract_paging(&store).await;
            }
        }
    };
}

record_store_contracts!(memory, MemoryRecordStore::new());
record_store_contracts!(surreal, SurrealRecordStore::in_memory().await.unwrap());

// ===========================================================================
// Roster contracts
// ===========================================================================

async fn contract_roster(roster: &dyn Roster) {
    roster
        .register_identity(Identity::new("1", "Alice Smith", "alice_s").with_email("alice@x.io"))
        .await
        .unwrap();
    roster
        .register_identity(Identity::new("2", "Bob Jones", "bob-dev"))
        .await
        .unwrap();
    roster
        .register_identity(Identity::new("9", "Rita Reporter", "rita").with_role("reporter"))
        .await
        .unwrap();

    let all = roster.list_identities(None).await.unwrap();
    assert_eq!(all.len(), 3);

    let devs = roster.list_identities(Some("developer")).await.unwrap();
    let names: Vec<_> = devs.iter().map(|d| d.display_name.as_str()).collect();
    assert_eq!(names, vec!["Alice Smith", "Bob Jones"]);
    assert_eq!(devs[0].email.as_deref(), Some("alice@x.io"));

    let err = roster
        .register_identity(Identity::new("1", "Alice Again", "alice2"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::DuplicateIdentity { .. }));
}

#[tokio::test]
async fn memory_roster_contract() {
    contract_roster(&MemoryRoster::new()).await;
}

#[tokio::test]
async fn surreal_roster_contract() {
    let store = SurrealRecordStore::in_memory().await.unwrap();
    contract_roster(&store).await;
}
