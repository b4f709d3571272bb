//! Integration tests for SurrealDB schema initialization
//!
//! Migrations run on every connect and must be safe to repeat.

use triage_state::handle;
use triage_state::{Roster, SurrealRecordStore};

#[tokio::test]
async fn unique_title_index_rejects_second_row() {
    let db = handle::connect_in_memory().await.unwrap();

    db.query("CREATE bugs CONTENT { bug_id: 'b1', title: 'Same title' }")
        .await
        .unwrap()
        .check()
        .unwrap();
    let second = db
        .query("CREATE bugs CONTENT { bug_id: 'b2', title: 'Same title' }")
        .await
        .unwrap()
        .check();

    assert!(
        second.is_err(),
        "second row with the same title should violate the UNIQUE index"
    );
}

#[tokio::test]
async fn unique_identity_index_rejects_second_row() {
    let db = handle::connect_in_memory().await.unwrap();

    db.query("CREATE identities CONTENT { identity_id: '7', role: 'developer' }")
        .await
        .unwrap()
        .check()
        .unwrap();
    let second = db
        .query("CREATE identities CONTENT { identity_id: '7', role: 'reporter' }")
        .await
        .unwrap()
        .check();

    assert!(second.is_err());
}

#[tokio::test]
async fn store_wrapping_existing_connection_is_usable() {
    let db = handle::connect_in_memory().await.unwrap();
    let store = SurrealRecordStore::new(db);
    assert!(store.list_identities(None).await.unwrap().is_empty());
}
