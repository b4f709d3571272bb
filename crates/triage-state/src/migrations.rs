//! SurrealDB schema migrations and initialization
//!
//! Sets up the triage tables with their uniqueness constraints and lookup
//! indexes.

use crate::Result;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

/// Initialize all triage tables in SurrealDB
///
/// Safe to call multiple times (idempotent).
pub async fn init_schema(db: &Surreal<Any>) -> Result<()> {
    info!("Initializing triage SurrealDB schema");

    init_bugs_table(db).await?;
    init_predictions_table(db).await?;
    init_assignments_table(db).await?;
    init_identities_table(db).await?;

    info!("Triage schema initialization complete");
    Ok(())
}

/// Initialize `bugs` table
///
/// Schema:
/// ```text
/// TABLE bugs {
///   bug_id:     STRING (unique)
///   title:      STRING (unique; duplicate-title detection)
///   body:       STRING
///   source:     STRING (manual | imported-tracker | bulk-import)
///   priority:   STRING
///   tags:       STRING? (comma-joined, NULL when untagged)
///   status:     STRING (open | assigned | manual-review)
///   created_at: DATETIME
///   updated_at: DATETIME
/// }
/// ```
///
/// The UNIQUE index on `title` is what makes check-and-insert atomic: a
/// concurrent second insert of the same title is rejected by the engine.
async fn init_bugs_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing bugs table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS bugs SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS idx_bug_id ON TABLE bugs COLUMNS bug_id UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_bug_title ON TABLE bugs COLUMNS title UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_bug_status ON TABLE bugs COLUMNS status;
        DEFINE INDEX IF NOT EXISTS idx_bug_created_at ON TABLE bugs COLUMNS created_at;
    "#;

    db.query(sql).await?.check()?;
    info!("✓ bugs table initialized");
    Ok(())
}

/// Initialize `predictions` table
async fn init_predictions_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing predictions table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS predictions SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS idx_prediction_bug ON TABLE predictions COLUMNS bug_id;
    "#;

    db.query(sql).await?.check()?;
    info!("✓ predictions table initialized");
    Ok(())
}

/// Initialize `assignments` table
async fn init_assignments_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing assignments table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS assignments SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS idx_assignment_bug ON TABLE assignments COLUMNS bug_id;
        DEFINE INDEX IF NOT EXISTS idx_assignment_type ON TABLE assignments COLUMNS assignment_type;
    "#;

    db.query(sql).await?.check()?;
    info!("✓ assignments table initialized");
    Ok(())
}

/// Initialize `identities` table
async fn init_identities_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing identities table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS identities SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS idx_identity_id ON TABLE identities COLUMNS identity_id UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_identity_role ON TABLE identities COLUMNS role;
    "#;

    db.query(sql).await?.check()?;
    info!("✓ identities table initialized");
    Ok(())
}
