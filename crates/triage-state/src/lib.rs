//! Triage-State: persistence for bug triage
//!
//! This crate provides the record store and roster collaborators consumed by
//! the triage core. It handles all I/O with SurrealDB and ships in-memory
//! fakes for tests.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: duplicate-free bug insertion, prediction and assignment audit trail,
//! dashboard aggregates.
//!
//! ## Key Components
//!
//! - `RecordStore`: bugs, predictions, assignments, stats
//! - `Roster`: known identities, filterable by role
//! - `SurrealRecordStore`: SurrealDB implementation of both
//! - `fakes`: `MemoryRecordStore`, `MemoryRoster`

mod error;
pub mod fakes;
pub mod handle;
mod migrations;
mod schema;
pub mod storage_traits;
pub mod surreal_store;

pub use error::{StateError, StorageError};
pub use handle::CloudConfig;
pub use storage_traits::{
    AssignmentKind, AssignmentRecord, BugId, BugRecord, BugStatus, CandidateRecord, Identity,
    InsertOutcome, NewBug, NewPrediction, PredictionRecord, RecordStore, ReportSource, Roster,
    StorageResult, TriageStats,
};
pub use surreal_store::SurrealRecordStore;

/// Result type for triage-state connection and schema operations
pub type Result<T> = std::result::Result<T, StateError>;
