//! Domain models for triage.
//!
//! Canonical definitions for the core entities:
//! - `RawReport`: an incoming defect report
//! - `MatchResult`: outcome of resolving an assignee hint
//! - `TriageDecision`: the routing decision for one report
//! - `TriageConfig` / `Threshold`: validated routing configuration

pub mod config;
pub mod decision;
pub mod error;
pub mod report;

// Re-export main types and errors
pub use config::{Threshold, TriageConfig, TriageContext};
pub use decision::{MatchResult, MatchStatus, ScoredCandidate, TriageDecision};
pub use error::{Result, TriageError};
pub use report::RawReport;
