//! Triage Core Library
//!
//! Turns a free-text defect report into a routing decision: normalized
//! features, category tags, an optional resolved assignee hint and a
//! confidence-gated assignee. [`TriageService`] adds persistence and bulk
//! import on top of the pure [`triage`] entry point.

pub mod classifier;
pub mod domain;
pub mod identity;
pub mod metrics;
pub mod normalize;
pub mod obs;
pub mod orchestrator;
pub mod router;
pub mod service;
pub mod tags;
pub mod telemetry;

pub use classifier::{Classifier, ClassifierConfig, HttpClassifier, StaticClassifier};

pub use domain::{
    MatchResult, MatchStatus, RawReport, Result, ScoredCandidate, Threshold, TriageConfig,
    TriageContext, TriageDecision, TriageError,
};

pub use identity::{resolve, FUZZY_MATCH_THRESHOLD};
pub use normalize::{normalize, NormalizedText};
pub use orchestrator::{triage, triage_top_n};
pub use router::{rank_candidates, route};
pub use service::{ImportOutcome, ImportStatus, ImportSummary, Submission, TriageService};
pub use tags::{classify, FALLBACK_TAG};

pub use triage_state::{BugId, Identity, ReportSource};
