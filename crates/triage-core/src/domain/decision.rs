//! Identity-resolution results and triage decisions.

use serde::{Deserialize, Serialize};
use triage_state::{AssignmentKind, CandidateRecord, NewPrediction};

/// One ranked candidate from the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    #[serde(alias = "developer")]
    pub identity_name: String,
    pub confidence: f64,
}

impl ScoredCandidate {
    pub fn new(identity_name: impl Into<String>, confidence: f64) -> Self {
        Self {
            identity_name: identity_name.into(),
            confidence,
        }
    }
}

impl From<&ScoredCandidate> for CandidateRecord {
    fn from(c: &ScoredCandidate) -> Self {
        CandidateRecord {
            developer: c.identity_name.clone(),
            confidence: c.confidence,
        }
    }
}

/// Outcome category of an identity resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    ExactMatch,
    FuzzyMatch,
    AmbiguousMatch,
    NoAssigneeFound,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::ExactMatch => "EXACT_MATCH",
            MatchStatus::FuzzyMatch => "FUZZY_MATCH",
            MatchStatus::AmbiguousMatch => "AMBIGUOUS_MATCH",
            MatchStatus::NoAssigneeFound => "NO_ASSIGNEE_FOUND",
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of resolving an assignee hint against a roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub developer_found: bool,
    pub matched_name: Option<String>,
    pub similarity_score: f64,
    pub status: MatchStatus,
}

impl MatchResult {
    pub fn no_assignee() -> Self {
        Self {
            developer_found: false,
            matched_name: None,
            similarity_score: 0.0,
            status: MatchStatus::NoAssigneeFound,
        }
    }

    pub fn ambiguous(score: f64) -> Self {
        Self {
            developer_found: false,
            matched_name: None,
            similarity_score: score,
            status: MatchStatus::AmbiguousMatch,
        }
    }

    pub fn exact(name: impl Into<String>) -> Self {
        Self {
            developer_found: true,
            matched_name: Some(name.into()),
            similarity_score: 1.0,
            status: MatchStatus::ExactMatch,
        }
    }

    pub fn fuzzy(name: impl Into<String>, score: f64) -> Self {
        Self {
            developer_found: true,
            matched_name: Some(name.into()),
            similarity_score: score,
            status: MatchStatus::FuzzyMatch,
        }
    }

    /// The name to force as assignee, if this result is confident enough.
    ///
    /// Only exact and fuzzy matches override the classifier.
    pub fn override_name(&self) -> Option<&str> {
        match self.status {
            MatchStatus::ExactMatch | MatchStatus::FuzzyMatch => self.matched_name.as_deref(),
            MatchStatus::AmbiguousMatch | MatchStatus::NoAssigneeFound => None,
        }
    }
}

/// The routing decision for one report. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageDecision {
    pub top_candidate: String,
    pub confidence: f64,
    pub is_auto_assigned: bool,
    pub threshold_used: f64,
    /// Category tags in fixed category order
    pub tags: Vec<String>,
    pub matched_from_external_hint: bool,
    /// Full ranked classifier output, kept for audit and manual review
    pub candidates: Vec<ScoredCandidate>,
    /// How the assignee hint resolved, when one was supplied
    pub hint_resolution: Option<MatchResult>,
}

impl TriageDecision {
    pub fn assignment_kind(&self) -> AssignmentKind {
        if self.is_auto_assigned {
            AssignmentKind::Auto
        } else {
            AssignmentKind::Manual
        }
    }

    /// Prediction row recorded alongside the stored bug.
    pub fn to_new_prediction(&self) -> NewPrediction {
        NewPrediction {
            predicted_developer: self.top_candidate.clone(),
            confidence: self.confidence,
            alternatives: self.candidates.iter().map(CandidateRecord::from).collect(),
            threshold_used: self.threshold_used,
            matched_from_external_hint: self.matched_from_external_hint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_confident_matches_override() {
        assert_eq!(
            MatchResult::exact("Alice Smith").override_name(),
            Some("Alice Smith")
        );
        assert_eq!(
            MatchResult::fuzzy("Alice Smith", 0.9).override_name(),
            Some("Alice Smith")
        );
        assert_eq!(MatchResult::ambiguous(1.0).override_name(), None);
        assert_eq!(MatchResult::no_assignee().override_name(), None);
    }

    #[test]
    fn status_serializes_screaming_snake() {
        let json = serde_json::to_string(&MatchStatus::NoAssigneeFound).unwrap();
        assert_eq!(json, "\"NO_ASSIGNEE_FOUND\"");
    }

    #[test]
    fn candidate_accepts_developer_field() {
        let c: ScoredCandidate =
            serde_json::from_str(r#"{"developer":"Tyriar","confidence":0.62}"#).unwrap();
        assert_eq!(c, ScoredCandidate::new("Tyriar", 0.62));
    }

    #[test]
    fn prediction_keeps_alternatives() {
        let decision = TriageDecision {
            top_candidate: "Tyriar".to_string(),
            confidence: 0.3,
            is_auto_assigned: false,
            threshold_used: 0.5,
            tags: vec!["Terminal".to_string()],
            matched_from_external_hint: false,
            candidates: vec![
                ScoredCandidate::new("Tyriar", 0.3),
                ScoredCandidate::new("meganrogge", 0.2),
            ],
            hint_resolution: None,
        };
        assert_eq!(decision.assignment_kind(), AssignmentKind::Manual);
        let prediction = decision.to_new_prediction();
        assert_eq!(prediction.alternatives.len(), 2);
        assert_eq!(prediction.alternatives[1].developer, "meganrogge");
    }
}
