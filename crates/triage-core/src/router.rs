//! Confidence routing: auto-assign or send to manual review.

use std::cmp::Ordering;

use crate::domain::{MatchResult, Result, ScoredCandidate, Threshold, TriageDecision, TriageError};

/// Decide how a report is assigned.
///
/// - With `override_identity`, that identity is auto-assigned at confidence
///   1.0 whatever the classifier ranked first.
/// - Otherwise an empty `candidates` list is [`TriageError::ClassifierUnavailable`].
/// - Otherwise the first candidate is taken and auto-assigned when its
///   confidence is at least `threshold` (inclusive).
///
/// `candidates` must already be ranked (see [`rank_candidates`]); the full
/// list is kept on the decision.
pub fn route(
    candidates: &[ScoredCandidate],
    threshold: Threshold,
    override_identity: Option<&str>,
) -> Result<TriageDecision> {
    if let Some(identity) = override_identity {
        return Ok(TriageDecision {
            top_candidate: identity.to_string(),
            confidence: 1.0,
            is_auto_assigned: true,
            threshold_used: threshold.value(),
            tags: Vec::new(),
            matched_from_external_hint: true,
            candidates: candidates.to_vec(),
            hint_resolution: None,
        });
    }

    let top = candidates
        .first()
        .ok_or(TriageError::ClassifierUnavailable)?;

    Ok(TriageDecision {
        top_candidate: top.identity_name.clone(),
        confidence: top.confidence,
        is_auto_assigned: top.confidence >= threshold.value(),
        threshold_used: threshold.value(),
        tags: Vec::new(),
        matched_from_external_hint: false,
        candidates: candidates.to_vec(),
        hint_resolution: None,
    })
}

/// Drop candidates with NaN or out-of-range confidence or a blank name, then
/// sort descending. Ties keep their original order.
pub fn rank_candidates(mut candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    candidates.retain(|c| {
        (0.0..=1.0).contains(&c.confidence) && !c.identity_name.trim().is_empty()
    });
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
    candidates
}

impl TriageDecision {
    /// Attach category tags.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Record how the assignee hint resolved.
    pub fn with_hint_resolution(mut self, resolution: MatchResult) -> Self {
        self.hint_resolution = Some(resolution);
        self
    }
}
