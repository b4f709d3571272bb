//! End-to-end triage of a single report.
//!
//! Composes the tagger, identity resolver, classifier and router. Performs
//! exactly one classifier call and no persistence.

use tracing::Instrument;
use triage_state::Identity;

use crate::classifier::Classifier;
use crate::domain::config::DEFAULT_TOP_N;
use crate::domain::{RawReport, Result, Threshold, TriageDecision, TriageError};
use crate::identity::{is_sentinel, resolve};
use crate::metrics::METRICS;
use crate::normalize::normalize;
use crate::obs;
use crate::router::{rank_candidates, route};
use crate::tags::classify;

/// Triage `report` asking the classifier for the default number of candidates.
pub async fn triage(
    report: &RawReport,
    roster: &[Identity],
    classifier: &dyn Classifier,
    threshold: Threshold,
) -> Result<TriageDecision> {
    triage_top_n(report, roster, classifier, threshold, DEFAULT_TOP_N).await
}

/// Triage `report` asking the classifier for `top_n` candidates.
///
/// An assignee hint overrides the classifier only when it resolves to an
/// exact or fuzzy match; ambiguous and unknown hints are recorded on the
/// decision and routing falls back to the classifier ranking. The classifier
/// output is ranked before it is cut to `top_n`.
pub async fn triage_top_n(
    report: &RawReport,
    roster: &[Identity],
    classifier: &dyn Classifier,
    threshold: Threshold,
    top_n: usize,
) -> Result<TriageDecision> {
    report.validate()?;
    decide(report, roster, classifier, threshold, top_n)
        .instrument(obs::report_span(&report.title, threshold))
        .await
}

async fn decide(
    report: &RawReport,
    roster: &[Identity],
    classifier: &dyn Classifier,
    threshold: Threshold,
    top_n: usize,
) -> Result<TriageDecision> {
    let hint = report.assignee_hint.as_deref().filter(|h| !is_sentinel(h));
    obs::emit_triage_started(&report.title, report.source.as_str(), hint.is_some());

    let text = report.combined_text();
    let tags = classify(&text);

    let resolution = hint.map(|h| {
        let result = resolve(h, roster);
        obs::emit_hint_resolved(h, &result);
        result
    });
    let override_identity = resolution.as_ref().and_then(|r| r.override_name());

    let features = normalize(&text).to_string();
    let mut candidates = rank_candidates(classifier.score(&features, top_n).await);
    candidates.truncate(top_n);

    let decision = match route(&candidates, threshold, override_identity) {
        Ok(decision) => decision,
        Err(TriageError::ClassifierUnavailable) => {
            obs::emit_classifier_unavailable(&report.title);
            METRICS.inc_classifier_unavailable();
            return Err(TriageError::ClassifierUnavailable);
        }
        Err(e) => return Err(e),
    };

    let decision = match resolution {
        Some(result) => decision.with_tags(tags).with_hint_resolution(result),
        None => decision.with_tags(tags),
    };

    obs::emit_decided(&decision);
    METRICS.record_decision(decision.is_auto_assigned);
    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::StaticClassifier;
    use crate::domain::{MatchStatus, ScoredCandidate};
    use async_trait::async_trait;

    /// Answers worst-first and ignores `top_n`.
    struct UnsortedClassifier;

    #[async_trait]
    impl Classifier for UnsortedClassifier {
        async fn score(&self, _text: &str, _top_n: usize) -> Vec<ScoredCandidate> {
            vec![
                ScoredCandidate::new("low", 0.1),
                ScoredCandidate::new("nan", f64::NAN),
                ScoredCandidate::new("mid", 0.4),
                ScoredCandidate::new("best", 0.8),
            ]
        }
    }

    fn t(v: f64) -> Threshold {
        Threshold::new(v).unwrap()
    }

    #[tokio::test]
    async fn classifier_sees_normalized_text() {
        let classifier = StaticClassifier::new(vec![ScoredCandidate::new("dev", 0.9)])
            .with_rule("crash click button", vec![ScoredCandidate::new("ui-dev", 0.7)]);
        let report = RawReport::new("App", "crashes when clicking the button");

        let d = triage(&report, &[], &classifier, t(0.5)).await.unwrap();
        assert_eq!(d.top_candidate, "ui-dev");
        assert_eq!(classifier.calls(), 1);
    }

    #[tokio::test]
    async fn sentinel_hint_is_ignored() {
        let classifier = StaticClassifier::new(vec![ScoredCandidate::new("Tyriar", 0.3)]);
        let roster = vec![Identity::new("1", "None Such", "none")];
        let report = RawReport::new("Terminal hangs", "").with_assignee_hint("none");

        let d = triage(&report, &roster, &classifier, t(0.5)).await.unwrap();
        assert_eq!(d.top_candidate, "Tyriar");
        assert!(!d.matched_from_external_hint);
        assert!(d.hint_resolution.is_none());
    }

    #[tokio::test]
    async fn ambiguous_hint_falls_back_to_classifier() {
        let classifier = StaticClassifier::new(vec![ScoredCandidate::new("Tyriar", 0.3)]);
        let roster = vec![
            Identity::new("1", "Sam Lee", "slee"),
            Identity::new("2", "Sam Lee", "samlee"),
        ];
        let report = RawReport::new("Terminal hangs", "").with_assignee_hint("Sam Lee");

        let d = triage(&report, &roster, &classifier, t(0.5)).await.unwrap();
        assert_eq!(d.top_candidate, "Tyriar");
        assert!(!d.is_auto_assigned);
        assert!(!d.matched_from_external_hint);
        assert_eq!(
            d.hint_resolution.map(|r| r.status),
            Some(MatchStatus::AmbiguousMatch)
        );
    }

    #[tokio::test]
    async fn blank_title_is_rejected_before_classifier() {
        let classifier = StaticClassifier::new(vec![ScoredCandidate::new("x", 0.9)]);
        let err = triage(&RawReport::new("", "body"), &[], &classifier, t(0.5))
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::InvalidReport(_)));
        assert_eq!(classifier.calls(), 0);
    }

    #[tokio::test]
    async fn candidates_are_ranked_before_cut_to_top_n() {
        let report = RawReport::new("Editor lag", "");
        let d = triage_top_n(&report, &[], &UnsortedClassifier, t(0.5), 2)
            .await
            .unwrap();
        assert_eq!(d.top_candidate, "best");
        assert!(d.is_auto_assigned);
        let names: Vec<_> = d.candidates.iter().map(|c| c.identity_name.as_str()).collect();
        assert_eq!(names, vec!["best", "mid"]);
    }

    fn assert_send<T: Send>(_: T) {}

    #[test]
    fn triage_future_is_send() {
        let report = RawReport::new("Editor lag", "");
        let classifier = StaticClassifier::unavailable();
        assert_send(triage(&report, &[], &classifier, t(0.5)));
    }
}
