//! Structured observability hooks for the triage lifecycle.
//!
//! This module provides:
//! - A report-scoped span (`report_span`) for instrumenting triage futures
//! - Emission functions for key events: start, hint resolution, decision,
//!   classifier unavailability, import summary
//!
//! Events are emitted at `info!` level; filter with `RUST_LOG`.

use tracing::{info, info_span, Span};

use crate::domain::{MatchResult, Threshold, TriageDecision};

/// Report-scoped span for one triage call.
///
/// Attach it to the triage future with [`tracing::Instrument`] so it is
/// entered only while that future is polled.
///
/// # Example
///
/// ```ignore
/// decide(..).instrument(report_span("App crash", threshold)).await
/// ```
pub fn report_span(report_title: &str, threshold: Threshold) -> Span {
    info_span!("triage.report", report = %report_title, threshold = %threshold)
}

/// Emit event: triage started for a report from `source`.
pub fn emit_triage_started(title: &str, source: &str, has_hint: bool) {
    info!(event = "triage.started", title = %title, source = %source, has_hint = has_hint);
}

/// Emit event: assignee hint resolved.
pub fn emit_hint_resolved(hint: &str, result: &MatchResult) {
    info!(
        event = "triage.hint_resolved",
        hint = %hint,
        status = %result.status,
        matched = result.matched_name.as_deref().unwrap_or(""),
        score = result.similarity_score,
    );
}

/// Emit event: routing decision made.
pub fn emit_decided(decision: &TriageDecision) {
    info!(
        event = "triage.decided",
        assignee = %decision.top_candidate,
        confidence = decision.confidence,
        threshold = decision.threshold_used,
        auto_assigned = decision.is_auto_assigned,
        from_hint = decision.matched_from_external_hint,
        tags = %decision.tags.join(","),
    );
}

/// Emit event: classifier returned nothing (warning level).
pub fn emit_classifier_unavailable(title: &str) {
    tracing::warn!(event = "triage.classifier_unavailable", title = %title);
}

/// Emit event: bulk import finished.
pub fn emit_import_finished(imported: usize, skipped_duplicates: usize, errored: usize) {
    info!(
        event = "import.finished",
        imported = imported,
        skipped_duplicates = skipped_duplicates,
        errored = errored,
    );
}
