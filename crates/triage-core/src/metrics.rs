//! Global atomic counters for triage observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of an import).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters.
pub struct Metrics {
    reports_triaged: AtomicU64,
    auto_assigned: AtomicU64,
    manual_review: AtomicU64,
    classifier_unavailable: AtomicU64,
    duplicates_skipped: AtomicU64,
    import_errors: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            reports_triaged: AtomicU64::new(0),
            auto_assigned: AtomicU64::new(0),
            manual_review: AtomicU64::new(0),
            classifier_unavailable: AtomicU64::new(0),
            duplicates_skipped: AtomicU64::new(0),
            import_errors: AtomicU64::new(0),
        }
    }

    /// Count one decision, split by routing outcome.
    pub fn record_decision(&self, auto_assigned: bool) {
        self.reports_triaged.fetch_add(1, Ordering::Relaxed);
        if auto_assigned {
            self.auto_assigned.fetch_add(1, Ordering::Relaxed);
        } else {
            self.manual_review.fetch_add(1, Ordering::Relaxed);
        }
        tracing::trace!(metric = "reports_triaged", "counter incremented");
    }

    pub fn inc_classifier_unavailable(&self) {
        self.classifier_unavailable.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "classifier_unavailable", "counter incremented");
    }

    pub fn inc_duplicates_skipped(&self) {
        self.duplicates_skipped.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "duplicates_skipped", "counter incremented");
    }

    pub fn inc_import_errors(&self) {
        self.import_errors.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "import_errors", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            reports_triaged = self.reports_triaged(),
            auto_assigned = self.auto_assigned(),
            manual_review = self.manual_review(),
            classifier_unavailable = self.classifier_unavailable(),
            duplicates_skipped = self.duplicates_skipped(),
            import_errors = self.import_errors(),
        );
    }

    pub fn reports_triaged(&self) -> u64 {
        self.reports_triaged.load(Ordering::Relaxed)
    }

    pub fn auto_assigned(&self) -> u64 {
        self.auto_assigned.load(Ordering::Relaxed)
    }

    pub fn manual_review(&self) -> u64 {
        self.manual_review.load(Ordering::Relaxed)
    }

    pub fn classifier_unavailable(&self) -> u64 {
        self.classifier_unavailable.load(Ordering::Relaxed)
    }

    pub fn duplicates_skipped(&self) -> u64 {
        self.duplicates_skipped.load(Ordering::Relaxed)
    }

    pub fn import_errors(&self) -> u64 {
        self.import_errors.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.reports_triaged.store(0, Ordering::Relaxed);
        self.auto_assigned.store(0, Ordering::Relaxed);
        self.manual_review.store(0, Ordering::Relaxed);
        self.classifier_unavailable.store(0, Ordering::Relaxed);
        self.duplicates_skipped.store(0, Ordering::Relaxed);
        self.import_errors.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decisions_split_by_outcome() {
        let m = Metrics::new();
        m.record_decision(true);
        m.record_decision(false);
        m.record_decision(true);
        assert_eq!(m.reports_triaged(), 3);
        assert_eq!(m.auto_assigned(), 2);
        assert_eq!(m.manual_review(), 1);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.record_decision(true);
        m.inc_classifier_unavailable();
        m.inc_duplicates_skipped();
        m.inc_import_errors();
        m.reset();
        assert_eq!(m.reports_triaged(), 0);
        assert_eq!(m.classifier_unavailable(), 0);
        assert_eq!(m.duplicates_skipped(), 0);
        assert_eq!(m.import_errors(), 0);
    }
}
