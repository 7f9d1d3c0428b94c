//! Translation metrics.
//!
//! Counters are owned by an [`Engine`](crate::i18n::Engine) and survive
//! reloads. All updates are relaxed atomics; a report is a best-effort view.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Translation calls, successful or not
    translations: AtomicUsize,

    /// Calls whose message id was found in neither the requested nor the default language
    not_found: AtomicUsize,

    /// Calls served from the default language's definitions
    fallbacks: AtomicUsize,

    /// Localizers built (cache misses)
    localizer_builds: AtomicUsize,

    /// Catalog reloads
    reloads: AtomicUsize,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_translation(&self) {
        self.translations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_localizer_build(&self) {
        self.localizer_builds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reload(&self) {
        self.reloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn translations(&self) -> usize {
        self.translations.load(Ordering::Relaxed)
    }

    pub fn not_found(&self) -> usize {
        self.not_found.load(Ordering::Relaxed)
    }

    pub fn fallbacks(&self) -> usize {
        self.fallbacks.load(Ordering::Relaxed)
    }

    pub fn localizer_builds(&self) -> usize {
        self.localizer_builds.load(Ordering::Relaxed)
    }

    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let translations = self.translations();
        let not_found = self.not_found();
        let not_found_rate = if translations > 0 {
            (not_found as f64 / translations as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            translations,
            not_found,
            not_found_rate,
            fallbacks: self.fallbacks(),
            localizer_builds: self.localizer_builds(),
            reloads: self.reloads(),
        }
    }
}

/// Point-in-time copy of the engine counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub translations: usize,
    pub not_found: usize,

    /// Share of translations that missed, as a percentage (0-100)
    pub not_found_rate: f64,

    pub fallbacks: usize,
    pub localizer_builds: usize,
    pub reloads: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Counter Tests ====================

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = EngineMetrics::new();
        assert_eq!(metrics.translations(), 0);
        assert_eq!(metrics.not_found(), 0);
        assert_eq!(metrics.fallbacks(), 0);
        assert_eq!(metrics.localizer_builds(), 0);
        assert_eq!(metrics.reloads(), 0);
    }

    #[test]
    fn test_record_translation() {
        let metrics = EngineMetrics::new();
        metrics.record_translation();
        metrics.record_translation();
        assert_eq!(metrics.translations(), 2);
    }

    #[test]
    fn test_instances_are_independent() {
        let a = EngineMetrics::new();
        let b = EngineMetrics::new();
        a.record_localizer_build();
        assert_eq!(a.localizer_builds(), 1);
        assert_eq!(b.localizer_builds(), 0);
    }

    // ==================== Report Tests ====================

    #[test]
    fn test_report_empty() {
        let report = EngineMetrics::new().report();
        assert_eq!(report.translations, 0);
        assert_eq!(report.not_found_rate, 0.0);
    }

    #[test]
    fn test_report_not_found_rate() {
        let metrics = EngineMetrics::new();

        // 4 calls, 1 miss = 25%
        for _ in 0..4 {
            metrics.record_translation();
        }
        metrics.record_not_found();
        metrics.record_fallback();
        metrics.record_reload();

        let report = metrics.report();
        assert_eq!(report.translations, 4);
        assert_eq!(report.not_found, 1);
        assert_eq!(report.not_found_rate, 25.0);
        assert_eq!(report.fallbacks, 1);
        assert_eq!(report.reloads, 1);
    }

    #[test]
    fn test_report_serializes() {
        let metrics = EngineMetrics::new();
        metrics.record_translation();
        let json = serde_json::to_value(metrics.report()).unwrap();
        assert_eq!(json["translations"], 1);
        assert_eq!(json["not_found"], 0);
    }
}
