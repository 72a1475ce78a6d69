//! Observability for the generation pipeline
//!
//! Provides:
//! - Prometheus metrics (generation latency, contribution counts, failures)
//! - Structured logging of pipeline events with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, Histogram, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for generation passes (in seconds)
const LATENCY_BUCKETS: &[f64] = &[0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0];

static GLOBAL_METRICS: OnceLock<GenerationMetricsInner> = OnceLock::new();

struct GenerationMetricsInner {
    generation_latency_seconds: Histogram,
    generations: IntCounter,
    generation_failures: IntCounter,
    contributions: IntCounterVec,
    parameters: IntGauge,
    metrics: IntGauge,
    patch_targets: IntGauge,
    merge_fallbacks: IntCounter,
    series_flushes: IntCounter,
}

impl GenerationMetricsInner {
    fn new() -> Self {
        Self {
            generation_latency_seconds: register_histogram!(
                "experiment_generation_latency_seconds",
                "Time spent building one experiment from the selections",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register generation_latency_seconds"),

            generations: register_int_counter!(
                "experiment_generations_total",
                "Number of experiments generated"
            )
            .expect("Failed to register generations"),

            generation_failures: register_int_counter!(
                "experiment_generation_failures_total",
                "Number of generation passes aborted by an error"
            )
            .expect("Failed to register generation_failures"),

            contributions: register_int_counter_vec!(
                "experiment_generation_contributions_total",
                "Contributions collected from selections, by capability",
                &["capability"]
            )
            .expect("Failed to register contributions"),

            parameters: register_int_gauge!(
                "experiment_generation_parameters",
                "Number of parameters in the last generated experiment"
            )
            .expect("Failed to register parameters"),

            metrics: register_int_gauge!(
                "experiment_generation_metrics",
                "Number of metrics in the last generated experiment"
            )
            .expect("Failed to register metrics"),

            patch_targets: register_int_gauge!(
                "experiment_generation_patch_targets",
                "Number of distinct patch targets in the last generated experiment"
            )
            .expect("Failed to register patch_targets"),

            merge_fallbacks: register_int_counter!(
                "experiment_generation_merge_fallbacks_total",
                "Number of times duplicate resources could not be merged"
            )
            .expect("Failed to register merge_fallbacks"),

            series_flushes: register_int_counter!(
                "experiment_generation_series_flushes_total",
                "Number of built-in metric series resets sent to Prometheus"
            )
            .expect("Failed to register series_flushes"),
        }
    }
}

/// Kinds of contributions collected from selections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Experiment,
    Parameter,
    Patch,
    Metric,
    Resource,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Experiment => "experiment",
            Capability::Parameter => "parameter",
            Capability::Patch => "patch",
            Capability::Metric => "metric",
            Capability::Resource => "resource",
        }
    }
}

/// Handle to the process wide generation metrics
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct GenerationMetrics {
    _private: (),
}

impl Default for GenerationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(GenerationMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &GenerationMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record a successful generation pass
    pub fn observe_generation(
        &self,
        duration_secs: f64,
        parameters: usize,
        metrics: usize,
        patch_targets: usize,
    ) {
        self.inner().generation_latency_seconds.observe(duration_secs);
        self.inner().generations.inc();
        self.inner().parameters.set(parameters as i64);
        self.inner().metrics.set(metrics as i64);
        self.inner().patch_targets.set(patch_targets as i64);
    }

    pub fn inc_generation_failures(&self) {
        self.inner().generation_failures.inc();
    }

    pub fn add_contributions(&self, capability: Capability, count: usize) {
        self.inner()
            .contributions
            .with_label_values(&[capability.as_str()])
            .inc_by(count as u64);
    }

    pub fn inc_merge_fallbacks(&self) {
        self.inner().merge_fallbacks.inc();
    }

    pub fn inc_series_flushes(&self) {
        self.inner().series_flushes.inc();
    }

    /// Render every registered metric in the Prometheus text format
    pub fn gather_text(&self) -> String {
        let mut buffer = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&prometheus::gather(), &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Structured logger for pipeline events
#[derive(Clone, Default)]
pub struct StructuredLogger;

impl StructuredLogger {
    pub fn new() -> Self {
        Self
    }

    /// Log a completed generation pass
    pub fn log_generated(
        &self,
        experiment: &str,
        parameters: usize,
        metrics: usize,
        patches: usize,
        resources: usize,
    ) {
        info!(
            event = "experiment_generated",
            experiment = %experiment,
            parameters = parameters,
            metrics = metrics,
            patches = patches,
            resources = resources,
            "Generated experiment"
        );
    }

    /// Log an aborted generation pass
    pub fn log_failure(&self, stage: &str, error: &dyn std::error::Error) {
        warn!(
            event = "experiment_generation_failed",
            stage = %stage,
            error = %error,
            "Experiment generation aborted"
        );
    }

    /// Log a merge failure that left the stream unmerged
    pub fn log_merge_fallback(&self, documents: usize, error: &dyn std::error::Error) {
        warn!(
            event = "merge_skipped",
            documents = documents,
            error = %error,
            "Could not merge generated resources, emitting them unmerged"
        );
    }

    /// Log a built-in metric series reset
    pub fn log_series_flush(&self, address: &str, series: usize) {
        info!(
            event = "series_flushed",
            address = %address,
            series = series,
            "Deleted built-in metric series"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_metrics_recorded() {
        let metrics = GenerationMetrics::new();
        metrics.observe_generation(0.002, 2, 1, 3);
        metrics.add_contributions(Capability::Parameter, 2);
        metrics.inc_generation_failures();
        metrics.inc_merge_fallbacks();

        let text = metrics.gather_text();
        assert!(text.contains("experiment_generation_latency_seconds"));
        assert!(text.contains("capability=\"parameter\""));
    }

    #[test]
    fn test_handles_share_registration() {
        let first = GenerationMetrics::new();
        let second = first.clone();
        first.inc_series_flushes();
        second.inc_series_flushes();
        assert!(GenerationMetrics::default()
            .gather_text()
            .contains("experiment_generation_series_flushes_total"));
    }
}
