//! Prometheus metrics for the prediction service.
//!
//! ## Usage
//!
//! Call [`init_metrics`] once at process startup. The helper functions
//! (`record_prediction`, `inc_validation_error`, …) are no-ops if
//! `init_metrics` was never called, so handlers are always safe to run.
//!
//! ## Metrics Exposed
//!
//! | Name | Type | Labels |
//! |------|------|--------|
//! | `churn_predictions_total` | Counter | `label` |
//! | `churn_validation_errors_total` | Counter | — |
//! | `churn_inference_errors_total` | Counter | — |
//! | `churn_inference_duration_seconds` | Histogram | — |
//! | `churn_probability` | Histogram | — |

use crate::ChurnError;
use prometheus::{
    CounterVec, Encoder, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;
use std::time::Duration;

/// All service metrics, stored in a single [`OnceLock`].
pub struct Metrics {
    /// Registry that owns all metric descriptors.
    pub registry: Registry,
    /// Predictions served, by label (`churn` / `no_churn`).
    pub predictions_total: CounterVec,
    /// Request bodies rejected by schema validation.
    pub validation_errors: IntCounter,
    /// Classifier calls that returned an error.
    pub inference_errors: IntCounter,
    /// Time spent in alignment plus `predict_proba`.
    pub inference_duration: Histogram,
    /// Distribution of returned probabilities.
    pub probability: Histogram,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

fn init_err(e: prometheus::Error) -> ChurnError {
    ChurnError::Other(format!("metrics init failed: {e}"))
}

/// Build a metrics bundle registered with a fresh registry.
fn build() -> Result<Metrics, ChurnError> {
    let registry = Registry::new();

    let predictions_total = CounterVec::new(
        Opts::new("churn_predictions_total", "Predictions served by label"),
        &["label"],
    )
    .map_err(init_err)?;
    registry
        .register(Box::new(predictions_total.clone()))
        .map_err(init_err)?;

    let validation_errors = IntCounter::new(
        "churn_validation_errors_total",
        "Request bodies rejected by schema validation",
    )
    .map_err(init_err)?;
    registry
        .register(Box::new(validation_errors.clone()))
        .map_err(init_err)?;

    let inference_errors = IntCounter::new(
        "churn_inference_errors_total",
        "Classifier calls that failed",
    )
    .map_err(init_err)?;
    registry
        .register(Box::new(inference_errors.clone()))
        .map_err(init_err)?;

    let inference_duration = Histogram::with_opts(
        HistogramOpts::new(
            "churn_inference_duration_seconds",
            "Feature alignment plus classifier latency",
        )
        .buckets(vec![
            0.000_05, 0.000_1, 0.000_25, 0.000_5, 0.001, 0.002_5, 0.005, 0.01, 0.05,
        ]),
    )
    .map_err(init_err)?;
    registry
        .register(Box::new(inference_duration.clone()))
        .map_err(init_err)?;

    let probability = Histogram::with_opts(
        HistogramOpts::new("churn_probability", "Returned churn probabilities")
            .buckets(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]),
    )
    .map_err(init_err)?;
    registry
        .register(Box::new(probability.clone()))
        .map_err(init_err)?;

    Ok(Metrics {
        registry,
        predictions_total,
        validation_errors,
        inference_errors,
        inference_duration,
        probability,
    })
}

/// Initialise all metrics. Calling it a second time is a no-op.
///
/// # Errors
///
/// Returns [`ChurnError::Other`] if metric construction or registration
/// fails.
pub fn init_metrics() -> Result<(), ChurnError> {
    if METRICS.get().is_some() {
        return Ok(());
    }

    let metrics = build()?;
    // If another thread raced us, the first one wins; both bundles are identical.
    let _ = METRICS.set(metrics);
    Ok(())
}

fn metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

/// Record one served prediction.
///
/// No-op if metrics have not been initialised.
pub fn record_prediction(churn: bool, probability: f64, elapsed: Duration) {
    if let Some(m) = metrics() {
        let label = if churn { "churn" } else { "no_churn" };
        if let Ok(c) = m.predictions_total.get_metric_with_label_values(&[label]) {
            c.inc();
        }
        m.probability.observe(probability);
        m.inference_duration.observe(elapsed.as_secs_f64());
    }
}

/// Count a request body rejected by validation.
///
/// No-op if metrics have not been initialised.
pub fn inc_validation_error() {
    if let Some(m) = metrics() {
        m.validation_errors.inc();
    }
}

/// Count a classifier failure.
///
/// No-op if metrics have not been initialised.
pub fn inc_inference_error() {
    if let Some(m) = metrics() {
        m.inference_errors.inc();
    }
}

/// Encode all metrics in the Prometheus text exposition format.
///
/// Returns an empty string if metrics have not been initialised or if
/// encoding fails.
pub fn gather_metrics() -> String {
    let Some(m) = metrics() else {
        return String::new();
    };
    let families = m.registry.gather();
    let mut buffer = Vec::new();
    if TextEncoder::new().encode(&families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics_idempotent() {
        assert!(init_metrics().is_ok());
        assert!(init_metrics().is_ok());
    }

    #[test]
    fn test_build_registers_all_families() {
        let m = build().expect("build must succeed in tests");
        m.predictions_total
            .get_metric_with_label_values(&["churn"])
            .expect("label")
            .inc();
        m.validation_errors.inc();
        m.inference_errors.inc();
        m.inference_duration.observe(0.001);
        m.probability.observe(0.42);

        let names: Vec<String> = m
            .registry
            .gather()
            .iter()
            .map(|f| f.get_name().to_string())
            .collect();
        for expected in [
            "churn_predictions_total",
            "churn_validation_errors_total",
            "churn_inference_errors_total",
            "churn_inference_duration_seconds",
            "churn_probability",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
    }

    #[test]
    fn test_local_bundle_counts_exactly() {
        let m = build().expect("build");
        let churn = m
            .predictions_total
            .get_metric_with_label_values(&["churn"])
            .expect("label");
        churn.inc();
        churn.inc();
        assert_eq!(churn.get() as u64, 2);
        assert_eq!(m.validation_errors.get(), 0);
    }

    #[test]
    fn test_gather_after_record_contains_prediction_counter() {
        let _ = init_metrics();
        record_prediction(true, 0.81, Duration::from_micros(120));
        inc_validation_error();
        inc_inference_error();
        let text = gather_metrics();
        assert!(text.contains("churn_predictions_total"));
        assert!(text.contains("label=\"churn\""));
        assert!(text.contains("churn_validation_errors_total"));
    }
}
