//! # churn-serve
//!
//! Serves a pre-trained customer churn classifier over HTTP and renders its
//! predictions in a form-based web dashboard.
//!
//! ## Architecture
//!
//! ```text
//! dashboard form → POST /predict (JSON) → validate → align features
//!                → Classifier::predict_proba → { churn_probability, prediction }
//! ```
//!
//! The classifier is loaded once at startup and shared read-only across all
//! request handlers as an `Arc<dyn Classifier>`.

// ── Lint policy ───────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(missing_docs)]

use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod dashboard;
pub mod features;
pub mod metrics;
pub mod model;
pub mod prediction;
pub mod record;
pub mod service;

// Re-exports for convenience
pub use features::{align, FeatureRow, FeatureValue, TRAINING_COLUMNS};
pub use model::{Classifier, ConstantClassifier, LogisticPipeline, ModelError};
pub use prediction::{Prediction, RiskBucket};
pub use record::{CustomerRecord, FieldError};

/// Initialise the global tracing subscriber.
///
/// Reads the `LOG_FORMAT` environment variable to choose output format:
/// - `"json"` — structured JSON output for log aggregators
/// - anything else (including unset) — human-readable pretty output
///
/// Filter level is controlled by `RUST_LOG` (e.g. `RUST_LOG=info`), falling
/// back to `info` when unset.
///
/// # Errors
///
/// Returns [`ChurnError::Other`] if the global subscriber has already been
/// set (e.g. by a previous call or a test harness).
///
/// # Example
///
/// ```no_run
/// # use churn_serve::{init_tracing, ChurnError};
/// # fn example() -> Result<(), ChurnError> {
/// init_tracing()?;
/// # Ok(()) }
/// ```
pub fn init_tracing() -> Result<(), ChurnError> {
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .try_init(),
        _ => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(filter)
            .try_init(),
    };

    result.map_err(|e| ChurnError::Other(format!("tracing init failed: {e}")))
}

/// Top-level errors shared across the service and the dashboard.
#[derive(Error, Debug)]
pub enum ChurnError {
    /// The classifier could not produce a probability for a feature row.
    #[error("inference failed: {0}")]
    Inference(String),

    /// The model artifact could not be loaded.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Catch-all for errors that do not fit a specific variant.
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_churn_error_inference_display() {
        let err = ChurnError::Inference("row has 3 columns".to_string());
        assert_eq!(err.to_string(), "inference failed: row has 3 columns");
    }

    #[test]
    fn test_churn_error_from_model_error_is_transparent() {
        let model_err = ModelError::UnsupportedVersion(9);
        let expected = model_err.to_string();
        let err: ChurnError = model_err.into();
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn test_init_tracing_second_call_returns_error_not_panic() {
        let _ = init_tracing();
        let second = init_tracing();
        assert!(second.is_err());
    }
}
