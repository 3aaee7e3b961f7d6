//! # Classifier
//!
//! ## Responsibility
//! Load the pre-trained churn model artifact once at startup and turn an
//! aligned [`FeatureRow`] into a churn probability.
//!
//! ## Guarantees
//! - A loaded model always declares exactly [`TRAINING_COLUMNS`], in order
//! - `predict_proba` returns a finite value in `[0, 1]` or an error
//! - Models are immutable after load; `&self` inference is safe to share
//!   across concurrent handlers via `Arc<dyn Classifier>`
//!
//! ## NOT Responsible For
//! - Training or exporting models
//! - Renaming request fields (that belongs to `features`)
//!
//! ## Artifact format
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "name": "churn-logreg",
//!   "columns": ["Gender", "Senior Citizen", "..."],
//!   "intercept": -0.4,
//!   "categorical": [
//!     { "column": "Contract", "weights": { "Month-to-month": 0.9, "Two year": -1.3 } }
//!   ],
//!   "numeric": [
//!     { "column": "Tenure Months", "mean": 32.4, "scale": 24.6, "weight": -0.8 }
//!   ]
//! }
//! ```
//!
//! Categories missing from `weights` contribute nothing to the score, the
//! same as an ignored unknown category in a one-hot encoder.

use crate::features::{FeatureRow, FeatureValue, TRAINING_COLUMNS};
use crate::ChurnError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Artifact format version understood by this build.
pub const FORMAT_VERSION: u32 = 1;

/// A pre-trained binary churn classifier.
///
/// Implementations must be thread-safe (Send + Sync); the service shares one
/// instance across all request handlers.
pub trait Classifier: Send + Sync {
    /// Probability of the positive (churn) class for one aligned row.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::Inference`] if the row does not match the
    /// model's columns or the score is not finite.
    fn predict_proba(&self, row: &FeatureRow) -> Result<f64, ChurnError>;

    /// Short identifier reported by the health endpoint.
    fn name(&self) -> &str;
}

/// Errors raised while loading a model artifact.
///
/// All of them are fatal at service startup.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The artifact file could not be read.
    #[error("IO error reading model {file}: {source}")]
    Io {
        /// Path of the artifact.
        file: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The artifact is not valid JSON for the expected layout.
    #[error("Parse error in model {file}: {source}")]
    Parse {
        /// Path or label of the artifact.
        file: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The artifact was written by an incompatible exporter.
    #[error("unsupported model format version {0} (expected {})", FORMAT_VERSION)]
    UnsupportedVersion(u32),

    /// The artifact's columns differ from the training schema.
    #[error("model columns do not match training schema: expected {expected:?}, found {found:?}")]
    ColumnMismatch {
        /// Columns this build aligns requests to.
        expected: Vec<String>,
        /// Columns declared by the artifact.
        found: Vec<String>,
    },

    /// A declared column has no encoder.
    #[error("column '{0}' has no encoder")]
    MissingEncoder(String),

    /// A column has more than one encoder.
    #[error("column '{0}' has more than one encoder")]
    DuplicateEncoder(String),

    /// An encoder refers to a column the model does not declare.
    #[error("encoder refers to undeclared column '{0}'")]
    UnknownColumn(String),

    /// A parameter is out of range (zero scale, non-finite weight, ...).
    #[error("invalid parameter for column '{column}': {reason}")]
    InvalidParameter {
        /// Column the parameter belongs to.
        column: String,
        /// Human-readable explanation.
        reason: String,
    },
}

// ── Serialized layout ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelArtifact {
    format_version: u32,
    #[serde(default = "default_model_name")]
    name: String,
    columns: Vec<String>,
    intercept: f64,
    #[serde(default)]
    categorical: Vec<CategoricalSpec>,
    #[serde(default)]
    numeric: Vec<NumericSpec>,
}

fn default_model_name() -> String {
    "churn-model".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CategoricalSpec {
    column: String,
    weights: HashMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NumericSpec {
    column: String,
    mean: f64,
    scale: f64,
    weight: f64,
}

// ── Runtime model ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Encoder {
    OneHot(HashMap<String, f64>),
    Scaled { mean: f64, scale: f64, weight: f64 },
}

/// Logistic regression over one-hot categorical and standardized numeric
/// columns.
#[derive(Debug, Clone)]
pub struct LogisticPipeline {
    name: String,
    intercept: f64,
    /// One encoder per entry of `TRAINING_COLUMNS`, same order.
    encoders: Vec<(String, Encoder)>,
}

/// Load a [`LogisticPipeline`] from a JSON artifact on disk.
///
/// # Errors
///
/// Returns [`ModelError::Io`] if the file cannot be read, and any error from
/// [`load_from_str`] otherwise.
pub fn load_from_file(path: &Path) -> Result<LogisticPipeline, ModelError> {
    let content = std::fs::read_to_string(path).map_err(|e| ModelError::Io {
        file: path.display().to_string(),
        source: e,
    })?;

    let model = load_from_str(&content, &path.display().to_string())?;
    info!(
        model = %model.name,
        path = %path.display(),
        columns = model.encoders.len(),
        "classifier loaded"
    );
    Ok(model)
}

/// Load a [`LogisticPipeline`] from JSON text.
///
/// # Errors
///
/// Returns [`ModelError::Parse`] for malformed JSON and the matching
/// compatibility variant if the artifact does not fit the training schema.
pub fn load_from_str(content: &str, source_name: &str) -> Result<LogisticPipeline, ModelError> {
    let artifact: ModelArtifact =
        serde_json::from_str(content).map_err(|e| ModelError::Parse {
            file: source_name.to_string(),
            source: e,
        })?;

    LogisticPipeline::from_artifact(artifact)
}

impl LogisticPipeline {
    fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        if artifact.format_version != FORMAT_VERSION {
            return Err(ModelError::UnsupportedVersion(artifact.format_version));
        }

        if !artifact.columns.iter().map(String::as_str).eq(TRAINING_COLUMNS) {
            return Err(ModelError::ColumnMismatch {
                expected: TRAINING_COLUMNS.iter().map(|c| c.to_string()).collect(),
                found: artifact.columns,
            });
        }

        check_finite("intercept", artifact.intercept)?;

        let mut by_column: HashMap<String, Encoder> = HashMap::new();

        for entry in artifact.categorical {
            for (category, weight) in &entry.weights {
                check_finite(&entry.column, *weight).map_err(|_| ModelError::InvalidParameter {
                    column: entry.column.clone(),
                    reason: format!("weight for '{category}' is not finite"),
                })?;
            }
            insert_encoder(&mut by_column, &artifact.columns, entry.column, |_| {
                Ok(Encoder::OneHot(entry.weights))
            })?;
        }

        for entry in artifact.numeric {
            insert_encoder(&mut by_column, &artifact.columns, entry.column, |column| {
                check_finite(column, entry.mean)?;
                check_finite(column, entry.weight)?;
                if !entry.scale.is_finite() || entry.scale == 0.0 {
                    return Err(ModelError::InvalidParameter {
                        column: column.to_string(),
                        reason: format!("scale must be finite and non-zero, got {}", entry.scale),
                    });
                }
                Ok(Encoder::Scaled {
                    mean: entry.mean,
                    scale: entry.scale,
                    weight: entry.weight,
                })
            })?;
        }

        let mut encoders = Vec::with_capacity(artifact.columns.len());
        for column in artifact.columns {
            let encoder = by_column
                .remove(&column)
                .ok_or_else(|| ModelError::MissingEncoder(column.clone()))?;
            encoders.push((column, encoder));
        }

        Ok(Self {
            name: artifact.name,
            intercept: artifact.intercept,
            encoders,
        })
    }

    /// Linear score (log-odds) before the logistic function.
    fn decision_function(&self, row: &FeatureRow) -> Result<f64, ChurnError> {
        if row.len() != self.encoders.len()
            || !row
                .columns()
                .eq(self.encoders.iter().map(|(c, _)| c.as_str()))
        {
            return Err(ChurnError::Inference(
                "feature row does not match the model's training columns".to_string(),
            ));
        }

        let mut z = self.intercept;
        for ((column, encoder), (_, value)) in self.encoders.iter().zip(row.iter()) {
            z += match (encoder, value) {
                (Encoder::OneHot(weights), FeatureValue::Text(category)) => {
                    weights.get(category).copied().unwrap_or(0.0)
                }
                (Encoder::Scaled { mean, scale, weight }, FeatureValue::Number(x)) => {
                    weight * (x - mean) / scale
                }
                (Encoder::OneHot(_), FeatureValue::Number(_)) => {
                    return Err(ChurnError::Inference(format!(
                        "column '{column}' is categorical but received a number"
                    )));
                }
                (Encoder::Scaled { .. }, FeatureValue::Text(_)) => {
                    return Err(ChurnError::Inference(format!(
                        "column '{column}' is numeric but received text"
                    )));
                }
            };
        }

        Ok(z)
    }
}

impl Classifier for LogisticPipeline {
    fn predict_proba(&self, row: &FeatureRow) -> Result<f64, ChurnError> {
        let z = self.decision_function(row)?;
        let p = 1.0 / (1.0 + (-z).exp());
        if !p.is_finite() {
            return Err(ChurnError::Inference(format!("non-finite score {z}")));
        }
        Ok(p.clamp(0.0, 1.0))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn check_finite(column: &str, value: f64) -> Result<(), ModelError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ModelError::InvalidParameter {
            column: column.to_string(),
            reason: format!("value {value} is not finite"),
        })
    }
}

fn insert_encoder(
    by_column: &mut HashMap<String, Encoder>,
    declared: &[String],
    column: String,
    build: impl FnOnce(&str) -> Result<Encoder, ModelError>,
) -> Result<(), ModelError> {
    if !declared.contains(&column) {
        return Err(ModelError::UnknownColumn(column));
    }
    if by_column.contains_key(&column) {
        return Err(ModelError::DuplicateEncoder(column));
    }
    let encoder = build(&column)?;
    by_column.insert(column, encoder);
    Ok(())
}

// ============================================================================
// Constant Classifier (Testing)
// ============================================================================

/// Classifier that always returns the same probability.
///
/// Useful for smoke tests of the HTTP surface without a model artifact.
#[derive(Debug, Clone)]
pub struct ConstantClassifier {
    probability: f64,
}

impl ConstantClassifier {
    /// Create a classifier returning `probability`, clamped to `[0, 1]`.
    pub fn new(probability: f64) -> Self {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        Self { probability }
    }
}

impl Classifier for ConstantClassifier {
    fn predict_proba(&self, _row: &FeatureRow) -> Result<f64, ChurnError> {
        Ok(self.probability)
    }

    fn name(&self) -> &str {
        "constant"
    }
}
