//! Prediction results and the qualitative risk buckets derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Probability above which a customer is labelled as churning.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Lower bound (inclusive) of the high-risk bucket.
pub const HIGH_RISK_THRESHOLD: f64 = 0.7;

/// Lower bound (inclusive) of the medium-risk bucket.
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.4;

/// JSON response body of `POST /predict`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// P(churn), rounded to 3 decimals.
    pub churn_probability: f64,
    /// `1` iff `churn_probability > 0.5`, else `0`.
    pub prediction: u8,
}

impl Prediction {
    /// Build a prediction from a raw classifier probability.
    ///
    /// The label is derived from the rounded probability so the two fields
    /// of the response never disagree.
    pub fn from_probability(probability: f64) -> Self {
        let probability = if probability.is_nan() { 0.0 } else { probability };
        let churn_probability = round3(probability.clamp(0.0, 1.0));
        Self {
            churn_probability,
            prediction: u8::from(churn_probability > DECISION_THRESHOLD),
        }
    }

    /// `true` when the customer is predicted to churn.
    pub fn is_churn(&self) -> bool {
        self.prediction == 1
    }

    /// `"Churn"` or `"No Churn"`.
    pub fn label(&self) -> &'static str {
        if self.is_churn() {
            "Churn"
        } else {
            "No Churn"
        }
    }

    /// Retention guidance shown next to the result.
    pub fn insight(&self) -> &'static str {
        if self.is_churn() {
            "This customer shows a high likelihood of churn. Recommended actions \
             include offering retention incentives, discounts, or contract upgrades."
        } else {
            "This customer shows a low churn risk. Current engagement strategy \
             appears effective."
        }
    }

    /// Risk bucket for the reported probability.
    pub fn risk(&self) -> RiskBucket {
        RiskBucket::from_probability(self.churn_probability)
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Three-tier qualitative label derived from a churn probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBucket {
    /// `p >= 0.7`
    High,
    /// `0.4 <= p < 0.7`
    Medium,
    /// `p < 0.4`
    Low,
}

impl RiskBucket {
    /// Bucket a probability; both thresholds are inclusive lower bounds.
    pub fn from_probability(probability: f64) -> Self {
        if probability >= HIGH_RISK_THRESHOLD {
            RiskBucket::High
        } else if probability >= MEDIUM_RISK_THRESHOLD {
            RiskBucket::Medium
        } else {
            RiskBucket::Low
        }
    }

    /// Display label, e.g. `"High Risk"`.
    pub fn label(self) -> &'static str {
        match self {
            RiskBucket::High => "High Risk",
            RiskBucket::Medium => "Medium Risk",
            RiskBucket::Low => "Low Risk",
        }
    }

    /// CSS class used by the dashboard.
    pub fn css_class(self) -> &'static str {
        match self {
            RiskBucket::High => "risk-high",
            RiskBucket::Medium => "risk-medium",
            RiskBucket::Low => "risk-low",
        }
    }
}

impl fmt::Display for RiskBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
