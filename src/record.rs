//! # Customer Record
//!
//! ## Responsibility
//! Define the request schema for `POST /predict` and validate raw JSON
//! bodies against it before anything reaches the classifier.
//!
//! ## Guarantees
//! - Validation collects *all* missing or mistyped fields before returning
//! - A record that passes validation always deserializes
//! - Unknown extra keys are ignored
//!
//! ## NOT Responsible For
//! - Renaming fields to the training schema (that belongs to `features`)

use schemars::JsonSchema;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// JSON type expected for a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A JSON string.
    Text,
    /// A JSON integer.
    Integer,
    /// Any JSON number; integers are accepted and widened.
    Number,
}

impl FieldKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldKind::Text => value.is_string(),
            FieldKind::Integer => value.as_i64().is_some(),
            FieldKind::Number => value.is_number(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            FieldKind::Text => "string",
            FieldKind::Integer => "integer",
            FieldKind::Number => "number",
        }
    }
}

/// Required request fields in declaration order.
pub const FIELDS: [(&str, FieldKind); 20] = [
    ("Gender", FieldKind::Text),
    ("Senior_Citizen", FieldKind::Text),
    ("Partner", FieldKind::Text),
    ("Dependents", FieldKind::Text),
    ("Tenure_Months", FieldKind::Integer),
    ("Phone_Service", FieldKind::Text),
    ("Multiple_Lines", FieldKind::Text),
    ("Internet_Service", FieldKind::Text),
    ("Online_Security", FieldKind::Text),
    ("Online_Backup", FieldKind::Text),
    ("Device_Protection", FieldKind::Text),
    ("Tech_Support", FieldKind::Text),
    ("Streaming_TV", FieldKind::Text),
    ("Streaming_Movies", FieldKind::Text),
    ("Contract", FieldKind::Text),
    ("Paperless_Billing", FieldKind::Text),
    ("Payment_Method", FieldKind::Text),
    ("Monthly_Charges", FieldKind::Number),
    ("Total_Charges", FieldKind::Number),
    ("CLTV", FieldKind::Number),
];

/// A single customer submitted for a churn prediction.
///
/// Wire names use underscores (`Senior_Citizen`); the training-time names
/// with spaces are produced by [`crate::features::align`]. `Latitude` and
/// `Longitude` are not part of the record: clients may send them but they
/// are dropped like any other unknown key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CustomerRecord {
    /// `Male` or `Female`.
    #[serde(rename = "Gender")]
    pub gender: String,
    /// `Yes` or `No`.
    #[serde(rename = "Senior_Citizen")]
    pub senior_citizen: String,
    /// `Yes` or `No`.
    #[serde(rename = "Partner")]
    pub partner: String,
    /// `Yes` or `No`.
    #[serde(rename = "Dependents")]
    pub dependents: String,
    /// Months the customer has been subscribed.
    #[serde(rename = "Tenure_Months")]
    pub tenure_months: i64,
    /// `Yes` or `No`.
    #[serde(rename = "Phone_Service")]
    pub phone_service: String,
    /// `Yes`, `No` or `No phone service`.
    #[serde(rename = "Multiple_Lines")]
    pub multiple_lines: String,
    /// `DSL`, `Fiber optic` or `No`.
    #[serde(rename = "Internet_Service")]
    pub internet_service: String,
    /// `Yes`, `No` or `No internet service`.
    #[serde(rename = "Online_Security")]
    pub online_security: String,
    /// `Yes`, `No` or `No internet service`.
    #[serde(rename = "Online_Backup")]
    pub online_backup: String,
    /// `Yes`, `No` or `No internet service`.
    #[serde(rename = "Device_Protection")]
    pub device_protection: String,
    /// `Yes`, `No` or `No internet service`.
    #[serde(rename = "Tech_Support")]
    pub tech_support: String,
    /// `Yes`, `No` or `No internet service`.
    #[serde(rename = "Streaming_TV")]
    pub streaming_tv: String,
    /// `Yes`, `No` or `No internet service`.
    #[serde(rename = "Streaming_Movies")]
    pub streaming_movies: String,
    /// `Month-to-month`, `One year` or `Two year`.
    #[serde(rename = "Contract")]
    pub contract: String,
    /// `Yes` or `No`.
    #[serde(rename = "Paperless_Billing")]
    pub paperless_billing: String,
    /// e.g. `Electronic check`, `Bank transfer (automatic)`.
    #[serde(rename = "Payment_Method")]
    pub payment_method: String,
    /// Current monthly bill.
    #[serde(rename = "Monthly_Charges")]
    pub monthly_charges: f64,
    /// Lifetime billed amount.
    #[serde(rename = "Total_Charges")]
    pub total_charges: f64,
    /// Customer lifetime value.
    #[serde(rename = "CLTV")]
    pub cltv: f64,
}

/// Why a field failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorKind {
    /// The field is absent (or `null`).
    Missing,
    /// The field is present with the wrong JSON type.
    WrongType {
        /// Name of the expected JSON type.
        expected: &'static str,
    },
    /// The body is not a JSON object.
    NotAnObject,
    /// The body passed field checks but still failed to deserialize.
    Invalid(String),
}

/// A single validation failure for one field of the request body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {}", describe(.kind))]
pub struct FieldError {
    /// Wire name of the offending field, or `"body"` for whole-body errors.
    pub field: String,
    /// What went wrong.
    pub kind: FieldErrorKind,
}

impl FieldError {
    pub(crate) fn new(field: &str, kind: FieldErrorKind) -> Self {
        Self {
            field: field.to_string(),
            kind,
        }
    }

    /// Human-readable description of the failure, without the field name.
    pub fn message(&self) -> String {
        describe(&self.kind)
    }
}

fn describe(kind: &FieldErrorKind) -> String {
    match kind {
        FieldErrorKind::Missing => "field required".to_string(),
        FieldErrorKind::WrongType { expected } => format!("expected {expected}"),
        FieldErrorKind::NotAnObject => "expected a JSON object".to_string(),
        FieldErrorKind::Invalid(reason) => reason.clone(),
    }
}

impl Serialize for FieldError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("FieldError", 2)?;
        s.serialize_field("field", &self.field)?;
        s.serialize_field("message", &self.message())?;
        s.end()
    }
}

impl CustomerRecord {
    /// Validate a raw JSON body and build a record from it.
    ///
    /// # Errors
    ///
    /// Returns every [`FieldError`] found: one per missing or mistyped field,
    /// or a single `body` error when the value is not an object.
    pub fn from_json(value: Value) -> Result<Self, Vec<FieldError>> {
        let Value::Object(map) = value else {
            return Err(vec![FieldError::new("body", FieldErrorKind::NotAnObject)]);
        };

        let errors = check_fields(&map);
        if !errors.is_empty() {
            return Err(errors);
        }

        serde_json::from_value(Value::Object(map))
            .map_err(|e| vec![FieldError::new("body", FieldErrorKind::Invalid(e.to_string()))])
    }

    /// JSON Schema describing the request body.
    pub fn json_schema() -> Value {
        serde_json::to_value(schemars::schema_for!(CustomerRecord)).unwrap_or(Value::Null)
    }
}

fn check_fields(map: &Map<String, Value>) -> Vec<FieldError> {
    let mut errors = Vec::new();

    for (name, kind) in FIELDS {
        match map.get(name) {
            None | Some(Value::Null) => {
                errors.push(FieldError::new(name, FieldErrorKind::Missing));
            }
            Some(v) if !kind.accepts(v) => {
                errors.push(FieldError::new(
                    name,
                    FieldErrorKind::WrongType {
                        expected: kind.name(),
                    },
                ));
            }
            Some(_) => {}
        }
    }

    errors
}

#[cfg(test)]
pub(crate) fn sample_json() -> Value {
    serde_json::json!({
        "Gender": "Female",
        "Senior_Citizen": "No",
        "Partner": "Yes",
        "Dependents": "No",
        "Tenure_Months": 12,
        "Phone_Service": "Yes",
        "Multiple_Lines": "No",
        "Internet_Service": "Fiber optic",
        "Online_Security": "No",
        "Online_Backup": "No",
        "Device_Protection": "No",
        "Tech_Support": "No",
        "Streaming_TV": "No",
        "Streaming_Movies": "No",
        "Contract": "Month-to-month",
        "Paperless_Billing": "Yes",
        "Payment_Method": "Electronic check",
        "Monthly_Charges": 79.85,
        "Total_Charges": 958.2,
        "CLTV": 3240
    })
}
