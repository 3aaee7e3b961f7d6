//! Dashboard form: fixed field set, choice lists and payload construction.
//!
//! Only a subset of the Customer Record is user-editable. The remaining
//! service flags are filled with fixed defaults by [`build_payload`].

use serde_json::{json, Value};
use std::collections::HashMap;

/// Choices for `Gender`.
pub const GENDERS: [&str; 2] = ["Male", "Female"];

/// Choices for the yes/no fields.
pub const YES_NO: [&str; 2] = ["Yes", "No"];

/// Choices for `Contract`.
pub const CONTRACTS: [&str; 3] = ["Month-to-month", "One year", "Two year"];

/// Choices for `Payment_Method`.
pub const PAYMENT_METHODS: [&str; 4] = [
    "Electronic check",
    "Mailed check",
    "Credit card (automatic)",
    "Bank transfer (automatic)",
];

/// Service flags the form does not expose, sent with every request.
pub const FIXED_FIELDS: [(&str, &str); 10] = [
    ("Phone_Service", "Yes"),
    ("Multiple_Lines", "No"),
    ("Internet_Service", "Fiber optic"),
    ("Online_Security", "No"),
    ("Online_Backup", "No"),
    ("Device_Protection", "No"),
    ("Tech_Support", "No"),
    ("Streaming_TV", "No"),
    ("Streaming_Movies", "No"),
    ("Paperless_Billing", "Yes"),
];

/// A rejected form input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FormError {
    /// Form field name (the request wire name).
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl FormError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Validated dashboard inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardForm {
    /// One of [`GENDERS`].
    pub gender: String,
    /// One of [`YES_NO`].
    pub senior_citizen: String,
    /// One of [`YES_NO`].
    pub partner: String,
    /// One of [`YES_NO`].
    pub dependents: String,
    /// Whole months, never negative.
    pub tenure_months: i64,
    /// Never negative.
    pub monthly_charges: f64,
    /// Never negative.
    pub total_charges: f64,
    /// Never negative.
    pub cltv: f64,
    /// One of [`CONTRACTS`].
    pub contract: String,
    /// One of [`PAYMENT_METHODS`].
    pub payment_method: String,
    /// Degrees.
    pub latitude: f64,
    /// Degrees.
    pub longitude: f64,
}

impl Default for DashboardForm {
    /// First choice of every list, zero amounts, Los Angeles coordinates.
    fn default() -> Self {
        Self {
            gender: GENDERS[0].to_string(),
            senior_citizen: YES_NO[0].to_string(),
            partner: YES_NO[0].to_string(),
            dependents: YES_NO[0].to_string(),
            tenure_months: 0,
            monthly_charges: 0.0,
            total_charges: 0.0,
            cltv: 0.0,
            contract: CONTRACTS[0].to_string(),
            payment_method: PAYMENT_METHODS[0].to_string(),
            latitude: 34.0,
            longitude: -118.0,
        }
    }
}

impl DashboardForm {
    /// Parse submitted urlencoded fields, collecting every error.
    ///
    /// # Errors
    ///
    /// One [`FormError`] per missing, out-of-choice, non-numeric or negative
    /// input.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, Vec<FormError>> {
        let mut errors = Vec::new();
        let mut p = Parser {
            fields,
            errors: &mut errors,
        };

        let form = Self {
            gender: p.choice("Gender", &GENDERS),
            senior_citizen: p.choice("Senior_Citizen", &YES_NO),
            partner: p.choice("Partner", &YES_NO),
            dependents: p.choice("Dependents", &YES_NO),
            tenure_months: p.count("Tenure_Months"),
            monthly_charges: p.amount("Monthly_Charges"),
            total_charges: p.amount("Total_Charges"),
            cltv: p.amount("CLTV"),
            contract: p.choice("Contract", &CONTRACTS),
            payment_method: p.choice("Payment_Method", &PAYMENT_METHODS),
            latitude: p.coordinate("Latitude"),
            longitude: p.coordinate("Longitude"),
        };

        if errors.is_empty() {
            Ok(form)
        } else {
            Err(errors)
        }
    }

    /// Inverse of [`DashboardForm::from_fields`], used to refill the form.
    pub fn to_fields(&self) -> HashMap<String, String> {
        [
            ("Gender", self.gender.clone()),
            ("Senior_Citizen", self.senior_citizen.clone()),
            ("Partner", self.partner.clone()),
            ("Dependents", self.dependents.clone()),
            ("Tenure_Months", self.tenure_months.to_string()),
            ("Monthly_Charges", self.monthly_charges.to_string()),
            ("Total_Charges", self.total_charges.to_string()),
            ("CLTV", self.cltv.to_string()),
            ("Contract", self.contract.clone()),
            ("Payment_Method", self.payment_method.clone()),
            ("Latitude", self.latitude.to_string()),
            ("Longitude", self.longitude.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

struct Parser<'a> {
    fields: &'a HashMap<String, String>,
    errors: &'a mut Vec<FormError>,
}

impl<'a> Parser<'a> {
    fn raw(&mut self, name: &str) -> Option<&'a str> {
        let fields = self.fields;
        match fields.get(name).map(|v| v.trim()) {
            Some(v) if !v.is_empty() => Some(v),
            _ => {
                self.errors.push(FormError::new(name, "field required"));
                None
            }
        }
    }

    fn choice(&mut self, name: &str, allowed: &[&str]) -> String {
        let Some(value) = self.raw(name) else {
            return String::new();
        };
        if allowed.contains(&value) {
            return value.to_string();
        }
        let message = format!("must be one of: {}", allowed.join(", "));
        self.errors.push(FormError::new(name, message));
        String::new()
    }

    fn count(&mut self, name: &str) -> i64 {
        let Some(value) = self.raw(name) else {
            return 0;
        };
        match value.parse::<i64>() {
            Ok(n) if n >= 0 => n,
            Ok(_) => {
                self.errors.push(FormError::new(name, "must not be negative"));
                0
            }
            Err(_) => {
                self.errors.push(FormError::new(name, "must be a whole number"));
                0
            }
        }
    }

    fn number(&mut self, name: &str) -> Option<f64> {
        let value = self.raw(name)?;
        match value.parse::<f64>() {
            Ok(n) if n.is_finite() => Some(n),
            _ => {
                self.errors.push(FormError::new(name, "must be a number"));
                None
            }
        }
    }

    fn amount(&mut self, name: &str) -> f64 {
        match self.number(name) {
            Some(n) if n < 0.0 => {
                self.errors.push(FormError::new(name, "must not be negative"));
                0.0
            }
            Some(n) => n,
            None => 0.0,
        }
    }

    fn coordinate(&mut self, name: &str) -> f64 {
        self.number(name).unwrap_or(0.0)
    }
}

/// Build the `POST /predict` body from the form plus [`FIXED_FIELDS`].
pub fn build_payload(form: &DashboardForm) -> Value {
    let mut payload = json!({
        "Gender": form.gender,
        "Senior_Citizen": form.senior_citizen,
        "Partner": form.partner,
        "Dependents": form.dependents,
        "Tenure_Months": form.tenure_months,
        "Contract": form.contract,
        "Payment_Method": form.payment_method,
        "Monthly_Charges": form.monthly_charges,
        "Total_Charges": form.total_charges,
        "CLTV": form.cltv,
        "Latitude": form.latitude,
        "Longitude": form.longitude,
    });
    if let Some(map) = payload.as_object_mut() {
        for (key, value) in FIXED_FIELDS {
            map.insert(key.to_string(), Value::from(value));
        }
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CustomerRecord;

    fn submitted() -> HashMap<String, String> {
        [
            ("Gender", "Female"),
            ("Senior_Citizen", "No"),
            ("Partner", "Yes"),
            ("Dependents", "No"),
            ("Tenure_Months", "5"),
            ("Monthly_Charges", "70.7"),
            ("Total_Charges", "353.5"),
            ("CLTV", "2800"),
            ("Contract", "One year"),
            ("Payment_Method", "Mailed check"),
            ("Latitude", "37.77"),
            ("Longitude", "-122.42"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_defaults_match_first_choices() {
        let form = DashboardForm::default();
        assert_eq!(form.gender, "Male");
        assert_eq!(form.contract, "Month-to-month");
        assert_eq!(form.payment_method, "Electronic check");
        assert_eq!(form.latitude, 34.0);
        assert_eq!(form.longitude, -118.0);
    }

    #[test]
    fn test_valid_submission_parses() {
        let form = DashboardForm::from_fields(&submitted()).expect("valid");
        assert_eq!(form.gender, "Female");
        assert_eq!(form.tenure_months, 5);
        assert_eq!(form.monthly_charges, 70.7);
        assert_eq!(form.contract, "One year");
        assert_eq!(form.longitude, -122.42);
    }

    #[test]
    fn test_unknown_choice_rejected() {
        let mut fields = submitted();
        fields.insert("Contract".into(), "Three year".into());
        let errors = DashboardForm::from_fields(&fields).expect_err("invalid");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "Contract");
        assert!(errors[0].message.contains("Month-to-month"));
    }

    #[test]
    fn test_negative_numbers_rejected() {
        let mut fields = submitted();
        fields.insert("Tenure_Months".into(), "-1".into());
        fields.insert("CLTV".into(), "-0.5".into());
        let errors = DashboardForm::from_fields(&fields).expect_err("invalid");
        let names: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(names, vec!["Tenure_Months", "CLTV"]);
    }

    #[test]
    fn test_negative_longitude_allowed() {
        let form = DashboardForm::from_fields(&submitted()).expect("valid");
        assert!(form.longitude < 0.0);
    }

    #[test]
    fn test_fractional_tenure_rejected() {
        let mut fields = submitted();
        fields.insert("Tenure_Months".into(), "2.5".into());
        let errors = DashboardForm::from_fields(&fields).expect_err("invalid");
        assert_eq!(errors[0].message, "must be a whole number");
    }

    #[test]
    fn test_missing_and_blank_fields_reported() {
        let mut fields = submitted();
        fields.remove("Gender");
        fields.insert("Total_Charges".into(), "  ".into());
        let errors = DashboardForm::from_fields(&fields).expect_err("invalid");
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.message == "field required"));
    }

    #[test]
    fn test_to_fields_parses_back() {
        let form = DashboardForm::from_fields(&submitted()).expect("valid");
        assert_eq!(DashboardForm::from_fields(&form.to_fields()), Ok(form));
        assert!(DashboardForm::from_fields(&DashboardForm::default().to_fields()).is_ok());
    }

    #[test]
    fn test_payload_contains_fixed_service_flags() {
        let payload = build_payload(&DashboardForm::default());
        assert_eq!(payload["Phone_Service"], "Yes");
        assert_eq!(payload["Multiple_Lines"], "No");
        assert_eq!(payload["Internet_Service"], "Fiber optic");
        assert_eq!(payload["Streaming_Movies"], "No");
        assert_eq!(payload["Paperless_Billing"], "Yes");
    }

    #[test]
    fn test_payload_is_a_valid_customer_record() {
        let form = DashboardForm::from_fields(&submitted()).expect("valid");
        let record = CustomerRecord::from_json(build_payload(&form)).expect("record");
        assert_eq!(record.gender, "Female");
        assert_eq!(record.tenure_months, 5);
    }
}
