//! # Feature Alignment
//!
//! ## Responsibility
//! Adapt a validated [`CustomerRecord`] to the exact column names and order
//! the classifier was trained on.
//!
//! ## Guarantees
//! - Renaming is a bijection between the 15 underscore names and their
//!   spaced training names; every other field keeps its name
//! - An aligned row always has exactly [`TRAINING_COLUMNS`] in order
//! - `Latitude` / `Longitude` are present on every row, always `0.0`;
//!   client-supplied coordinates never reach the classifier
//!
//! ## NOT Responsible For
//! - Validating request bodies (that belongs to `record`)
//! - Encoding categories or scaling numbers (that belongs to `model`)

use crate::record::CustomerRecord;

/// Request field → training column, for every field whose name changes.
pub const RENAMED_FIELDS: [(&str, &str); 15] = [
    ("Senior_Citizen", "Senior Citizen"),
    ("Tenure_Months", "Tenure Months"),
    ("Phone_Service", "Phone Service"),
    ("Multiple_Lines", "Multiple Lines"),
    ("Internet_Service", "Internet Service"),
    ("Online_Security", "Online Security"),
    ("Online_Backup", "Online Backup"),
    ("Device_Protection", "Device Protection"),
    ("Tech_Support", "Tech Support"),
    ("Streaming_TV", "Streaming TV"),
    ("Streaming_Movies", "Streaming Movies"),
    ("Paperless_Billing", "Paperless Billing"),
    ("Payment_Method", "Payment Method"),
    ("Monthly_Charges", "Monthly Charges"),
    ("Total_Charges", "Total Charges"),
];

/// Column names and order used when the classifier was trained.
pub const TRAINING_COLUMNS: [&str; 22] = [
    "Gender",
    "Senior Citizen",
    "Partner",
    "Dependents",
    "Tenure Months",
    "Phone Service",
    "Multiple Lines",
    "Internet Service",
    "Online Security",
    "Online Backup",
    "Device Protection",
    "Tech Support",
    "Streaming TV",
    "Streaming Movies",
    "Contract",
    "Paperless Billing",
    "Payment Method",
    "Monthly Charges",
    "Total Charges",
    "CLTV",
    "Latitude",
    "Longitude",
];

/// Value injected for `Latitude` / `Longitude` on every row.
pub const GEO_PLACEHOLDER: f64 = 0.0;

/// Map a request field name to its training column name.
///
/// Names without a rename entry pass through unchanged.
pub fn training_name(field: &str) -> &str {
    RENAMED_FIELDS
        .iter()
        .find(|(from, _)| *from == field)
        .map_or(field, |(_, to)| *to)
}

/// Map a training column name back to its request field name.
///
/// Inverse of [`training_name`].
pub fn request_name(column: &str) -> &str {
    RENAMED_FIELDS
        .iter()
        .find(|(_, to)| *to == column)
        .map_or(column, |(from, _)| *from)
}

/// A single cell of a feature row.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    /// Categorical value, one-hot encoded by the classifier.
    Text(String),
    /// Numeric value.
    Number(f64),
}

/// Ordered, named feature values ready for the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    cells: Vec<(String, FeatureValue)>,
}

impl FeatureRow {
    /// Build a row from explicit cells. Order is preserved as given.
    pub fn from_cells(cells: Vec<(String, FeatureValue)>) -> Self {
        Self { cells }
    }

    /// Look up a value by training column name.
    pub fn get(&self, column: &str) -> Option<&FeatureValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column names in row order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    /// `(column, value)` pairs in row order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// `true` when the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Align a validated record to the training schema.
///
/// Renames fields via [`training_name`], sets both geographic columns to
/// [`GEO_PLACEHOLDER`] and emits cells in [`TRAINING_COLUMNS`] order.
pub fn align(record: &CustomerRecord) -> FeatureRow {
    let text = |s: &str| FeatureValue::Text(s.to_string());
    let num = FeatureValue::Number;

    let fields: [(&str, FeatureValue); 22] = [
        ("Gender", text(&record.gender)),
        ("Senior_Citizen", text(&record.senior_citizen)),
        ("Partner", text(&record.partner)),
        ("Dependents", text(&record.dependents)),
        ("Tenure_Months", num(record.tenure_months as f64)),
        ("Phone_Service", text(&record.phone_service)),
        ("Multiple_Lines", text(&record.multiple_lines)),
        ("Internet_Service", text(&record.internet_service)),
        ("Online_Security", text(&record.online_security)),
        ("Online_Backup", text(&record.online_backup)),
        ("Device_Protection", text(&record.device_protection)),
        ("Tech_Support", text(&record.tech_support)),
        ("Streaming_TV", text(&record.streaming_tv)),
        ("Streaming_Movies", text(&record.streaming_movies)),
        ("Contract", text(&record.contract)),
        ("Paperless_Billing", text(&record.paperless_billing)),
        ("Payment_Method", text(&record.payment_method)),
        ("Monthly_Charges", num(record.monthly_charges)),
        ("Total_Charges", num(record.total_charges)),
        ("CLTV", num(record.cltv)),
        ("Latitude", num(GEO_PLACEHOLDER)),
        ("Longitude", num(GEO_PLACEHOLDER)),
    ];

    let mut cells: Vec<(String, FeatureValue)> = fields
        .into_iter()
        .map(|(field, value)| (training_name(field).to_string(), value))
        .collect();

    cells.sort_by_key(|(name, _)| column_index(name));

    FeatureRow { cells }
}

fn column_index(column: &str) -> usize {
    TRAINING_COLUMNS
        .iter()
        .position(|c| *c == column)
        .unwrap_or(TRAINING_COLUMNS.len())
}
