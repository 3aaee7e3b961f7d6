//! # Configuration
//!
//! ## Responsibility
//! Describe, parse and validate the settings of both binaries: the
//! prediction service and the dashboard.
//!
//! ## Precedence
//! ```text
//! built-in defaults < TOML file (--config) < CHURN_* env vars < CLI flags
//! ```
//!
//! ## Guarantees
//! - Every field has a documented default; an empty file is a valid config
//! - Validated: all semantic constraints are checked before a config is accepted
//! - Schema-exportable: JSON Schema output for editor completion
//!
//! ## NOT Responsible For
//! - Loading the model artifact (that belongs to `model`)
//! - CLI parsing (each binary owns its flags)

pub mod loader;
pub mod validation;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use loader::{load, load_from_file, load_from_str, validated};
pub use validation::ConfigError;

// ── Default value functions ──────────────────────────────────────────────

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_service_port() -> u16 {
    8000
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/churn_model.json")
}

/// 1 MiB; a customer record is a few hundred bytes.
fn default_max_request_size() -> usize {
    1024 * 1024
}

fn default_dashboard_port() -> u16 {
    8501
}

fn default_api_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

// ── Top-level config ─────────────────────────────────────────────────────

/// Root configuration shared by both binaries.
///
/// # Example
///
/// ```toml
/// [service]
/// port = 8000
/// model_path = "models/churn_model.json"
///
/// [dashboard]
/// api_url = "http://127.0.0.1:8000"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Prediction service settings.
    pub service: ServiceConfig,
    /// Dashboard settings.
    pub dashboard: DashboardConfig,
}

/// Settings for the prediction service HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// IP address or hostname to bind to.
    pub host: String,
    /// TCP port the service listens on.
    pub port: u16,
    /// Path of the serialized classifier loaded at startup.
    pub model_path: PathBuf,
    /// Maximum accepted request body size in bytes.
    pub max_request_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_service_port(),
            model_path: default_model_path(),
            max_request_size: default_max_request_size(),
        }
    }
}

impl ServiceConfig {
    /// `host:port` bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Settings for the dashboard web UI.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    /// IP address or hostname to bind to.
    pub host: String,
    /// TCP port the dashboard listens on.
    pub port: u16,
    /// Base URL of the prediction service.
    pub api_url: String,
    /// Timeout for one call to the prediction service, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_dashboard_port(),
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl DashboardConfig {
    /// `host:port` bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// JSON Schema of [`AppConfig`].
pub fn json_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(AppConfig)).unwrap_or(serde_json::Value::Null)
}
