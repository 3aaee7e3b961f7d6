//! Configuration validation engine.
//!
//! ## Responsibility
//! Validate semantic constraints on a parsed [`AppConfig`] that cannot be
//! expressed through the type system alone.
//!
//! ## Guarantees
//! - Validation collects *all* errors before returning (no short-circuit)
//! - Error messages include the field path and the invalid value

use super::AppConfig;

/// Errors arising from configuration parsing, validation, or I/O.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parsing failed.
    #[error("Parse error in {file}: {source}")]
    Parse {
        /// Path of the file that failed to parse.
        file: String,
        /// Underlying TOML deserialization error.
        #[source]
        source: toml::de::Error,
    },

    /// One or more semantic validation rules failed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A specific field has an out-of-range or contradictory value.
    #[error("Field '{field}' has invalid value {value}: {reason}")]
    InvalidField {
        /// Dot-separated field path (e.g., "service.port").
        field: String,
        /// String representation of the invalid value.
        value: String,
        /// Human-readable explanation of the constraint.
        reason: String,
    },

    /// File I/O error.
    #[error("IO error reading {file}: {source}")]
    Io {
        /// Path of the file that could not be read.
        file: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Validate all semantic constraints on an [`AppConfig`].
///
/// # Errors
///
/// Returns every violation found.
pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // ── Service ──────────────────────────────────────────────────────
    if config.service.host.trim().is_empty() {
        errors.push(invalid("service.host", "\"\"", "must not be empty"));
    }

    if config.service.port == 0 {
        errors.push(invalid("service.port", "0", "must be between 1 and 65535"));
    }

    if config.service.model_path.as_os_str().is_empty() {
        errors.push(invalid("service.model_path", "\"\"", "must not be empty"));
    }

    if config.service.max_request_size < 1024 {
        errors.push(invalid(
            "service.max_request_size",
            &config.service.max_request_size.to_string(),
            "must be at least 1024 bytes",
        ));
    }

    // ── Dashboard ────────────────────────────────────────────────────
    if config.dashboard.host.trim().is_empty() {
        errors.push(invalid("dashboard.host", "\"\"", "must not be empty"));
    }

    if config.dashboard.port == 0 {
        errors.push(invalid("dashboard.port", "0", "must be between 1 and 65535"));
    }

    let url = &config.dashboard.api_url;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        errors.push(invalid(
            "dashboard.api_url",
            url,
            "must start with http:// or https://",
        ));
    }

    if config.dashboard.request_timeout_secs == 0 {
        errors.push(invalid(
            "dashboard.request_timeout_secs",
            "0",
            "must be at least 1 second",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn invalid(field: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidField {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
