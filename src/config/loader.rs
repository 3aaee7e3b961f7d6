//! Configuration loading.
//!
//! ## Responsibility
//! Read a TOML file from disk, parse it into an [`AppConfig`], apply
//! `CHURN_*` environment overrides and run validation before returning.
//!
//! ## Guarantees
//! - A successfully loaded config is always validated
//! - I/O errors and parse errors are distinguished in the error type
//! - File path is included in every error message
//!
//! ## Environment Variables
//!
//! - `CHURN_MODEL_PATH` — `service.model_path`
//! - `CHURN_HOST` — `service.host`
//! - `CHURN_PORT` — `service.port`
//! - `CHURN_API_URL` — `dashboard.api_url`
//! - `CHURN_DASHBOARD_PORT` — `dashboard.port`

use std::path::{Path, PathBuf};

use super::validation::{self, ConfigError};
use super::AppConfig;

/// Load a validated [`AppConfig`] from a TOML file.
///
/// # Errors
///
/// - `ConfigError::Io` if the file cannot be read.
/// - `ConfigError::Parse` if the TOML is malformed.
/// - `ConfigError::Validation` if semantic constraints are violated.
pub fn load_from_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        file: path.display().to_string(),
        source: e,
    })?;

    load_from_str(&content, &path.display().to_string())
}

/// Load a validated [`AppConfig`] from a TOML string.
///
/// # Errors
///
/// - `ConfigError::Parse` if the TOML is malformed.
/// - `ConfigError::Validation` if semantic constraints are violated.
pub fn load_from_str(content: &str, source_name: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
        file: source_name.to_string(),
        source: e,
    })?;

    validated(config)
}

/// Load the effective config: optional file, then environment overrides.
///
/// With `path == None` the built-in defaults are the starting point.
///
/// # Errors
///
/// Any error from [`load_from_file`], or `ConfigError::InvalidField` when an
/// environment variable cannot be parsed.
pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|e| ConfigError::Io {
                file: p.display().to_string(),
                source: e,
            })?;
            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                file: p.display().to_string(),
                source: e,
            })?
        }
        None => AppConfig::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok())?;
    validated(config)
}

/// Apply `CHURN_*` overrides using `lookup` to read variables.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` if a port variable is not a number.
pub fn apply_overrides(
    config: &mut AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(v) = lookup("CHURN_MODEL_PATH") {
        config.service.model_path = PathBuf::from(v);
    }
    if let Some(v) = lookup("CHURN_HOST") {
        config.service.host = v;
    }
    if let Some(v) = lookup("CHURN_PORT") {
        config.service.port = parse_port("CHURN_PORT", &v)?;
    }
    if let Some(v) = lookup("CHURN_API_URL") {
        config.dashboard.api_url = v;
    }
    if let Some(v) = lookup("CHURN_DASHBOARD_PORT") {
        config.dashboard.port = parse_port("CHURN_DASHBOARD_PORT", &v)?;
    }
    Ok(())
}

fn parse_port(var: &str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidField {
        field: var.to_string(),
        value: value.to_string(),
        reason: "must be a port number".to_string(),
    })
}

/// Run validation on a config that was changed after loading, such as by
/// command-line flags.
///
/// # Errors
///
/// Returns `ConfigError::Validation` listing every violated constraint.
pub fn validated(config: AppConfig) -> Result<AppConfig, ConfigError> {
    validation::validate(&config).map_err(|errors| {
        ConfigError::Validation(
            errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
        )
    })?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const VALID_TOML: &str = r#"
[service]
host = "0.0.0.0"
port = 8080
model_path = "/srv/models/churn.json"

[dashboard]
port = 9501
api_url = "http://churn-api:8080"
request_timeout_secs = 5
"#;

    #[test]
    fn test_load_from_str_valid() {
        let cfg = load_from_str(VALID_TOML, "inline").expect("valid");
        assert_eq!(cfg.service.host, "0.0.0.0");
        assert_eq!(cfg.service.port, 8080);
        assert_eq!(cfg.service.model_path, PathBuf::from("/srv/models/churn.json"));
        assert_eq!(cfg.dashboard.api_url, "http://churn-api:8080");
        assert_eq!(cfg.dashboard.request_timeout_secs, 5);
    }

    #[test]
    fn test_load_from_str_empty_uses_defaults() {
        let cfg = load_from_str("", "empty").expect("valid");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_load_from_str_malformed_is_parse_error() {
        let err = load_from_str("[service\nport = ", "broken.toml").expect_err("fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_load_from_str_wrong_type_is_parse_error() {
        let err = load_from_str("[service]\nport = \"eighty\"\n", "t").expect_err("fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_from_str_invalid_values_fail_validation() {
        let err = load_from_str("[service]\nport = 0\n", "t").expect_err("fail");
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("service.port"));
    }

    #[test]
    fn test_load_from_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(VALID_TOML.as_bytes()).expect("write");
        let cfg = load_from_file(file.path()).expect("load");
        assert_eq!(cfg.dashboard.port, 9501);
    }

    #[test]
    fn test_sample_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("churn.toml");
        assert_eq!(load_from_file(&path).expect("load"), AppConfig::default());
    }

    #[test]
    fn test_load_from_missing_file_is_io_error() {
        let err = load_from_file(Path::new("/nonexistent/churn.toml")).expect_err("fail");
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let mut cfg = load_from_str(VALID_TOML, "inline").expect("valid");
        let env: HashMap<&str, &str> = [
            ("CHURN_MODEL_PATH", "other.json"),
            ("CHURN_PORT", "7000"),
            ("CHURN_API_URL", "https://churn.example.com"),
        ]
        .into_iter()
        .collect();
        apply_overrides(&mut cfg, |k| env.get(k).map(|v| v.to_string())).expect("apply");
        assert_eq!(cfg.service.model_path, PathBuf::from("other.json"));
        assert_eq!(cfg.service.port, 7000);
        assert_eq!(cfg.service.host, "0.0.0.0");
        assert_eq!(cfg.dashboard.api_url, "https://churn.example.com");
    }

    #[test]
    fn test_override_with_bad_port_is_invalid_field() {
        let mut cfg = AppConfig::default();
        let err = apply_overrides(&mut cfg, |k| {
            (k == "CHURN_DASHBOARD_PORT").then(|| "lots".to_string())
        })
        .expect_err("fail");
        assert!(matches!(err, ConfigError::InvalidField { .. }));
    }

    #[test]
    fn test_validated_rejects_values_set_after_loading() {
        let mut cfg = load_from_str(VALID_TOML, "inline").expect("valid");
        cfg.service.port = 0;
        cfg.dashboard.api_url = "churn-api:8080".to_string();
        let err = validated(cfg).expect_err("fail");
        let message = err.to_string();
        assert!(message.contains("service.port"));
        assert!(message.contains("dashboard.api_url"));
    }

    #[test]
    fn test_no_overrides_leaves_config_unchanged() {
        let mut cfg = AppConfig::default();
        apply_overrides(&mut cfg, |_| None).expect("apply");
        assert_eq!(cfg, AppConfig::default());
    }
}
