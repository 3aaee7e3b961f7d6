//! # Dashboard Binary
//!
//! Form UI in front of the prediction service.
//!
//! ```text
//! dashboard [--config FILE] [--api-url URL] [--port PORT]
//! ```
//!
//! The service must already be running at the configured API URL; the
//! dashboard starts regardless and reports failures per submission.

use std::path::PathBuf;

use churn_serve::config::{AppConfig, DashboardConfig};
use churn_serve::{config, dashboard, init_tracing};
use tracing::info;

/// Value following `name` in `args`, if present.
fn parse_arg(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

/// Apply CLI flags on top of `config`, validate, and keep the dashboard part.
fn apply_flags(
    mut config: AppConfig,
    args: &[String],
) -> Result<DashboardConfig, Box<dyn std::error::Error + Send + Sync>> {
    if let Some(url) = parse_arg(args, "--api-url") {
        config.dashboard.api_url = url;
    }
    if let Some(port) = parse_arg(args, "--port") {
        config.dashboard.port = port
            .parse()
            .map_err(|_| format!("--port: not a port number: {port}"))?;
    }
    Ok(config::validated(config)?.dashboard)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("Usage: dashboard [--config FILE] [--api-url URL] [--port PORT]");
        return Ok(());
    }

    let _ = init_tracing();

    let config_path = parse_arg(&args, "--config").map(PathBuf::from);
    let config = apply_flags(config::load(config_path.as_deref())?, &args)?;

    info!(api_url = %config.api_url, "Starting churn dashboard");
    dashboard::start_dashboard(config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_apply_flags_overrides_dashboard_settings() {
        let a = args(&["dashboard", "--api-url", "https://churn.example.com", "--port", "9100"]);
        let cfg = apply_flags(AppConfig::default(), &a).expect("valid");
        assert_eq!(cfg.api_url, "https://churn.example.com");
        assert_eq!(cfg.port, 9100);
    }

    #[test]
    fn test_apply_flags_rejects_url_without_scheme() {
        let a = args(&["dashboard", "--api-url", "churn-api:8000"]);
        let err = apply_flags(AppConfig::default(), &a).expect_err("fail");
        assert!(err.to_string().contains("dashboard.api_url"));
    }

    #[test]
    fn test_apply_flags_rejects_port_zero() {
        let a = args(&["dashboard", "--port", "0"]);
        let err = apply_flags(AppConfig::default(), &a).expect_err("fail");
        assert!(err.to_string().contains("dashboard.port"));
    }
}
