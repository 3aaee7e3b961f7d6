//! Prediction service binary.
//!
//! ```text
//! churn-serve [--config FILE] [--model FILE] [--host H] [--port P]
//! churn-serve --print-config-schema
//! ```
//!
//! ## Environment Variables
//!
//! - `LOG_FORMAT=json` — structured JSON output (production)
//! - `RUST_LOG=info` — log level filter (default: info)
//! - `CHURN_*` — config overrides, see [`churn_serve::config::loader`]

use std::path::PathBuf;
use std::sync::Arc;

use churn_serve::config::AppConfig;
use churn_serve::{config, init_tracing, metrics, model, service};
use tracing::{error, info};

const USAGE: &str = "\
Usage: churn-serve [--config FILE] [--model FILE] [--host HOST] [--port PORT]
       churn-serve --print-config-schema";

/// Value following `name` in `args`, if present.
fn flag_value(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

/// Apply CLI flags on top of `config` and validate the result.
///
/// Flags take precedence over file and environment.
fn apply_flags(
    mut config: AppConfig,
    args: &[String],
) -> Result<AppConfig, Box<dyn std::error::Error + Send + Sync>> {
    if let Some(model) = flag_value(args, "--model") {
        config.service.model_path = PathBuf::from(model);
    }
    if let Some(host) = flag_value(args, "--host") {
        config.service.host = host;
    }
    if let Some(port) = flag_value(args, "--port") {
        config.service.port = port
            .parse()
            .map_err(|_| format!("--port: not a port number: {port}"))?;
    }
    Ok(config::validated(config)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{USAGE}");
        return Ok(());
    }
    if args.iter().any(|a| a == "--print-config-schema") {
        println!("{}", serde_json::to_string_pretty(&config::json_schema())?);
        return Ok(());
    }

    let _ = init_tracing();
    metrics::init_metrics()?;

    let config_path = flag_value(&args, "--config").map(PathBuf::from);
    let config = apply_flags(config::load(config_path.as_deref())?, &args)?;

    let classifier = match model::load_from_file(&config.service.model_path) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!(error = %e, "failed to load model");
            return Err(e.into());
        }
    };
    info!(
        model = %config.service.model_path.display(),
        "Starting churn prediction service"
    );

    service::start_server(config.service, Arc::new(classifier)).await
}
