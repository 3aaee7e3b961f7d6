//! # Dashboard
//!
//! ## Responsibility
//! Serve an HTML form for the customer fields an account manager knows,
//! forward each submission to the prediction service and render the result.
//!
//! ## Routes
//!
//! - `GET  /` — Empty form with default values
//! - `POST /predict` — Urlencoded form submission; renders results or failure
//! - `GET  /health` — Health check with the configured predict URL
//!
//! ## Guarantees
//! - Invalid form input never reaches the prediction service
//! - Upstream failures show "Prediction failed" and echo the raw body
//! - Single HTML shell served inline, no static files at runtime
//!
//! ## NOT Responsible For
//! - Prediction logic (delegates to the service over HTTP)

pub mod client;
pub mod form;
pub mod render;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

pub use client::{DashboardError, PredictionClient};
pub use form::{build_payload, DashboardForm, FormError};

use crate::config::DashboardConfig;

/// Shared state accessible from all dashboard handlers.
pub struct DashboardState {
    client: PredictionClient,
}

impl DashboardState {
    /// State backed by the service at `config.api_url`.
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            client: PredictionClient::new(
                &config.api_url,
                Duration::from_secs(config.request_timeout_secs),
            ),
        }
    }
}

/// Build the dashboard [`Router`].
pub fn build_router(state: Arc<DashboardState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/predict", post(predict_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the dashboard HTTP server and serve until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be parsed or the TCP listener
/// fails to bind.
pub async fn start_dashboard(
    config: DashboardConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let socket_addr: std::net::SocketAddr = config.bind_addr().parse()?;
    let state = Arc::new(DashboardState::new(&config));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&socket_addr).await?;
    info!(
        api_url = %config.api_url,
        "Dashboard ready at http://{}", socket_addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(crate::service::shutdown_signal())
        .await?;

    Ok(())
}

async fn index_handler() -> Html<String> {
    Html(render::form_page(&DashboardForm::default().to_fields(), &[]))
}

async fn predict_handler(
    State(state): State<Arc<DashboardState>>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    match submit(&state.client, &fields).await {
        Ok(prediction) => Html(render::result_page(&fields, &prediction)).into_response(),
        Err(error) => {
            let status = match &error {
                DashboardError::Form(_) => StatusCode::UNPROCESSABLE_ENTITY,
                DashboardError::Upstream { .. } | DashboardError::Transport(_) => {
                    StatusCode::BAD_GATEWAY
                }
            };
            warn!(error = %error, "prediction not shown");
            (status, Html(render::failure_page(&fields, &error))).into_response()
        }
    }
}

/// Validate the submission, build the payload and call the service.
async fn submit(
    client: &PredictionClient,
    fields: &HashMap<String, String>,
) -> Result<crate::prediction::Prediction, DashboardError> {
    let form = DashboardForm::from_fields(fields).map_err(DashboardError::Form)?;
    client.predict(&build_payload(&form)).await
}

async fn health_handler(State(state): State<Arc<DashboardState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "predict_url": state.client.predict_url(),
    }))
}
