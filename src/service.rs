//! # Prediction Service
//!
//! HTTP surface over the loaded classifier.
//!
//! ## Endpoints
//!
//! - `GET  /` — Liveness: `{"status": "API running"}`
//! - `POST /predict` — Validate a Customer Record and return a prediction
//! - `GET  /health` — Health check with version and model name
//! - `GET  /schema` — JSON Schema of the request body
//! - `GET  /metrics` — Prometheus metrics
//!
//! ## Guarantees
//! - Invalid bodies are rejected before the classifier is invoked
//! - The classifier is shared read-only; handlers hold no other state
//! - No panics: every failure maps to a JSON error response

use axum::{
    body::{Body, Bytes},
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::features::align;
use crate::metrics;
use crate::model::Classifier;
use crate::prediction::Prediction;
use crate::record::{CustomerRecord, FieldError, FieldErrorKind};
use crate::ChurnError;

/// Fixed liveness payload returned by `GET /`.
pub const LIVENESS_STATUS: &str = "API running";

/// Shared application state available to all handlers.
pub struct AppState {
    classifier: Arc<dyn Classifier>,
    started: Instant,
}

impl AppState {
    /// Wrap a loaded classifier for use by the router.
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier,
            started: Instant::now(),
        }
    }
}

// ============================================================================
// Server
// ============================================================================

/// Start the prediction service.
///
/// Binds to `config.host:config.port` and serves until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn start_server(
    config: ServiceConfig,
    classifier: Arc<dyn Classifier>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = config.bind_addr();
    let state = Arc::new(AppState::new(classifier));
    let app = build_router(state, config.max_request_size);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Prediction service ready on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Prediction service stopped");
    Ok(())
}

/// Build the [`Router`] with all service routes and middleware.
pub fn build_router(state: Arc<AppState>, max_request_size: usize) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/predict", post(predict_handler))
        .route("/health", get(health_handler))
        .route("/schema", get(schema_handler))
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(middleware::from_fn_with_state(
            max_request_size,
            body_size_middleware,
        ))
        .layer(DefaultBodyLimit::max(max_request_size))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolves on Ctrl-C; a failing signal handler resolves immediately.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install Ctrl-C handler");
    }
    info!("shutdown signal received");
}

/// Turn one validated record into a [`Prediction`].
///
/// # Errors
///
/// Propagates [`ChurnError::Inference`] from the classifier.
pub fn predict(classifier: &dyn Classifier, record: &CustomerRecord) -> Result<Prediction, ChurnError> {
    let start = Instant::now();
    let row = align(record);
    let probability = classifier.predict_proba(&row)?;
    let prediction = Prediction::from_probability(probability);

    metrics::record_prediction(
        prediction.is_churn(),
        prediction.churn_probability,
        start.elapsed(),
    );
    debug!(
        churn_probability = prediction.churn_probability,
        prediction = prediction.prediction,
        elapsed_us = start.elapsed().as_micros() as u64,
        "prediction served"
    );

    Ok(prediction)
}

// ============================================================================
// Middleware
// ============================================================================

/// Adds an `X-Request-ID` header to every response, preserving the client's
/// value when one was sent.
async fn request_id_middleware(req: Request<Body>, next: Next) -> Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut response = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }

    response
}

/// Rejects requests whose `Content-Length` exceeds `max_size` with 413.
async fn body_size_middleware(
    State(max_size): State<usize>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(content_length) = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<usize>().ok())
    {
        if content_length > max_size {
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({"error": "Request body too large"})),
            )
                .into_response();
        }
    }

    next.run(req).await
}

// ============================================================================
// Handlers
// ============================================================================

/// Static liveness indicator.
async fn root_handler() -> Json<Value> {
    Json(json!({ "status": LIVENESS_STATUS }))
}

/// Validate the body and classify the record.
///
/// The body is read as raw bytes so a missing or foreign `Content-Type` is
/// accepted; anything that is not valid JSON is a 422 like any other
/// schema violation.
async fn predict_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Prediction>, AppError> {
    let bytes = body?;

    let record = parse_body(&bytes).map_err(|errors| {
        metrics::inc_validation_error();
        warn!(
            fields = %errors.iter().map(|e| e.field.as_str()).collect::<Vec<_>>().join(","),
            "rejected invalid customer record"
        );
        AppError::Validation(errors)
    })?;

    let prediction = predict(state.classifier.as_ref(), &record).map_err(|e| {
        metrics::inc_inference_error();
        error!(error = %e, "classifier failed");
        AppError::Inference(e.to_string())
    })?;

    Ok(Json(prediction))
}

fn parse_body(bytes: &[u8]) -> Result<CustomerRecord, Vec<FieldError>> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| {
        vec![FieldError::new(
            "body",
            FieldErrorKind::Invalid(format!("invalid JSON: {e}")),
        )]
    })?;
    CustomerRecord::from_json(value)
}

/// Health check.
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.classifier.name(),
        "uptime_secs": state.started.elapsed().as_secs(),
    }))
}

/// JSON Schema of the request body.
async fn schema_handler() -> Json<Value> {
    Json(CustomerRecord::json_schema())
}

/// Prometheus text exposition.
async fn metrics_handler() -> String {
    metrics::gather_metrics()
}

// ============================================================================
// Error Type
// ============================================================================

/// Errors returned by service handlers, each mapped to a status and JSON body.
#[derive(Debug)]
pub enum AppError {
    /// The body is not JSON or does not match the Customer Record schema.
    Validation(Vec<FieldError>),
    /// The body could not be read at all.
    BadBody {
        /// Status chosen by the extractor (413 over the size limit).
        status: StatusCode,
        /// Extractor message.
        message: String,
    },
    /// The classifier failed on a valid record.
    Inference(String),
}

impl From<BytesRejection> for AppError {
    fn from(rejection: BytesRejection) -> Self {
        AppError::BadBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": "validation failed", "detail": errors })),
            )
                .into_response(),
            AppError::BadBody { status, message } => {
                (status, Json(json!({ "error": message }))).into_response()
            }
            AppError::Inference(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": message })),
            )
                .into_response(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
