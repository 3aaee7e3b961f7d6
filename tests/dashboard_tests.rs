//! Integration tests for the dashboard.
//!
//! The prediction service is replaced by a `wiremock` server so each test
//! controls exactly what the dashboard receives. One end-to-end test runs
//! the real service instead.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use churn_serve::config::{DashboardConfig, ServiceConfig};
use churn_serve::dashboard::{self, build_payload, DashboardForm};
use churn_serve::{service, ConstantClassifier};

// ============================================================================
// Test Infrastructure
// ============================================================================

static PORT_COUNTER: AtomicU16 = AtomicU16::new(29600);

fn next_port() -> u16 {
    PORT_COUNTER.fetch_add(1, Ordering::Relaxed)
}

async fn spawn_dashboard(api_url: String) -> String {
    let port = next_port();
    let config = DashboardConfig {
        host: "127.0.0.1".to_string(),
        port,
        api_url,
        request_timeout_secs: 2,
    };
    tokio::spawn(async move {
        let _ = dashboard::start_dashboard(config).await;
    });
    tokio::time::sleep(Duration::from_millis(300)).await;
    format!("http://127.0.0.1:{port}")
}

fn client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("reqwest client must build in tests")
}

fn form_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Gender", "Female"),
        ("Senior_Citizen", "No"),
        ("Partner", "Yes"),
        ("Dependents", "No"),
        ("Tenure_Months", "3"),
        ("Monthly_Charges", "89.1"),
        ("Total_Charges", "267.3"),
        ("CLTV", "3100"),
        ("Contract", "Month-to-month"),
        ("Payment_Method", "Electronic check"),
        ("Latitude", "34.0"),
        ("Longitude", "-118.0"),
    ]
}

async fn submit(base: &str, fields: &[(&str, &str)]) -> (StatusCode, String) {
    let resp = client()
        .post(format!("{base}/predict"))
        .form(fields)
        .send()
        .await
        .expect("request");
    let status = resp.status();
    (status, resp.text().await.expect("html"))
}

// ============================================================================
// Rendering
// ============================================================================

#[tokio::test]
async fn test_form_lists_every_choice() {
    let base = spawn_dashboard("http://127.0.0.1:9".to_string()).await;
    let html = client()
        .get(&base)
        .send()
        .await
        .expect("request")
        .text()
        .await
        .expect("html");
    for choice in [
        "Male",
        "Female",
        "Month-to-month",
        "One year",
        "Two year",
        "Electronic check",
        "Mailed check",
        "Credit card (automatic)",
        "Bank transfer (automatic)",
    ] {
        assert!(html.contains(&format!("value=\"{choice}\"")), "missing {choice}");
    }
}

#[tokio::test]
async fn test_successful_prediction_renders_metrics() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"churn_probability": 0.812, "prediction": 1})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let base = spawn_dashboard(server.uri()).await;
    let (status, html) = submit(&base, &form_fields()).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("81.2%"));
    assert!(html.contains(">Churn<"));
    assert!(html.contains("High Risk"));
    assert!(html.contains("retention incentives"));
}

#[tokio::test]
async fn test_low_risk_prediction() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"churn_probability": 0.123, "prediction": 0})),
        )
        .mount(&server)
        .await;

    let base = spawn_dashboard(server.uri()).await;
    let (_, html) = submit(&base, &form_fields()).await;

    assert!(html.contains("12.3%"));
    assert!(html.contains("No Churn"));
    assert!(html.contains("Low Risk"));
    assert!(html.contains("engagement strategy"));
}

#[tokio::test]
async fn test_payload_carries_fixed_service_flags() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(body_partial_json(json!({
            "Gender": "Female",
            "Tenure_Months": 3,
            "Phone_Service": "Yes",
            "Internet_Service": "Fiber optic",
            "Paperless_Billing": "Yes",
            "Streaming_TV": "No"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"churn_probability": 0.5, "prediction": 0})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let base = spawn_dashboard(server.uri()).await;
    let (status, html) = submit(&base, &form_fields()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Medium Risk"));
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_upstream_error_echoes_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "error": "validation failed",
            "detail": [{"field": "Gender", "message": "field required"}]
        })))
        .mount(&server)
        .await;

    let base = spawn_dashboard(server.uri()).await;
    let (status, html) = submit(&base, &form_fields()).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(html.contains("Prediction failed"));
    assert!(html.contains("field required"));
    assert!(!html.contains("Prediction Results"));
}

#[tokio::test]
async fn test_unparseable_success_body_is_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let base = spawn_dashboard(server.uri()).await;
    let (_, html) = submit(&base, &form_fields()).await;
    assert!(html.contains("Prediction failed"));
    assert!(html.contains("<pre>ok</pre>"));
}

#[tokio::test]
async fn test_invalid_form_never_calls_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let base = spawn_dashboard(server.uri()).await;
    let mut fields = form_fields();
    fields[7] = ("CLTV", "-10");
    let (status, html) = submit(&base, &fields).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(html.contains("must not be negative"));
}

#[tokio::test]
async fn test_unreachable_service_reports_failure() {
    let base = spawn_dashboard("http://127.0.0.1:9".to_string()).await;
    let (status, html) = submit(&base, &form_fields()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(html.contains("Prediction failed"));
}

// ============================================================================
// End to end
// ============================================================================

#[tokio::test]
async fn test_dashboard_against_real_service() {
    let service_port = next_port();
    let config = ServiceConfig {
        host: "127.0.0.1".to_string(),
        port: service_port,
        ..ServiceConfig::default()
    };
    tokio::spawn(async move {
        let _ = service::start_server(config, Arc::new(ConstantClassifier::new(0.42))).await;
    });

    let base = spawn_dashboard(format!("http://127.0.0.1:{service_port}")).await;
    let (status, html) = submit(&base, &form_fields()).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("42.0%"));
    assert!(html.contains("Medium Risk"));
}

#[test]
fn test_default_form_payload_is_complete() {
    let payload: Value = build_payload(&DashboardForm::default());
    assert_eq!(payload.as_object().map(|m| m.len()), Some(22));
}
