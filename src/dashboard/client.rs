//! HTTP client for the prediction service.

use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::form::FormError;
use crate::prediction::Prediction;

/// Failures surfaced by the dashboard.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// The service answered with a non-success status, or a 2xx body that is
    /// not a prediction.
    #[error("prediction service returned {status}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Raw response body, shown verbatim to the user.
        body: String,
    },

    /// The service could not be reached or did not answer in time.
    #[error("prediction service unreachable: {0}")]
    Transport(String),

    /// Submitted form values were rejected before any call was made.
    #[error("invalid form input ({} field(s))", .0.len())]
    Form(Vec<FormError>),
}

/// Calls `POST {api_url}/predict`.
#[derive(Debug, Clone)]
pub struct PredictionClient {
    client: reqwest::Client,
    predict_url: String,
    timeout: Duration,
}

impl PredictionClient {
    /// Create a client for the service rooted at `api_url`.
    pub fn new(api_url: &str, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            predict_url: format!("{}/predict", api_url.trim_end_matches('/')),
            timeout,
        }
    }

    /// Full URL of the predict endpoint.
    pub fn predict_url(&self) -> &str {
        &self.predict_url
    }

    /// Send one payload and decode the prediction.
    ///
    /// # Errors
    ///
    /// - [`DashboardError::Transport`] if the request cannot be sent or read.
    /// - [`DashboardError::Upstream`] on a non-success status or an
    ///   undecodable body.
    pub async fn predict(&self, payload: &Value) -> Result<Prediction, DashboardError> {
        let response = self
            .client
            .post(&self.predict_url)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| DashboardError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DashboardError::Transport(e.to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "prediction request rejected");
            return Err(DashboardError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let prediction: Prediction =
            serde_json::from_str(&body).map_err(|_| DashboardError::Upstream {
                status: status.as_u16(),
                body: body.clone(),
            })?;

        debug!(
            churn_probability = prediction.churn_probability,
            prediction = prediction.prediction,
            "prediction received"
        );
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_url_joins_without_double_slash() {
        let a = PredictionClient::new("http://localhost:8000/", Duration::from_secs(1));
        let b = PredictionClient::new("http://localhost:8000", Duration::from_secs(1));
        assert_eq!(a.predict_url(), "http://localhost:8000/predict");
        assert_eq!(a.predict_url(), b.predict_url());
    }

    #[test]
    fn test_error_display() {
        let upstream = DashboardError::Upstream {
            status: 422,
            body: "{}".into(),
        };
        assert_eq!(upstream.to_string(), "prediction service returned 422");
        let form = DashboardError::Form(vec![]);
        assert!(form.to_string().contains("0 field"));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        // Port 9 (discard) is closed on test hosts.
        let client = PredictionClient::new("http://127.0.0.1:9", Duration::from_secs(2));
        let err = client
            .predict(&serde_json::json!({}))
            .await
            .expect_err("must fail");
        assert!(matches!(err, DashboardError::Transport(_)));
    }
}
