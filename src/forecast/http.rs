use crate::config::LedgerConfig;

use super::{error_message, ForecastError, ForecastRequest, ForecastResponse, HealthStatus};

/// Async client for the forecast service (`POST /predict`, `GET /health`).
#[derive(Clone, Debug)]
pub struct HttpForecastClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpForecastClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.backend_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the service for a forecast. Empty history is rejected locally.
    pub async fn predict(
        &self,
        request: &ForecastRequest,
    ) -> Result<ForecastResponse, ForecastError> {
        request.validate()?;
        tracing::debug!(
            predict_date = %request.predict_date,
            rows = request.history.len(),
            "requesting forecast"
        );

        let response = self
            .client
            .post(format!("{}/predict", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| ForecastError::Transport(e.to_string()))?;
        decode(response).await
    }

    pub async fn health(&self) -> Result<HealthStatus, ForecastError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| ForecastError::Transport(e.to_string()))?;
        decode(response).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ForecastError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = error_message(status.as_u16(), &body);
        tracing::warn!(status = status.as_u16(), %message, "forecast service error");
        return Err(ForecastError::Request {
            status: status.as_u16(),
            message,
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ForecastError::Decode(e.to_string()))
}
