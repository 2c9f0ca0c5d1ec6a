//! Forecast service boundary: wire types and the mapping of a forecast onto
//! ledger input.
//!
//! The ledger never talks to the service. A caller sends a
//! [`ForecastRequest`], awaits the [`ForecastResponse`] and hands
//! [`ForecastResponse::to_prediction`] to `PredictionLedger::upsert`. A
//! failed request produces no ledger input at all.

#[cfg(feature = "http")]
mod http;

use std::fmt;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::catalog::{Product, SalesEntry};
use crate::error::LedgerError;
use crate::prediction::{clamp_score, round2, NewPrediction};

#[cfg(feature = "http")]
pub use http::HttpForecastClient;

/// Product attributes the model was trained on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttributes {
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Subcategory")]
    pub subcategory: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Region")]
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub product: ProductAttributes,
    pub history: Vec<SalesEntry>,
    pub predict_date: NaiveDate,
}

impl ForecastRequest {
    /// Request for `product`. History rows without a date are left out.
    pub fn for_product(product: &Product, predict_date: NaiveDate) -> Self {
        Self {
            product: ProductAttributes {
                category: product.category.clone(),
                subcategory: product.subcategory.clone(),
                city: product.city.clone(),
                region: product.region.clone(),
            },
            history: product
                .history
                .iter()
                .filter(|entry| entry.order_date.is_some())
                .cloned()
                .collect(),
            predict_date,
        }
    }

    /// The service needs at least one history row to predict from.
    pub fn validate(&self) -> Result<(), ForecastError> {
        if self.history.is_empty() {
            return Err(ForecastError::EmptyHistory);
        }
        Ok(())
    }
}

/// Back-test metric reported alongside a forecast.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalAccuracy {
    #[serde(default)]
    pub metric: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub accuracy: Option<f64>,
}

impl HistoricalAccuracy {
    /// Accuracy percentage to show next to a forecast.
    ///
    /// An explicit `accuracy` wins; a SMAPE or MAPE error value is turned
    /// into `100 - value`, rounded and clamped at 0.
    pub fn display_accuracy(&self) -> Option<f64> {
        if let Some(accuracy) = self.accuracy {
            return Some(accuracy);
        }
        let metric = self.metric.as_deref()?.to_ascii_uppercase();
        if metric != "SMAPE" && metric != "MAPE" {
            return None;
        }
        self.value.map(|value| clamp_score(round2(100.0 - value)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub prediction: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    #[serde(default)]
    pub prediction_date: Option<NaiveDate>,
    #[serde(default)]
    pub historical_accuracy: Option<HistoricalAccuracy>,
    #[serde(default)]
    pub model_version: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ForecastResponse {
    /// Ledger input for this forecast. The date is the one the service
    /// answered for, or `requested_date` when it sent none.
    pub fn to_prediction(
        &self,
        product_name: impl Into<String>,
        requested_date: NaiveDate,
    ) -> Result<NewPrediction, LedgerError> {
        NewPrediction::new(
            product_name,
            self.prediction_date.unwrap_or(requested_date),
            self.prediction,
        )
    }
}

/// Answer from the service's health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub model_version: Option<String>,
}

/// Default forecast target: one month after `today`, clamped to month end.
pub fn default_target_date(today: NaiveDate) -> NaiveDate {
    today.checked_add_months(Months::new(1)).unwrap_or(today)
}

/// Error type for forecast requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForecastError {
    /// Nothing to predict from.
    EmptyHistory,
    /// The service answered with a non-success status.
    Request { status: u16, message: String },
    /// The request never got an answer.
    Transport(String),
    /// The answer could not be decoded.
    Decode(String),
}

impl fmt::Display for ForecastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastError::EmptyHistory => {
                write!(f, "add at least one history row to the product")
            }
            ForecastError::Request { message, .. } => write!(f, "prediction failed: {}", message),
            ForecastError::Transport(msg) => write!(f, "forecast service unreachable: {}", msg),
            ForecastError::Decode(msg) => write!(f, "unexpected forecast response: {}", msg),
        }
    }
}

impl std::error::Error for ForecastError {}

/// Message for a failed response: the server's `detail`, else the body
/// text, else the status.
pub fn error_message(status: u16, body: &str) -> String {
    let body = body.trim();
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        match map.get("detail") {
            Some(serde_json::Value::String(detail)) => return detail.clone(),
            Some(serde_json::Value::Null) | None => {}
            Some(detail) => return detail.to_string(),
        }
    }
    if body.is_empty() {
        format!("HTTP {}", status)
    } else {
        body.to_string()
    }
}
