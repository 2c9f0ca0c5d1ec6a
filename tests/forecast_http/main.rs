//! Forecast client tests against a stub forecast service.
//!
//! Starts an axum server and exercises it with the real client.

#![cfg(feature = "http")]

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use bikri_ledger::{
    ForecastError, ForecastRequest, HttpForecastClient, InMemoryKeyValueStore, LedgerConfig,
    PredictionLedger, ProductDraft,
};
use chrono::NaiveDate;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

async fn predict(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["product"]["Category"].as_str().unwrap_or_default().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Category is required" })),
        );
    }
    let history = body["history"].as_array().cloned().unwrap_or_default();
    if history.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "detail": "history must contain at least one row with Orderdate and Sales."
            })),
        );
    }
    let mean = history
        .iter()
        .filter_map(|row| row["Sales"].as_f64())
        .sum::<f64>()
        / history.len() as f64;
    (
        StatusCode::OK,
        Json(json!({
            "model_version": "v1.0",
            "prediction": mean,
            "lower_bound": mean * 0.85,
            "upper_bound": mean * 1.15,
            "prediction_date": body["predict_date"],
            "historical_accuracy": { "metric": "SMAPE", "value": 10.0 },
            "notes": "stub"
        })),
    )
}

/// Bind to port 0 and return the actual address.
async fn start_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn stub_service() -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route(
            "/health",
            get(|| async { Json(json!({ "status": "ok", "model_version": "v1.0" })) }),
        )
}

fn rice_request() -> ForecastRequest {
    let product = ProductDraft::new("Rice")
        .category("Grocery")
        .subcategory("Grains")
        .history_row("2024-02-01", "1000")
        .history_row("2024-03-01", "1200")
        .into_product(None)
        .unwrap();
    ForecastRequest::for_product(&product, date("2024-05-01"))
}

#[tokio::test]
async fn health_check() {
    let base = start_server(stub_service()).await;
    let client = HttpForecastClient::new(format!("{base}/"));
    assert_eq!(client.base_url(), base.as_str());

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.model_version.as_deref(), Some("v1.0"));
}

#[tokio::test]
async fn predict_then_upsert() {
    let base = start_server(stub_service()).await;
    let config = LedgerConfig {
        backend_url: base,
        ..LedgerConfig::default()
    };
    let client = HttpForecastClient::from_config(&config);
    let ledger = PredictionLedger::new(InMemoryKeyValueStore::new());

    let request = rice_request();
    let response = client.predict(&request).await.unwrap();
    assert_eq!(response.prediction, 1100.0);
    assert_eq!(response.prediction_date, Some(date("2024-05-01")));
    assert_eq!(
        response
            .historical_accuracy
            .as_ref()
            .and_then(|h| h.display_accuracy()),
        Some(90.0)
    );

    let list = ledger.upsert(response.to_prediction("Rice", request.predict_date).unwrap());
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].predicted, 1100.0);
}

#[tokio::test]
async fn empty_history_never_leaves_the_client() {
    let client = HttpForecastClient::new("http://127.0.0.1:9");

    let mut request = rice_request();
    request.history.clear();
    let err = client.predict(&request).await.unwrap_err();
    assert_eq!(err, ForecastError::EmptyHistory);
}

#[tokio::test]
async fn server_detail_becomes_error_message() {
    let base = start_server(stub_service()).await;
    let client = HttpForecastClient::new(base);

    let mut request = rice_request();
    request.product.category.clear();
    let err = client.predict(&request).await.unwrap_err();
    assert_eq!(
        err,
        ForecastError::Request {
            status: 400,
            message: "Category is required".into()
        }
    );
    assert_eq!(err.to_string(), "prediction failed: Category is required");
}

#[tokio::test]
async fn status_without_body_becomes_http_message() {
    let app = Router::new().route(
        "/predict",
        post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    );
    let base = start_server(app).await;
    let client = HttpForecastClient::new(base);

    let err = client.predict(&rice_request()).await.unwrap_err();
    assert_eq!(
        err,
        ForecastError::Request {
            status: 503,
            message: "HTTP 503".into()
        }
    );
}

#[tokio::test]
async fn structured_detail_is_rendered() {
    let app = Router::new().route(
        "/predict",
        post(|| async {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "detail": [{ "loc": ["body", "predict_date"], "msg": "field required" }]
                })),
            )
        }),
    );
    let base = start_server(app).await;
    let client = HttpForecastClient::new(base);

    match client.predict(&rice_request()).await.unwrap_err() {
        ForecastError::Request { status, message } => {
            assert_eq!(status, 422);
            assert!(message.contains("field required"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unreachable_service_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpForecastClient::new(format!("http://{addr}"));
    let err = client.predict(&rice_request()).await.unwrap_err();
    assert!(matches!(err, ForecastError::Transport(_)));
}

#[tokio::test]
async fn garbage_success_body_is_decode_error() {
    let app = Router::new().route("/predict", post(|| async { "ok" }));
    let base = start_server(app).await;
    let client = HttpForecastClient::new(base);

    let err = client.predict(&rice_request()).await.unwrap_err();
    assert!(matches!(err, ForecastError::Decode(_)));
}
