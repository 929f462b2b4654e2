//! Ingress and summary HTTP surface, driven through the router with
//! in-memory backends.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use payment_gateway::controller;
use payment_gateway::payment_processors::structs::ProcessorId;
use payment_gateway::queue::{MemoryQueue, PaymentQueue};
use payment_gateway::service::PaymentService;
use payment_gateway::store::{MemorySummaryStore, SummaryStore};
use payment_gateway::structs::{AppState, Payment};

struct TestApp {
    state: AppState,
    queue: Arc<MemoryQueue>,
    store: Arc<MemorySummaryStore>,
}

fn test_app() -> TestApp {
    let queue = Arc::new(MemoryQueue::new());
    let store = Arc::new(MemorySummaryStore::new());
    let service = Arc::new(PaymentService::new(queue.clone(), store.clone(), 1));
    TestApp {
        state: AppState { service },
        queue,
        store,
    }
}

async fn send_json(state: AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = controller::router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn post_payment_returns_201_and_enqueues() {
    let app = test_app();
    let correlation_id = Uuid::new_v4();

    let (status, _) = send_json(
        app.state,
        "POST",
        "/payments",
        Some(json!({ "correlationId": correlation_id, "amount": 19.9 })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(app.queue.len().await, 1);

    let record = app.queue.pop_blocking().await.unwrap();
    let payment: Payment = serde_json::from_str(&record).unwrap();
    assert_eq!(payment.correlation_id, correlation_id);
    assert_eq!(payment.amount, 19.9);
}

#[tokio::test]
async fn post_payment_rejects_non_positive_amount() {
    let app = test_app();

    let (status, _) = send_json(
        app.state,
        "POST",
        "/payments",
        Some(json!({ "correlationId": Uuid::new_v4(), "amount": -1.0 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.queue.is_empty().await);
}

#[tokio::test]
async fn summary_requires_full_range() {
    let app = test_app();

    let (status, _) = send_json(app.state.clone(), "GET", "/payments-summary", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        app.state,
        "GET",
        "/payments-summary?from=2025-07-14T00:00:00Z",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn summary_rejects_malformed_dates() {
    let app = test_app();

    let (status, _) = send_json(
        app.state,
        "GET",
        "/payments-summary?from=yesterday&to=2025-07-14T00:00:00Z",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn summary_aggregates_across_days() {
    let app = test_app();
    let d1 = NaiveDate::from_ymd_opt(2025, 7, 14).unwrap();
    let d2 = NaiveDate::from_ymd_opt(2025, 7, 15).unwrap();
    app.store
        .increment(ProcessorId::Default, d1, 1, 10.0)
        .await
        .unwrap();
    app.store
        .increment(ProcessorId::Default, d2, 1, 20.0)
        .await
        .unwrap();

    let (status, body) = send_json(
        app.state,
        "GET",
        "/payments-summary?from=2025-07-14T00:00:00Z&to=2025-07-15T23:59:59Z",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["default"]["totalRequests"], 2);
    assert_eq!(body["default"]["totalAmount"], 30.0);
    assert_eq!(body["fallback"]["totalRequests"], 0);
    assert_eq!(body["fallback"]["totalAmount"], 0.0);
}

#[tokio::test]
async fn purge_resets_counters() {
    let app = test_app();
    let d1 = NaiveDate::from_ymd_opt(2025, 7, 14).unwrap();
    app.store
        .increment(ProcessorId::Fallback, d1, 3, 42.0)
        .await
        .unwrap();

    let (status, _) = send_json(app.state.clone(), "POST", "/purge-payments", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(
        app.state,
        "GET",
        "/payments-summary?from=2025-07-14T00:00:00Z&to=2025-07-14T23:59:59Z",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fallback"]["totalRequests"], 0);
}
