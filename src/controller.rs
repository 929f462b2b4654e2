use axum::{
    Json,
    extract::{self, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::error::GatewayError;
use crate::structs::{AppState, PaymentRequest, SummaryParams};

pub fn router(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/payments", axum::routing::post(payments))
        .route("/payments-summary", axum::routing::get(payments_summary))
        .route("/purge-payments", axum::routing::post(purge_payments))
        .with_state(state)
}

pub async fn payments(
    State(state): State<AppState>,
    extract::Json(payload): extract::Json<PaymentRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .service
        .create_payment(payload)
        .await
        .map_err(error_response)?;

    Ok(StatusCode::CREATED)
}

pub async fn payments_summary(
    State(state): State<AppState>,
    extract::Query(params): extract::Query<SummaryParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let from = params.from.as_deref().ok_or_else(|| missing_param("from"))?;
    let to = params.to.as_deref().ok_or_else(|| missing_param("to"))?;

    let summary = state
        .service
        .get_summary(from, to)
        .await
        .map_err(error_response)?;

    Ok((StatusCode::OK, Json(summary)))
}

pub async fn purge_payments(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state.service.purge().await.map_err(error_response)?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "summary counters purged" })),
    ))
}

fn error_response(err: GatewayError) -> (StatusCode, String) {
    let status = match &err {
        GatewayError::InvalidAmount | GatewayError::InvalidDateFormat(_) => {
            StatusCode::BAD_REQUEST
        }
        GatewayError::EnqueueFailed(_) | GatewayError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

fn missing_param(name: &str) -> (StatusCode, String) {
    (
        StatusCode::BAD_REQUEST,
        format!("missing '{}' query parameter", name),
    )
}
