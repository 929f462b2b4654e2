use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::service::PaymentService;

/// Body of `POST /payments`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequest {
    #[serde(rename = "correlationId")]
    pub correlation_id: Uuid,
    pub amount: f64,
}

/// The payment record that travels the pipeline: it is the queue entry and
/// the body POSTed to a processor. `requested_at` is stamped at ingress and
/// never mutated downstream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Payment {
    #[serde(rename = "correlationId")]
    pub correlation_id: Uuid,
    pub amount: f64,
    #[serde(rename = "requestedAt")]
    pub requested_at: DateTime<Utc>,
}

impl Payment {
    /// UTC calendar day the payment is aggregated under.
    pub fn day_bucket(&self) -> NaiveDate {
        self.requested_at.date_naive()
    }
}

impl From<PaymentRequest> for Payment {
    fn from(request: PaymentRequest) -> Self {
        Payment {
            correlation_id: request.correlation_id,
            amount: request.amount,
            requested_at: Utc::now(),
        }
    }
}

/// Query string of `GET /payments-summary`.
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryParams {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceSummary {
    #[serde(rename = "totalRequests")]
    pub total_requests: u64,
    #[serde(rename = "totalAmount")]
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryResponse {
    pub default: ServiceSummary,
    pub fallback: ServiceSummary,
}

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PaymentService>,
}
