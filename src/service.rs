use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error};

use crate::error::GatewayError;
use crate::payment_processors::structs::ProcessorId;
use crate::queue::PaymentQueue;
use crate::store::SummaryStore;
use crate::structs::{Payment, PaymentRequest, ServiceSummary, SummaryResponse};

/// Ingress side of the gateway: validates and enqueues payment intents, and
/// answers the summary query from the counter store.
pub struct PaymentService {
    queue: Arc<dyn PaymentQueue>,
    store: Arc<dyn SummaryStore>,
    summary_decimals: u32,
}

impl PaymentService {
    pub fn new(
        queue: Arc<dyn PaymentQueue>,
        store: Arc<dyn SummaryStore>,
        summary_decimals: u32,
    ) -> Self {
        Self {
            queue,
            store,
            summary_decimals,
        }
    }

    /// Stamp `requestedAt` and enqueue. Returns as soon as the record is
    /// durably queued; delivery happens in the worker pool.
    pub async fn create_payment(&self, request: PaymentRequest) -> Result<(), GatewayError> {
        if request.amount <= 0.0 {
            return Err(GatewayError::InvalidAmount);
        }

        let payment = Payment::from(request);
        if let Err(err) = self.queue.push(&payment).await {
            error!(
                correlation_id = %payment.correlation_id,
                error = %err,
                "failed to enqueue payment"
            );
            return Err(GatewayError::EnqueueFailed(err));
        }

        debug!(correlation_id = %payment.correlation_id, "payment enqueued");
        Ok(())
    }

    /// Per-processor totals over the inclusive day-bucket range of
    /// `[from, to]`. Reads are lock-free and eventually consistent with
    /// in-flight workers.
    pub async fn get_summary(
        &self,
        from: &str,
        to: &str,
    ) -> Result<SummaryResponse, GatewayError> {
        let from = parse_rfc3339(from, "from")?;
        let to = parse_rfc3339(to, "to")?;

        Ok(SummaryResponse {
            default: self.summarize(ProcessorId::Default, from, to).await?,
            fallback: self.summarize(ProcessorId::Fallback, from, to).await?,
        })
    }

    async fn summarize(
        &self,
        processor: ProcessorId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<ServiceSummary, GatewayError> {
        let mut total_requests = 0u64;
        let mut total_amount = 0f64;

        let mut day = from.date_naive();
        let last = to.date_naive();
        while day <= last {
            let (requests, amount) = self.store.read(processor, day).await?;
            total_requests += requests;
            total_amount += amount;
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        Ok(ServiceSummary {
            total_requests,
            total_amount: round_amount(total_amount, self.summary_decimals),
        })
    }

    pub async fn purge(&self) -> Result<(), GatewayError> {
        self.store.purge().await?;
        Ok(())
    }
}

fn parse_rfc3339(value: &str, field: &str) -> Result<DateTime<Utc>, GatewayError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| GatewayError::InvalidDateFormat(format!("invalid '{}': {}", field, err)))
}

fn round_amount(amount: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (amount * factor).round() / factor
}
