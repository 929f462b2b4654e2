use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::SendError;
use crate::structs::Payment;

use super::breaker::Breaker;
use super::structs::{HealthCheckResponse, HealthEntry, ProcessorId};

/// Cached health verdicts are reused for this long; at most one probe per
/// processor is issued per window.
pub const HEALTH_TTL: Duration = Duration::from_secs(5);

/// Deadline for each outbound request, payments and probes alike.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Delivery interface to the downstream processors. The HTTP client below
/// is the production implementation; tests substitute stubs.
#[async_trait]
pub trait ProcessorGateway: Send + Sync {
    /// Deliver one payment to one processor. Any status below 300 counts
    /// as accepted.
    async fn send(&self, payment: &Payment, processor: ProcessorId) -> Result<(), SendError>;

    /// Cached health verdict for a processor, probing when the cache is
    /// older than `HEALTH_TTL`.
    async fn is_healthy(&self, processor: ProcessorId) -> bool;
}

struct ProcessorState {
    base_url: String,
    health: Mutex<HealthEntry>,
    breaker: Mutex<Breaker>,
}

impl ProcessorState {
    fn new(processor: ProcessorId, base_url: String) -> Self {
        ProcessorState {
            base_url,
            health: Mutex::new(HealthEntry::new()),
            breaker: Mutex::new(Breaker::new(processor)),
        }
    }
}

pub struct HttpProcessorClient {
    http: reqwest::Client,
    default_state: ProcessorState,
    fallback_state: ProcessorState,
}

impl HttpProcessorClient {
    pub fn new(
        default_url: String,
        fallback_url: String,
        worker_count: usize,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .pool_max_idle_per_host(2 * worker_count)
            .build()?;

        Ok(HttpProcessorClient {
            http,
            default_state: ProcessorState::new(ProcessorId::Default, default_url),
            fallback_state: ProcessorState::new(ProcessorId::Fallback, fallback_url),
        })
    }

    fn state(&self, processor: ProcessorId) -> &ProcessorState {
        match processor {
            ProcessorId::Default => &self.default_state,
            ProcessorId::Fallback => &self.fallback_state,
        }
    }

    async fn post_payment(&self, base_url: &str, body: Vec<u8>) -> Result<(), SendError> {
        let response = self
            .http
            .post(format!("{}/payments", base_url))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await;

        match response {
            Ok(resp) => {
                let status = resp.status().as_u16();
                if status < 300 {
                    Ok(())
                } else {
                    Err(SendError::HttpError(status))
                }
            }
            Err(err) if err.is_timeout() => Err(SendError::Timeout),
            Err(err) => Err(SendError::Transport(err.to_string())),
        }
    }

    async fn probe(&self, processor: ProcessorId, base_url: &str) -> bool {
        let response = self
            .http
            .get(format!("{}/payments/service-health", base_url))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                match resp.json::<HealthCheckResponse>().await {
                    Ok(health) => {
                        debug!(
                            processor = %processor,
                            failing = health.failing,
                            min_response_time = health.min_response_time,
                            "health probe"
                        );
                        !health.failing
                    }
                    Err(err) => {
                        warn!(processor = %processor, error = %err, "unreadable health probe body");
                        false
                    }
                }
            }
            Ok(resp) => {
                debug!(processor = %processor, status = %resp.status(), "health probe rejected");
                false
            }
            Err(err) => {
                debug!(processor = %processor, error = %err, "health probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl ProcessorGateway for HttpProcessorClient {
    async fn send(&self, payment: &Payment, processor: ProcessorId) -> Result<(), SendError> {
        let body = serde_json::to_vec(payment)?;
        let state = self.state(processor);

        if !state.breaker.lock().await.try_acquire(Instant::now()) {
            return Err(SendError::BreakerOpen);
        }

        let result = self.post_payment(&state.base_url, body).await;

        let mut breaker = state.breaker.lock().await;
        match &result {
            Ok(()) => breaker.on_success(),
            Err(_) => breaker.on_failure(Instant::now()),
        }
        result
    }

    async fn is_healthy(&self, processor: ProcessorId) -> bool {
        let state = self.state(processor);
        let mut entry = state.health.lock().await;

        if entry.is_fresh(HEALTH_TTL, Instant::now()) {
            return entry.healthy;
        }

        // Stamp before probing so concurrent callers inside the window get
        // the cached verdict instead of piling probes onto the processor.
        entry.last_checked_at = Some(Instant::now());
        entry.healthy = self.probe(processor, &state.base_url).await;
        entry.healthy
    }
}
