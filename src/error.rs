use thiserror::Error;

/// Errors surfaced by the ingress and summary paths.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("invalid date range: {0}")]
    InvalidDateFormat(String),

    #[error("could not enqueue payment: {0}")]
    EnqueueFailed(#[from] QueueError),

    #[error("summary store unavailable: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue backend error: {0}")]
    Backend(String),

    #[error("could not encode payment record: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("summary store backend error: {0}")]
    Backend(String),
}

/// Outcome classification for a single delivery attempt against a
/// payment processor.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("processor request failed: {0}")]
    Transport(String),

    #[error("processor request timed out")]
    Timeout,

    #[error("processor rejected payment with status {0}")]
    HttpError(u16),

    #[error("circuit breaker is open")]
    BreakerOpen,

    #[error("could not encode processor payload: {0}")]
    Encode(#[from] serde_json::Error),
}
