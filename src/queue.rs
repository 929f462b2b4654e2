use std::collections::VecDeque;

use async_trait::async_trait;
use bb8::Pool;
use bb8_redis::RedisConnectionManager;
use redis::AsyncCommands;
use tokio::sync::{Mutex, Notify};

use crate::error::QueueError;
use crate::structs::Payment;

pub type RedisPool = Pool<RedisConnectionManager>;

/// Durable FIFO of serialized payment records. At-least-once delivery is
/// acceptable; settlement keeps the pipeline effectively-once.
#[async_trait]
pub trait PaymentQueue: Send + Sync {
    /// Non-blocking enqueue.
    async fn push(&self, payment: &Payment) -> Result<(), QueueError>;

    /// Oldest record, blocking indefinitely until one is available. Returns
    /// the raw record so the consumer decides what to do with entries that
    /// fail to decode.
    async fn pop_blocking(&self) -> Result<String, QueueError>;

    /// Put a payment back for another worker to retry. Pushes on the same
    /// side as the producer, so FIFO fairness across workers is preserved.
    async fn requeue(&self, payment: &Payment) -> Result<(), QueueError>;
}

#[derive(Clone)]
pub struct RedisQueue {
    pool: RedisPool,
    queue_name: String,
}

impl RedisQueue {
    pub fn new(pool: RedisPool) -> Self {
        let queue_name =
            std::env::var("REDIS_QUEUE_NAME").unwrap_or_else(|_| "payments_queue".to_string());

        Self { pool, queue_name }
    }

    async fn conn(
        &self,
    ) -> Result<bb8::PooledConnection<'_, RedisConnectionManager>, QueueError> {
        self.pool
            .get()
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))
    }
}

#[async_trait]
impl PaymentQueue for RedisQueue {
    async fn push(&self, payment: &Payment) -> Result<(), QueueError> {
        let record = serde_json::to_string(payment)?;
        let mut conn = self.conn().await?;
        let _: () = AsyncCommands::lpush(&mut *conn, &self.queue_name, record)
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn pop_blocking(&self) -> Result<String, QueueError> {
        let mut conn = self.conn().await?;
        let (_, record): (String, String) =
            AsyncCommands::brpop(&mut *conn, &self.queue_name, 0.0)
                .await
                .map_err(|e| QueueError::Backend(e.to_string()))?;
        Ok(record)
    }

    async fn requeue(&self, payment: &Payment) -> Result<(), QueueError> {
        self.push(payment).await
    }
}

/// Channel-backed queue with the same contract as the Redis list. Used by
/// the test suites and when running without a Redis alongside.
#[derive(Default)]
pub struct MemoryQueue {
    records: Mutex<VecDeque<String>>,
    notify: Notify,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a raw record, bypassing serialization. Lets tests inject
    /// entries a worker cannot decode.
    pub async fn push_raw(&self, record: String) {
        self.records.lock().await.push_back(record);
        self.notify.notify_one();
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PaymentQueue for MemoryQueue {
    async fn push(&self, payment: &Payment) -> Result<(), QueueError> {
        let record = serde_json::to_string(payment)?;
        self.push_raw(record).await;
        Ok(())
    }

    async fn pop_blocking(&self) -> Result<String, QueueError> {
        loop {
            if let Some(record) = self.records.lock().await.pop_front() {
                return Ok(record);
            }
            self.notify.notified().await;
        }
    }

    async fn requeue(&self, payment: &Payment) -> Result<(), QueueError> {
        self.push(payment).await
    }
}
