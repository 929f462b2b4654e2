use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use redis::AsyncCommands;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::payment_processors::structs::ProcessorId;
use crate::queue::RedisPool;

/// Per-`(processor, day)` accounting counters. Increments happen once per
/// settled payment; reads come from the summary query path and take no
/// locks against writers.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// Atomically add `(requests, amount)` to the counter for the given
    /// processor and UTC day bucket. Both fields move together.
    async fn increment(
        &self,
        processor: ProcessorId,
        day: NaiveDate,
        requests: u64,
        amount: f64,
    ) -> Result<(), StoreError>;

    /// Current counter values, zeros when the bucket does not exist.
    async fn read(&self, processor: ProcessorId, day: NaiveDate)
        -> Result<(u64, f64), StoreError>;

    /// Drop every counter. Exposed so the load-test harness can reset
    /// state between runs.
    async fn purge(&self) -> Result<(), StoreError>;
}

fn counter_key(processor: ProcessorId, day: NaiveDate) -> String {
    format!("summary:{}:{}", processor.as_str(), day.format("%Y-%m-%d"))
}

#[derive(Clone)]
pub struct RedisSummaryStore {
    pool: RedisPool,
}

impl RedisSummaryStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    async fn conn(
        &self,
    ) -> Result<bb8::PooledConnection<'_, bb8_redis::RedisConnectionManager>, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}

#[async_trait]
impl SummaryStore for RedisSummaryStore {
    async fn increment(
        &self,
        processor: ProcessorId,
        day: NaiveDate,
        requests: u64,
        amount: f64,
    ) -> Result<(), StoreError> {
        let key = counter_key(processor, day);
        let mut conn = self.conn().await?;

        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("HINCRBY")
            .arg(&key)
            .arg("total_requests")
            .arg(requests)
            .ignore()
            .cmd("HINCRBYFLOAT")
            .arg(&key)
            .arg("total_amount")
            .arg(amount)
            .ignore();

        let _: () = pipe
            .query_async(&mut *conn)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn read(
        &self,
        processor: ProcessorId,
        day: NaiveDate,
    ) -> Result<(u64, f64), StoreError> {
        let key = counter_key(processor, day);
        let mut conn = self.conn().await?;

        let fields: HashMap<String, String> = AsyncCommands::hgetall(&mut *conn, &key)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let requests = fields
            .get("total_requests")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let amount = fields
            .get("total_amount")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0);
        Ok((requests, amount))
    }

    async fn purge(&self) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;

        let keys: Vec<String> = AsyncCommands::keys(&mut *conn, "summary:*")
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        if !keys.is_empty() {
            let _: () = AsyncCommands::del(&mut *conn, keys)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        Ok(())
    }
}

/// In-process counters with the same contract as the Redis store.
#[derive(Default)]
pub struct MemorySummaryStore {
    counters: Mutex<HashMap<(ProcessorId, NaiveDate), (u64, f64)>>,
}

impl MemorySummaryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SummaryStore for MemorySummaryStore {
    async fn increment(
        &self,
        processor: ProcessorId,
        day: NaiveDate,
        requests: u64,
        amount: f64,
    ) -> Result<(), StoreError> {
        let mut counters = self.counters.lock().await;
        let entry = counters.entry((processor, day)).or_insert((0, 0.0));
        entry.0 += requests;
        entry.1 += amount;
        Ok(())
    }

    async fn read(
        &self,
        processor: ProcessorId,
        day: NaiveDate,
    ) -> Result<(u64, f64), StoreError> {
        let counters = self.counters.lock().await;
        Ok(counters
            .get(&(processor, day))
            .copied()
            .unwrap_or((0, 0.0)))
    }

    async fn purge(&self) -> Result<(), StoreError> {
        self.counters.lock().await.clear();
        Ok(())
    }
}
