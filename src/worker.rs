use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::payment_processors::client::ProcessorGateway;
use crate::payment_processors::structs::ProcessorId;
use crate::queue::PaymentQueue;
use crate::store::SummaryStore;
use crate::structs::Payment;

/// Backoff between settlement retries. The payment is already accepted
/// downstream at that point, so the commit must eventually land.
pub const SETTLE_RETRY_DELAY: Duration = Duration::from_secs(3);

const POP_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Start `count` independent workers, each owning its own blocking pop.
pub fn spawn_workers(
    count: usize,
    queue: Arc<dyn PaymentQueue>,
    store: Arc<dyn SummaryStore>,
    gateway: Arc<dyn ProcessorGateway>,
) {
    for id in 1..=count {
        let queue = queue.clone();
        let store = store.clone();
        let gateway = gateway.clone();
        tokio::spawn(async move {
            run_worker(id, queue, store, gateway).await;
        });
    }
    info!(workers = count, "worker pool started");
}

async fn run_worker(
    worker: usize,
    queue: Arc<dyn PaymentQueue>,
    store: Arc<dyn SummaryStore>,
    gateway: Arc<dyn ProcessorGateway>,
) {
    loop {
        let record = match queue.pop_blocking().await {
            Ok(record) => record,
            Err(err) => {
                warn!(worker, error = %err, "queue pop failed, retrying");
                tokio::time::sleep(POP_RETRY_DELAY).await;
                continue;
            }
        };

        handle_record(worker, &record, queue.as_ref(), store.as_ref(), gateway.as_ref()).await;
    }
}

/// Decode one queue record and run it through the dispatch state machine.
/// Records that fail to decode are poison: logged and dropped.
pub async fn handle_record(
    worker: usize,
    record: &str,
    queue: &dyn PaymentQueue,
    store: &dyn SummaryStore,
    gateway: &dyn ProcessorGateway,
) {
    let payment: Payment = match serde_json::from_str(record) {
        Ok(payment) => payment,
        Err(err) => {
            warn!(worker, error = %err, "dropping malformed queue record");
            return;
        }
    };

    dispatch(worker, payment, queue, store, gateway).await;
}

/// Routing state machine: default first, fallback second, re-enqueue when
/// neither accepts. The health-cache TTL is the coarse retry quantum when
/// both processors are down.
pub async fn dispatch(
    worker: usize,
    payment: Payment,
    queue: &dyn PaymentQueue,
    store: &dyn SummaryStore,
    gateway: &dyn ProcessorGateway,
) {
    for processor in ProcessorId::ALL {
        if !gateway.is_healthy(processor).await {
            continue;
        }
        match gateway.send(&payment, processor).await {
            Ok(()) => {
                debug!(
                    worker,
                    correlation_id = %payment.correlation_id,
                    processor = %processor,
                    "payment accepted"
                );
                settle(worker, &payment, processor, store).await;
                return;
            }
            Err(err) => {
                debug!(
                    worker,
                    correlation_id = %payment.correlation_id,
                    processor = %processor,
                    error = %err,
                    "delivery attempt failed"
                );
            }
        }
    }

    if let Err(err) = queue.requeue(&payment).await {
        error!(
            worker,
            correlation_id = %payment.correlation_id,
            error = %err,
            "failed to re-enqueue payment"
        );
    }
}

/// Commit the confirmed payment into the summary counters. Retries forever:
/// the downstream acceptance is already consumed, so dropping the commit
/// would lose the payment.
async fn settle(
    worker: usize,
    payment: &Payment,
    processor: ProcessorId,
    store: &dyn SummaryStore,
) {
    let day = payment.day_bucket();
    loop {
        match store.increment(processor, day, 1, payment.amount).await {
            Ok(()) => {
                info!(
                    worker,
                    correlation_id = %payment.correlation_id,
                    processor = %processor,
                    "payment settled"
                );
                return;
            }
            Err(err) => {
                error!(
                    worker,
                    correlation_id = %payment.correlation_id,
                    processor = %processor,
                    error = %err,
                    "settlement failed, retrying"
                );
                tokio::time::sleep(SETTLE_RETRY_DELAY).await;
            }
        }
    }
}
