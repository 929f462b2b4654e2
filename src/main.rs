use std::sync::Arc;

use anyhow::Context;
use bb8::Pool;
use bb8_redis::RedisConnectionManager;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use payment_gateway::config::Config;
use payment_gateway::controller;
use payment_gateway::payment_processors::client::HttpProcessorClient;
use payment_gateway::queue::RedisQueue;
use payment_gateway::service::PaymentService;
use payment_gateway::store::RedisSummaryStore;
use payment_gateway::structs::AppState;
use payment_gateway::worker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    let manager =
        RedisConnectionManager::new(config.redis_url()).context("invalid redis url")?;
    // Each worker parks a connection in BRPOP, so the pool must cover
    // every worker plus the ingress path.
    let pool = Pool::builder()
        .max_size((config.worker_count + 4) as u32)
        .build(manager)
        .await
        .context("could not connect to redis")?;
    info!(url = %config.redis_url(), "connected to redis");

    let queue = Arc::new(RedisQueue::new(pool.clone()));
    let store = Arc::new(RedisSummaryStore::new(pool));
    let gateway = Arc::new(HttpProcessorClient::new(
        config.payment_url_default.clone(),
        config.payment_url_fallback.clone(),
        config.worker_count,
    )?);

    worker::spawn_workers(
        config.worker_count,
        queue.clone(),
        store.clone(),
        gateway,
    );

    let service = Arc::new(PaymentService::new(queue, store, config.summary_decimals));
    let app = controller::router(AppState { service });

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("could not bind {addr}"))?;
    info!(%addr, workers = config.worker_count, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received, draining");
}
