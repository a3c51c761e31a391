//! Startup orchestration.
//!
//! # Responsibilities
//! - Pick and initialize the rate limit store
//! - Start the memory store sweeper
//! - Build the upstream model client
//! - Assemble the HTTP server
//!
//! # Design Decisions
//! - Fail fast: a Redis store that cannot connect is fatal
//! - Missing secrets are logged loudly but not fatal; affected requests fail closed

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{GatewayConfig, StoreBackend};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::security::rate_limit::redis::RedisStoreConfig;
use crate::security::rate_limit::{MemoryStore, RateLimitError, RateLimitStore, RedisStore};
use crate::upstream::{ModelClient, OpenRouterClient, UpstreamError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("rate limit store: {0}")]
    Store(#[from] RateLimitError),

    #[error("rate limit backend is redis but no redis_url is set")]
    RedisUrlMissing,

    #[error("upstream client: {0}")]
    Upstream(#[from] UpstreamError),
}

/// Build the configured rate limit store.
pub async fn build_store(
    config: &GatewayConfig,
    shutdown: &Shutdown,
) -> Result<Arc<dyn RateLimitStore>, StartupError> {
    match config.rate_limit.backend {
        StoreBackend::Memory => {
            tracing::warn!(
                "Using in-memory rate limit store: counters are per process and reset on restart"
            );
            let store = Arc::new(MemoryStore::new());
            let interval = Duration::from_secs(config.rate_limit.sweep_interval_secs);
            store.clone().spawn_sweeper(interval, shutdown.subscribe());
            Ok(store)
        }
        StoreBackend::Redis => {
            let url = config
                .rate_limit
                .redis_url
                .as_deref()
                .ok_or(StartupError::RedisUrlMissing)?;
            let store = RedisStore::connect(
                url,
                RedisStoreConfig {
                    key_prefix: config.rate_limit.key_prefix.clone(),
                    timeout: Duration::from_millis(config.timeouts.store_ms),
                },
            )
            .await?;
            Ok(Arc::new(store))
        }
    }
}

/// Build the upstream model client.
pub fn build_model_client(config: &GatewayConfig) -> Result<Arc<dyn ModelClient>, StartupError> {
    if config.upstream.api_key.is_none() {
        tracing::error!("Upstream API key is not configured; model calls will fail");
    }
    let client = OpenRouterClient::new(
        &config.upstream,
        &config.admission.app_url,
        Duration::from_secs(config.timeouts.upstream_secs),
    )?;
    Ok(Arc::new(client))
}

/// Initialize every subsystem and return a server ready to run.
pub async fn build_server(config: GatewayConfig, shutdown: &Shutdown) -> Result<HttpServer, StartupError> {
    if config.admission.shared_secret.is_none() {
        tracing::error!("Shared secret is not configured; every API request will be rejected");
    }

    let store = build_store(&config, shutdown).await?;
    let model = build_model_client(&config)?;

    tracing::info!(
        backend = store.backend(),
        brief_limit = config.rate_limit.brief.limit,
        followup_limit = config.rate_limit.followup.limit,
        model = %config.upstream.model,
        "Subsystems initialized"
    );

    Ok(HttpServer::new(config, store, model))
}
