//! Per-client fixed-window rate limiting.
//!
//! # Data Flow
//! ```text
//! Admitted request:
//!     → identity.rs (hash client address)
//!     → RateLimitStore::allow (namespace, identity, quota)
//!         memory.rs: DashMap entry, atomic per key
//!         redis.rs:  Lua script, atomic across instances
//!     → Allowed: annotate response with X-RateLimit-* headers
//!     → Denied:  429 with Retry-After
//!     → Store error: 503, never treated as allowed
//! ```

pub mod memory;
pub mod redis;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::QuotaConfig;
use crate::http::error::ApiError;
use crate::observability::metrics;
use crate::security::identity::ClientIdentity;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Quota namespace for brief generation.
pub const NAMESPACE_BRIEF: &str = "brief";
/// Quota namespace for follow-up questions.
pub const NAMESPACE_FOLLOWUP: &str = "followup";

pub const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const X_RATELIMIT_RESET: &str = "x-ratelimit-reset";

/// `limit` requests per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub limit: u32,
    pub window: Duration,
}

impl Quota {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }
}

impl From<QuotaConfig> for Quota {
    fn from(config: QuotaConfig) -> Self {
        Self::new(config.limit, config.window())
    }
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32, reset_after: Duration },
    Denied { reset_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Time until the current window ends.
    pub fn reset_after(&self) -> Duration {
        match self {
            Self::Allowed { reset_after, .. } | Self::Denied { reset_after } => *reset_after,
        }
    }
}

/// Store failures. The limiter fails closed on every one of these.
#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("rate limit store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("rate limit store timed out after {0:?}")]
    StoreTimeout(Duration),
}

/// Keyed record store behind the fixed-window algorithm.
///
/// `allow` is the only way records are created or mutated. Implementations
/// must make the read-modify-write atomic per `(namespace, identity)`.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn allow(
        &self,
        namespace: &str,
        identity: &ClientIdentity,
        quota: Quota,
    ) -> Result<RateDecision, RateLimitError>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

/// State for one rate-limited route group.
#[derive(Clone)]
pub struct RateLimiterState {
    pub store: Arc<dyn RateLimitStore>,
    pub namespace: &'static str,
    pub quota: Quota,
}

impl RateLimiterState {
    pub fn new(store: Arc<dyn RateLimitStore>, namespace: &'static str, quota: Quota) -> Self {
        Self {
            store,
            namespace,
            quota,
        }
    }
}

/// Middleware enforcing a namespace quota per client identity.
pub async fn rate_limit_middleware(
    State(state): State<RateLimiterState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let identity = ClientIdentity::resolve(request.headers(), peer);

    let decision = match state.store.allow(state.namespace, &identity, state.quota).await {
        Ok(d) => d,
        Err(e) => {
            tracing::error!(
                namespace = state.namespace,
                backend = state.store.backend(),
                error = %e,
                "Rate limit store failure, rejecting request"
            );
            return ApiError::RateLimitStore(e).into_response();
        }
    };

    match decision {
        RateDecision::Allowed { remaining, reset_after } => {
            tracing::debug!(client = %identity, namespace = state.namespace, remaining, "Rate limit ok");
            request.extensions_mut().insert(decision);
            let mut response = next.run(request).await;
            set_limit_headers(response.headers_mut(), state.quota.limit, remaining, reset_after);
            response
        }
        RateDecision::Denied { reset_after } => {
            tracing::warn!(
                client = %identity,
                namespace = state.namespace,
                reset_after_secs = reset_after.as_secs(),
                "Rate limit exceeded"
            );
            metrics::record_rate_limited(state.namespace);
            let mut response = ApiError::RateLimited {
                namespace: state.namespace,
                reset_after,
            }
            .into_response();
            set_limit_headers(response.headers_mut(), state.quota.limit, 0, reset_after);
            response
        }
    }
}

/// Whole seconds until reset, rounded up so clients never retry early.
pub fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

fn set_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset_after: Duration) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(ceil_secs(reset_after)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, middleware, routing::post, Router};
    use tower::ServiceExt;

    fn app(limit: u32) -> Router {
        let state = RateLimiterState::new(
            Arc::new(MemoryStore::new()),
            NAMESPACE_BRIEF,
            Quota::new(limit, Duration::from_secs(60)),
        );
        Router::new()
            .route("/", post(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(state, rate_limit_middleware))
    }

    fn request(ip: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_ceil_secs() {
        assert_eq!(ceil_secs(Duration::from_secs(5)), 5);
        assert_eq!(ceil_secs(Duration::from_millis(5001)), 6);
        assert_eq!(ceil_secs(Duration::ZERO), 0);
    }

    #[tokio::test]
    async fn test_middleware_headers_and_denial() {
        let app = app(2);

        let res = app.clone().oneshot(request("203.0.113.1")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[X_RATELIMIT_LIMIT], "2");
        assert_eq!(res.headers()[X_RATELIMIT_REMAINING], "1");

        let res = app.clone().oneshot(request("203.0.113.1")).await.unwrap();
        assert_eq!(res.headers()[X_RATELIMIT_REMAINING], "0");

        let res = app.clone().oneshot(request("203.0.113.1")).await.unwrap();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(res.headers().contains_key("retry-after"));

        // Another client is unaffected.
        let res = app.oneshot(request("203.0.113.2")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    struct BrokenStore;

    #[async_trait]
    impl RateLimitStore for BrokenStore {
        async fn allow(&self, _: &str, _: &ClientIdentity, _: Quota) -> Result<RateDecision, RateLimitError> {
            Err(RateLimitError::StoreUnavailable("connection refused".into()))
        }

        fn backend(&self) -> &'static str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_store_failure_fails_closed() {
        let state = RateLimiterState::new(
            Arc::new(BrokenStore),
            NAMESPACE_BRIEF,
            Quota::new(10, Duration::from_secs(60)),
        );
        let app = Router::new()
            .route("/", post(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(state, rate_limit_middleware));

        let res = app.oneshot(request("203.0.113.1")).await.unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
