//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Put the admission gate in front of the rate limiter on every API route
//! - Bind server to listener and drain on shutdown

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{GatewayConfig, InputLimits};
use crate::http::handlers::{ask_followup, create_brief, health};
use crate::observability::metrics;
use crate::security::admission::{admission_middleware, AdmissionGate};
use crate::security::rate_limit::{
    rate_limit_middleware, RateLimitStore, RateLimiterState, NAMESPACE_BRIEF, NAMESPACE_FOLLOWUP,
};
use crate::upstream::ModelClient;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn ModelClient>,
    pub limits: InputLimits,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server around an already-built store and model client.
    pub fn new(
        config: GatewayConfig,
        store: Arc<dyn RateLimitStore>,
        model: Arc<dyn ModelClient>,
    ) -> Self {
        let state = AppState {
            model,
            limits: config.limits.clone(),
        };
        let router = Self::build_router(&config, store, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Per API request: admission → rate limit (own namespace) → handler.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, store: Arc<dyn RateLimitStore>, state: AppState) -> Router {
        let gate = Arc::new(AdmissionGate::from_config(&config.admission));
        let brief_limit = RateLimiterState::new(store.clone(), NAMESPACE_BRIEF, config.rate_limit.brief.into());
        let followup_limit = RateLimiterState::new(store, NAMESPACE_FOLLOWUP, config.rate_limit.followup.into());

        let brief_routes = Router::new()
            .route("/api/brief", post(create_brief))
            .route_layer(middleware::from_fn_with_state(brief_limit, rate_limit_middleware));

        let followup_routes = Router::new()
            .route("/api/followup", post(ask_followup))
            .route_layer(middleware::from_fn_with_state(followup_limit, rate_limit_middleware));

        let api = brief_routes
            .merge(followup_routes)
            .route_layer(middleware::from_fn_with_state(gate, admission_middleware))
            .with_state(state);

        Router::new()
            .route("/health", get(health))
            .merge(api)
            .layer(middleware::from_fn(track_metrics))
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            app_url = %self.config.admission.app_url,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let method = request.method().clone();

    let response = next.run(request).await;
    metrics::record_request(method.as_str(), &route, response.status().as_u16(), start);
    response
}
