//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the brief gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Origin and shared-secret checks.
    pub admission: AdmissionConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Upstream model API settings.
    pub upstream: UpstreamConfig,

    /// Input size limits.
    pub limits: InputLimits,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Upstream model call timeout in seconds.
    pub upstream_secs: u64,

    /// External rate limit store round trip timeout in milliseconds.
    pub store_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 90,
            upstream_secs: 60,
            store_ms: 500,
        }
    }
}

/// Admission gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Canonical application URL, scheme and host, no trailing slash.
    pub app_url: String,

    /// Header carrying the shared secret.
    pub token_header: String,

    /// Shared secret. Usually supplied through `API_SHARED_SECRET`.
    pub shared_secret: Option<String>,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            app_url: "http://localhost:3000".to_string(),
            token_header: "x-app-token".to_string(),
            shared_secret: None,
        }
    }
}

/// Which store keeps rate limit records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process-local map. Counters reset on restart and are not shared
    /// between instances.
    Memory,
    /// Redis, shared by every instance.
    Redis,
}

/// A request quota: `limit` requests per `window_secs`.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct QuotaConfig {
    pub limit: u32,
    pub window_secs: u64,
}

impl QuotaConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Store backend.
    pub backend: StoreBackend,

    /// Redis connection URL, required for the redis backend.
    pub redis_url: Option<String>,

    /// Prefix for every Redis key.
    pub key_prefix: String,

    /// How often the memory store drops expired records.
    pub sweep_interval_secs: u64,

    /// Quota for brief generation.
    pub brief: QuotaConfig,

    /// Quota for follow-up questions.
    pub followup: QuotaConfig,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            redis_url: None,
            key_prefix: "brief-gateway:".to_string(),
            sweep_interval_secs: 3600,
            brief: QuotaConfig {
                limit: 10,
                window_secs: 24 * 60 * 60,
            },
            followup: QuotaConfig {
                limit: 20,
                window_secs: 24 * 60 * 60,
            },
        }
    }
}

/// Upstream chat completions API.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,

    /// API key. Usually supplied through `OPENROUTER_API_KEY`.
    pub api_key: Option<String>,

    /// Model identifier.
    pub model: String,

    /// Value of the `X-Title` header sent upstream.
    pub title: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key: None,
            model: "openai/gpt-4o-mini".to_string(),
            title: "Decision Brief".to_string(),
        }
    }
}

/// Input size limits, counted in characters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InputLimits {
    pub max_content_chars: usize,
    pub max_context_chars: usize,
    pub max_question_chars: usize,
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_content_chars: 50_000,
            max_context_chars: 10_000,
            max_question_chars: 2_000,
            max_body_bytes: 1024 * 1024, // 1MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
