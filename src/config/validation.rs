//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the canonical app URL shape
//! - Validate value ranges (quotas > 0, timeouts > 0)
//! - Check the chosen store backend has what it needs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, QuotaConfig, StoreBackend};

/// Longest accepted rate limit window: one year.
pub const MAX_WINDOW_SECS: u64 = 366 * 24 * 60 * 60;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("admission.app_url '{0}' is not a valid URL")]
    AppUrlInvalid(String),

    #[error("admission.app_url '{0}' must be scheme and host only, without path or trailing slash")]
    AppUrlNotCanonical(String),

    #[error("admission.token_header must not be empty")]
    TokenHeaderEmpty,

    #[error("admission.shared_secret must not be empty; omit it to leave the secret unset")]
    SharedSecretEmpty,

    #[error("rate_limit.{0}: limit and window_secs must be greater than zero")]
    QuotaZero(&'static str),

    #[error("rate_limit.{0}: window_secs must be at most {MAX_WINDOW_SECS}")]
    QuotaWindowTooLong(&'static str),

    #[error("rate_limit.redis_url is required when backend = \"redis\"")]
    RedisUrlMissing,

    #[error("rate_limit.sweep_interval_secs must be greater than zero")]
    SweepIntervalZero,

    #[error("timeouts.{0} must be greater than zero")]
    TimeoutZero(&'static str),
}

/// Validate a loaded configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_app_url(&config.admission.app_url, &mut errors);

    if config.admission.token_header.trim().is_empty() {
        errors.push(ValidationError::TokenHeaderEmpty);
    }
    if config.admission.shared_secret.as_deref() == Some("") {
        errors.push(ValidationError::SharedSecretEmpty);
    }

    check_quota("brief", &config.rate_limit.brief, &mut errors);
    check_quota("followup", &config.rate_limit.followup, &mut errors);

    if config.rate_limit.backend == StoreBackend::Redis && config.rate_limit.redis_url.is_none() {
        errors.push(ValidationError::RedisUrlMissing);
    }
    if config.rate_limit.sweep_interval_secs == 0 {
        errors.push(ValidationError::SweepIntervalZero);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::TimeoutZero("request_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::TimeoutZero("upstream_secs"));
    }
    if config.timeouts.store_ms == 0 {
        errors.push(ValidationError::TimeoutZero("store_ms"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// Origin headers are compared byte-for-byte, so the configured value has to
// look exactly like what a browser sends: "https://host[:port]".
fn validate_app_url(app_url: &str, errors: &mut Vec<ValidationError>) {
    let parsed = match Url::parse(app_url) {
        Ok(u) if matches!(u.scheme(), "http" | "https") && u.host_str().is_some() => u,
        _ => {
            errors.push(ValidationError::AppUrlInvalid(app_url.to_string()));
            return;
        }
    };

    if app_url.ends_with('/') || parsed.path() != "/" || parsed.query().is_some() {
        errors.push(ValidationError::AppUrlNotCanonical(app_url.to_string()));
    }
}

fn check_quota(name: &'static str, quota: &QuotaConfig, errors: &mut Vec<ValidationError>) {
    if quota.limit == 0 || quota.window_secs == 0 {
        errors.push(ValidationError::QuotaZero(name));
    } else if quota.window_secs > MAX_WINDOW_SECS {
        errors.push(ValidationError::QuotaWindowTooLong(name));
    }
}
