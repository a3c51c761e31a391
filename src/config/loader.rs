//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the shared admission secret.
pub const ENV_SHARED_SECRET: &str = "API_SHARED_SECRET";
/// Environment variable holding the upstream API key.
pub const ENV_UPSTREAM_KEY: &str = "OPENROUTER_API_KEY";
/// Environment variable holding the Redis URL.
pub const ENV_REDIS_URL: &str = "REDIS_URL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file, then apply
/// environment overrides.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;
    finish(config)
}

/// Build configuration from defaults plus environment overrides.
pub fn load_from_env() -> Result<GatewayConfig, ConfigError> {
    finish(GatewayConfig::default())
}

fn finish(mut config: GatewayConfig) -> Result<GatewayConfig, ConfigError> {
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Secrets set in the environment win over the file.
pub fn apply_env_overrides(config: &mut GatewayConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(secret) = lookup(ENV_SHARED_SECRET).filter(|s| !s.is_empty()) {
        config.admission.shared_secret = Some(secret);
    }
    if let Some(key) = lookup(ENV_UPSTREAM_KEY).filter(|s| !s.is_empty()) {
        config.upstream.api_key = Some(key);
    }
    if let Some(url) = lookup(ENV_REDIS_URL).filter(|s| !s.is_empty()) {
        config.rate_limit.redis_url = Some(url);
    }
}
