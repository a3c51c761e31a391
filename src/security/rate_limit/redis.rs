//! Redis-backed rate limit store.
//!
//! Shares counters across every gateway instance. The fixed-window
//! algorithm runs as one Lua script, which Redis executes atomically, so
//! concurrent requests from any process are linearized per key.
//!
//! ## Keys
//!
//! `<prefix><namespace>:<identity>` holding the integer count, with a
//! millisecond expiry equal to the window. Redis expiry is the garbage
//! collector; no sweep is needed.
//!
//! ## Failure handling
//!
//! Every round trip is bounded by a timeout. Connection errors and timeouts
//! surface as [`RateLimitError`]; they are never read as "allowed".

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, Script};
use std::fmt;
use std::time::Duration;
use tokio::time::timeout;

use super::{Quota, RateDecision, RateLimitError, RateLimitStore};
use crate::security::identity::ClientIdentity;

// KEYS[1] = record key, ARGV[1] = limit, ARGV[2] = window in ms.
// Returns {allowed, count, ttl_ms}.
const FIXED_WINDOW_SCRIPT: &str = r#"
local limit = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local current = redis.call('GET', KEYS[1])
local ttl = redis.call('PTTL', KEYS[1])
if (not current) or ttl <= 0 then
  redis.call('SET', KEYS[1], 1, 'PX', window)
  return {1, 1, window}
end
current = tonumber(current)
if current >= limit then
  return {0, current, ttl}
end
current = redis.call('INCR', KEYS[1])
return {1, current, ttl}
"#;

/// Configuration for Redis storage.
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Key prefix for every record.
    pub key_prefix: String,
    /// Upper bound on each round trip.
    pub timeout: Duration,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: "brief-gateway:".to_string(),
            timeout: Duration::from_millis(500),
        }
    }
}

/// Rate limit store shared by all instances through Redis.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    config: RedisStoreConfig,
    script: Script,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connect to Redis.
    ///
    /// # Errors
    /// Returns error if the URL is invalid, the connection fails, or it does
    /// not complete within the configured timeout.
    pub async fn connect(url: &str, config: RedisStoreConfig) -> Result<Self, RateLimitError> {
        let client = Client::open(url).map_err(|e| RateLimitError::StoreUnavailable(e.to_string()))?;
        let connection = timeout(config.timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| RateLimitError::StoreTimeout(config.timeout))?
            .map_err(|e| RateLimitError::StoreUnavailable(e.to_string()))?;

        tracing::info!(prefix = %config.key_prefix, "Connected to Redis rate limit store");

        Ok(Self {
            connection,
            config,
            script: Script::new(FIXED_WINDOW_SCRIPT),
        })
    }

    fn key(&self, namespace: &str, identity: &ClientIdentity) -> String {
        record_key(&self.config.key_prefix, namespace, identity)
    }
}

fn record_key(prefix: &str, namespace: &str, identity: &ClientIdentity) -> String {
    format!("{}{}:{}", prefix, namespace, identity.as_str())
}

fn window_millis(window: Duration) -> u64 {
    u64::try_from(window.as_millis()).unwrap_or(u64::MAX).max(1)
}

// Script reply to decision. Negative TTLs cannot come back from the script,
// but clamp anyway rather than wrap.
fn decision_from_reply(allowed: i64, count: i64, ttl_ms: i64, limit: u32) -> RateDecision {
    let reset_after = Duration::from_millis(ttl_ms.max(0) as u64);
    if allowed == 1 {
        let count = u32::try_from(count.max(0)).unwrap_or(u32::MAX);
        RateDecision::Allowed {
            remaining: limit.saturating_sub(count),
            reset_after,
        }
    } else {
        RateDecision::Denied { reset_after }
    }
}

#[async_trait]
impl RateLimitStore for RedisStore {
    async fn allow(
        &self,
        namespace: &str,
        identity: &ClientIdentity,
        quota: Quota,
    ) -> Result<RateDecision, RateLimitError> {
        let key = self.key(namespace, identity);
        let mut conn = self.connection.clone();

        let mut invocation = self.script.key(&key);
        invocation.arg(quota.limit).arg(window_millis(quota.window));

        let (allowed, count, ttl_ms): (i64, i64, i64) =
            timeout(self.config.timeout, invocation.invoke_async(&mut conn))
                .await
                .map_err(|_| RateLimitError::StoreTimeout(self.config.timeout))?
                .map_err(|e| RateLimitError::StoreUnavailable(e.to_string()))?;

        Ok(decision_from_reply(allowed, count, ttl_ms, quota.limit))
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let id = ClientIdentity::from_address("203.0.113.7");
        let key = record_key("gw:", "brief", &id);
        assert_eq!(key, format!("gw:brief:{}", id.as_str()));
        assert_ne!(key, record_key("gw:", "followup", &id));
    }

    #[test]
    fn test_reply_mapping() {
        assert_eq!(
            decision_from_reply(1, 1, 60_000, 10),
            RateDecision::Allowed {
                remaining: 9,
                reset_after: Duration::from_secs(60)
            }
        );
        assert_eq!(
            decision_from_reply(0, 10, 1_500, 10),
            RateDecision::Denied {
                reset_after: Duration::from_millis(1_500)
            }
        );
        assert_eq!(decision_from_reply(0, 10, -2, 10).reset_after(), Duration::ZERO);
    }

    #[test]
    fn test_window_millis_never_zero() {
        assert_eq!(window_millis(Duration::ZERO), 1);
        assert_eq!(window_millis(Duration::from_secs(86_400)), 86_400_000);
    }

    #[tokio::test]
    async fn test_unreachable_store_is_an_error() {
        let config = RedisStoreConfig {
            key_prefix: "test:".into(),
            timeout: Duration::from_millis(200),
        };
        // Port 1 is reserved and closed on any sane host.
        let result = RedisStore::connect("redis://127.0.0.1:1/", config).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let config = RedisStoreConfig {
            key_prefix: "test:".into(),
            timeout: Duration::from_millis(100),
        };
        let err = match RedisStore::connect(&format!("redis://{}/", addr), config).await {
            Err(e) => e,
            Ok(store) => store
                .allow(
                    "brief",
                    &ClientIdentity::from_address("203.0.113.7"),
                    Quota::new(10, Duration::from_secs(60)),
                )
                .await
                .unwrap_err(),
        };
        assert!(matches!(err, RateLimitError::StoreTimeout(t) if t == Duration::from_millis(100)));
    }
}
