//! In-process rate limit store.
//!
//! Each process keeps its own counters: running N instances multiplies the
//! effective limit by N, and a restart resets every client. Use the Redis
//! store when either matters.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use super::{Quota, RateDecision, RateLimitError, RateLimitStore};
use crate::observability::metrics;
use crate::security::identity::ClientIdentity;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RecordKey {
    namespace: String,
    identity: ClientIdentity,
}

/// Per-client window state.
#[derive(Debug, Clone, Copy)]
struct RateLimitRecord {
    count: u32,
    window_end: Instant,
}

/// Windows are clamped here so `now + window` cannot overflow `Instant`.
const MAX_WINDOW: Duration = Duration::from_secs(10 * 366 * 24 * 60 * 60);

impl RateLimitRecord {
    fn fresh(now: Instant, window: Duration) -> Self {
        Self {
            count: 1,
            window_end: now + window.min(MAX_WINDOW),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.window_end
    }
}

/// `DashMap`-backed store. The entry guard holds the shard lock for the
/// whole read-modify-write, so decisions for one key are serialized.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<RecordKey, RateLimitRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the fixed-window algorithm for one request.
    pub fn check(&self, namespace: &str, identity: &ClientIdentity, quota: Quota) -> RateDecision {
        let key = RecordKey {
            namespace: namespace.to_string(),
            identity: identity.clone(),
        };

        // The clock is read under the shard lock so decisions on one key
        // observe non-decreasing times.
        let entry = self.records.entry(key);
        let now = Instant::now();
        let record = match entry {
            Entry::Vacant(vacant) => *vacant.insert(RateLimitRecord::fresh(now, quota.window)),
            Entry::Occupied(mut occupied) => {
                let record = occupied.get_mut();
                if record.is_expired(now) {
                    // Replaced, never incremented.
                    *record = RateLimitRecord::fresh(now, quota.window);
                } else if record.count >= quota.limit {
                    return RateDecision::Denied {
                        reset_after: record.window_end - now,
                    };
                } else {
                    record.count += 1;
                }
                *record
            }
        };

        RateDecision::Allowed {
            remaining: quota.limit.saturating_sub(record.count),
            reset_after: record.window_end - now,
        }
    }

    /// Drop every record whose window has ended. Returns how many went.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_expired(now));
        let removed = before.saturating_sub(self.records.len());
        metrics::record_rate_limit_records(self.records.len());
        removed
    }

    /// Number of tracked records, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sweep on a fixed interval until shutdown.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = self.sweep();
                        tracing::debug!(removed, remaining = self.len(), "Swept expired rate limit records");
                    }
                    _ = shutdown.recv() => {
                        tracing::info!("Rate limit sweeper received shutdown signal, exiting loop");
                        break;
                    }
                }
            }
        })
    }
}

#[async_trait]
impl RateLimitStore for MemoryStore {
    async fn allow(
        &self,
        namespace: &str,
        identity: &ClientIdentity,
        quota: Quota,
    ) -> Result<RateDecision, RateLimitError> {
        Ok(self.check(namespace, identity, quota))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
