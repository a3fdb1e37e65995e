//! In-memory per-identity rate limiter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;

use kibble_core::ports::{Clock, RateLimitError, RateLimitResult, RateLimiter};

use super::bucket::RateBucket;

/// In-memory rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window, per identity.
    pub max_requests: u32,
    /// Window duration.
    pub window: Duration,
    /// Buckets untouched for this long (and full again) are dropped.
    pub idle_ttl: Duration,
    /// Upper bound on tracked identities.
    pub max_identities: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window: Duration::from_secs(60),
            idle_ttl: Duration::from_secs(3600),
            max_identities: 10_000,
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_requests: std::env::var("RATE_LIMIT_MAX_REQUESTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_requests),
            window: std::env::var("RATE_LIMIT_WINDOW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.window),
            idle_ttl: std::env::var("RATE_LIMIT_IDLE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.idle_ttl),
            max_identities: std::env::var("RATE_LIMIT_MAX_IDENTITIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_identities),
        }
    }
}

struct Slot {
    bucket: RateBucket,
    last_seen: u64,
}

/// One token bucket per identity, created on first sight.
///
/// Limits are per-process, not shared across instances. Each identity's
/// refill-and-take runs under its map shard's write lock, so concurrent
/// calls for the same identity are serialized and a new identity gets
/// exactly one bucket.
pub struct BucketRegistry {
    buckets: DashMap<String, Slot>,
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
}

impl BucketRegistry {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: DashMap::new(),
            config,
            clock,
        }
    }

    pub fn from_env(clock: Arc<dyn Clock>) -> Self {
        Self::new(RateLimitConfig::from_env(), clock)
    }

    /// Admit or deny one request for `identity`.
    pub fn consume(&self, identity: &str) -> RateLimitResult {
        let now = self.clock.now_millis();

        let cap = self.config.max_identities;

        if !self.buckets.contains_key(identity) && self.buckets.len() >= cap {
            self.make_room(now, cap.saturating_sub(1), identity);
        }

        let result = {
            let mut slot = self.buckets.entry(identity.to_string()).or_insert_with(|| {
                tracing::debug!(identity = %identity, "Creating rate limit bucket");
                Slot {
                    bucket: RateBucket::new(self.config.max_requests, self.config.window, now),
                    last_seen: now,
                }
            });
            slot.last_seen = now;
            slot.bucket.consume(now)
        };

        // Concurrent first sightings can all pass the check above.
        if self.buckets.len() > cap {
            self.make_room(now, cap, identity);
        }

        result
    }

    /// Drop buckets that have been idle for `idle_ttl` and have refilled
    /// completely, so dropping them changes nothing a caller can observe.
    pub fn evict_idle(&self) -> usize {
        let now = self.clock.now_millis();
        let before = self.buckets.len();
        self.evict_idle_at(now);
        let removed = before.saturating_sub(self.buckets.len());
        if removed > 0 {
            tracing::info!(removed, remaining = self.buckets.len(), "Evicted idle rate limit buckets");
        }
        removed
    }

    fn evict_idle_at(&self, now: u64) {
        let ttl = u64::try_from(self.config.idle_ttl.as_millis()).unwrap_or(u64::MAX);
        self.buckets.retain(|_, slot| {
            now.saturating_sub(slot.last_seen) < ttl || !slot.bucket.is_full_at(now)
        });
    }

    /// Shrink to at most `target` buckets: idle ones first, then least
    /// recently used. The bucket for `keep` is never chosen.
    fn make_room(&self, now: u64, target: usize, keep: &str) {
        self.evict_idle_at(now);

        while self.buckets.len() > target {
            let oldest = self
                .buckets
                .iter()
                .filter(|entry| entry.key() != keep)
                .min_by_key(|entry| entry.value().last_seen)
                .map(|entry| entry.key().clone());

            let Some(key) = oldest else { break };
            tracing::warn!(identity = %key, "Identity cap reached, evicting least recently used bucket");
            self.buckets.remove(&key);
        }
    }

    pub fn capacity(&self) -> u32 {
        self.config.max_requests
    }

    pub fn window(&self) -> Duration {
        self.config.window
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[async_trait]
impl RateLimiter for BucketRegistry {
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError> {
        Ok(self.consume(key))
    }

    fn limit(&self) -> u32 {
        self.capacity()
    }
}
