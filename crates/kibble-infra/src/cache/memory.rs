//! Bounded in-memory cache with clock-driven expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use kibble_core::ports::{Cache, CacheError, Clock};

struct Entry {
    value: String,
    expires_at: u64,
}

impl Entry {
    fn is_live(&self, now: u64) -> bool {
        now < self.expires_at
    }
}

/// Entries live in a HashMap behind an async RwLock and are lost on restart.
///
/// When `max_entries` live values are held, new keys are refused until a
/// sweep or expiry frees room. Existing keys can always be refreshed.
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
    max_entries: usize,
}

impl InMemoryCache {
    pub fn new(clock: Arc<dyn Clock>, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            max_entries,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let now = self.clock.now_millis();
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let now = self.clock.now_millis();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let mut entries = self.entries.write().await;

        if !entries.contains_key(key) && entries.len() >= self.max_entries {
            entries.retain(|_, entry| entry.is_live(now));
            if entries.len() >= self.max_entries {
                return Err(CacheError::Full(entries.len()));
            }
        }

        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now.saturating_add(ttl_ms),
            },
        );
        Ok(())
    }

    async fn remove(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    async fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }
}
