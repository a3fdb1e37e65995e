//! Typed product detail cache.

use std::sync::Arc;
use std::time::Duration;

use kibble_core::domain::Product;
use kibble_core::ports::{Cache, CacheError};

#[derive(Debug, Clone)]
pub struct ProductCacheConfig {
    pub ttl: Duration,
    pub max_entries: usize,
}

impl Default for ProductCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_entries: 1_000,
        }
    }
}

impl ProductCacheConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl: std::env::var("PRODUCT_CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.ttl),
            max_entries: std::env::var("PRODUCT_CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_entries),
        }
    }
}

/// Product details keyed by id, stored as JSON with a fixed TTL.
pub struct ProductCache {
    cache: Arc<dyn Cache>,
    config: ProductCacheConfig,
}

impl ProductCache {
    pub fn new(cache: Arc<dyn Cache>, config: ProductCacheConfig) -> Self {
        Self { cache, config }
    }

    fn key(id: &str) -> String {
        format!("product:{id}")
    }

    pub async fn get(&self, id: &str) -> Option<Product> {
        let raw = self.cache.get(&Self::key(id)).await?;
        match serde_json::from_str(&raw) {
            Ok(product) => Some(product),
            Err(e) => {
                tracing::warn!(product_id = %id, error = %e, "Dropping undecodable cached product");
                self.cache.remove(&Self::key(id)).await;
                None
            }
        }
    }

    pub async fn put(&self, product: &Product) -> Result<(), CacheError> {
        let raw =
            serde_json::to_string(product).map_err(|e| CacheError::Encode(e.to_string()))?;
        self.cache
            .put(&Self::key(&product.id), raw, self.config.ttl)
            .await
    }

    pub async fn purge_expired(&self) -> usize {
        self.cache.purge_expired().await
    }
}
