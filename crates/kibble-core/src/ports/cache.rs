//! Expiring key/value store port.

use std::time::Duration;

use async_trait::async_trait;

/// String store in which every entry expires. Expiry is judged on read,
/// so an expired entry is never returned even before a sweep removes it.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key` for `ttl`, replacing any previous entry.
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Returns true if an entry was present.
    async fn remove(&self, key: &str) -> bool;

    /// Drop every expired entry, returning how many went.
    async fn purge_expired(&self) -> usize;
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Could not encode cache value: {0}")]
    Encode(String),

    #[error("Cache is full ({0} live entries)")]
    Full(usize),
}
