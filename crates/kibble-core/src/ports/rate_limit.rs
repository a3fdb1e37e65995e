//! Rate limiting port.

use std::time::Duration;

use async_trait::async_trait;

/// Rate limiter trait - admission control keyed by caller identity.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Spend one unit of the identity's allowance.
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError>;

    /// Requests each identity may make per window.
    fn limit(&self) -> u32;
}

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    /// Advisory upper bound on when capacity is available again.
    pub reset_epoch_ms: u64,
    pub reset_after: Duration,
}

impl RateLimitResult {
    /// Whole seconds a denied caller should wait, never less than one.
    pub fn retry_after_secs(&self) -> u64 {
        self.reset_after.as_millis().div_ceil(1000).max(1) as u64
    }
}

/// Rate limit errors.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Backend error: {0}")]
    Backend(String),
}
