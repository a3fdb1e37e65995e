//! Single-identity token bucket with continuous refill.

use std::time::Duration;

use kibble_core::ports::RateLimitResult;

/// Token pool for one identity.
///
/// Refill is proportional to elapsed time: waiting half a window restores
/// half the capacity. Tokens never exceed `capacity` and never go below zero.
#[derive(Debug, Clone)]
pub struct RateBucket {
    capacity: u32,
    window_ms: u64,
    tokens: f64,
    last_refill_at: u64,
}

impl RateBucket {
    /// A full bucket.
    pub fn new(capacity: u32, window: Duration, now_ms: u64) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            window_ms: u64::try_from(window.as_millis()).unwrap_or(u64::MAX).max(1),
            tokens: f64::from(capacity),
            last_refill_at: now_ms,
        }
    }

    /// Refill for the time elapsed since the last call, then try to take one token.
    pub fn consume(&mut self, now_ms: u64) -> RateLimitResult {
        self.refill(now_ms);

        let reset_epoch_ms = self.last_refill_at.saturating_add(self.window_ms);
        let reset_after = Duration::from_millis(reset_epoch_ms.saturating_sub(now_ms));

        // A fractional token is not enough to admit a request.
        if self.tokens < 1.0 {
            return RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_epoch_ms,
                reset_after,
            };
        }

        self.tokens -= 1.0;
        RateLimitResult {
            allowed: true,
            remaining: self.tokens.floor() as u32,
            reset_epoch_ms,
            reset_after,
        }
    }

    fn refill(&mut self, now_ms: u64) {
        let elapsed = now_ms.saturating_sub(self.last_refill_at);
        if elapsed == 0 {
            return;
        }

        let capacity = f64::from(self.capacity);
        let regained = (elapsed as f64 / self.window_ms as f64) * capacity;
        self.tokens = (self.tokens + regained).min(capacity);
        self.last_refill_at = now_ms;
    }

    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn last_refill_at(&self) -> u64 {
        self.last_refill_at
    }

    /// True once enough time has passed for the bucket to be full again.
    pub fn is_full_at(&self, now_ms: u64) -> bool {
        let elapsed = now_ms.saturating_sub(self.last_refill_at);
        let regained = (elapsed as f64 / self.window_ms as f64) * f64::from(self.capacity);
        self.tokens + regained >= f64::from(self.capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn test_fresh_bucket_admits_exactly_capacity() {
        for capacity in [1, 2, 5, 30] {
            let mut bucket = RateBucket::new(capacity, WINDOW, 1_000);
            for i in 0..capacity {
                let result = bucket.consume(1_000);
                assert!(result.allowed, "call {i} of {capacity} should pass");
                assert_eq!(result.remaining, capacity - i - 1);
            }
            let denied = bucket.consume(1_000);
            assert!(!denied.allowed);
            assert_eq!(denied.remaining, 0);
        }
    }

    #[test]
    fn test_full_window_restores_capacity() {
        let mut bucket = RateBucket::new(10, WINDOW, 0);
        for _ in 0..10 {
            bucket.consume(0);
        }
        assert!(!bucket.consume(0).allowed);

        let result = bucket.consume(60_000);
        assert!(result.allowed);
        assert_eq!(result.remaining, 9);
    }

    #[test]
    fn test_refill_is_proportional() {
        let mut bucket = RateBucket::new(10, WINDOW, 0);
        for _ in 0..10 {
            bucket.consume(0);
        }

        // Half a window gives back half the capacity.
        let result = bucket.consume(30_000);
        assert!(result.allowed);
        assert_eq!(result.remaining, 4);
    }

    #[test]
    fn test_refill_never_exceeds_capacity() {
        let mut bucket = RateBucket::new(3, WINDOW, 0);
        bucket.consume(0);
        let result = bucket.consume(10 * 60_000);
        assert_eq!(result.remaining, 2);
        assert!(bucket.tokens() <= 3.0);
    }

    #[test]
    fn test_reset_is_last_refill_plus_window() {
        let mut bucket = RateBucket::new(2, WINDOW, 5_000);
        let first = bucket.consume(5_000);
        assert_eq!(first.reset_epoch_ms, 5_000 + 60_000);

        let later = bucket.consume(7_500);
        assert_eq!(bucket.last_refill_at(), 7_500);
        assert_eq!(later.reset_epoch_ms, 7_500 + 60_000);
        assert_eq!(later.reset_after, WINDOW);
    }

    #[test]
    fn test_denial_reports_reset() {
        let mut bucket = RateBucket::new(1, WINDOW, 0);
        bucket.consume(0);
        let denied = bucket.consume(0);
        assert!(!denied.allowed);
        assert_eq!(denied.reset_epoch_ms, 60_000);
        assert_eq!(denied.retry_after_secs(), 60);
    }

    #[test]
    fn test_clock_going_backwards_does_not_refill() {
        let mut bucket = RateBucket::new(1, WINDOW, 10_000);
        bucket.consume(10_000);
        assert!(!bucket.consume(5_000).allowed);
        assert_eq!(bucket.last_refill_at(), 10_000);
    }

    #[test]
    fn test_idle_bucket_becomes_full() {
        let mut bucket = RateBucket::new(4, WINDOW, 0);
        bucket.consume(0);
        assert!(!bucket.is_full_at(10_000));
        assert!(bucket.is_full_at(15_000));
    }
}
