//! Rate limiting implementations.

mod bucket;
mod memory;

pub use bucket::RateBucket;
pub use memory::{BucketRegistry, RateLimitConfig};
