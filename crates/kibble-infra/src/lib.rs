//! # Kibble Infrastructure
//!
//! Concrete implementations of the ports defined in `kibble-core`:
//! the per-identity token-bucket limiter, the clock-driven in-memory cache,
//! and the catalog adapters.
//!
//! ## Feature Flags
//!
//! - `http-catalog` (default) - reqwest-backed upstream catalog client

pub mod cache;
pub mod catalog;
pub mod clock;
pub mod rate_limit;

pub use cache::{InMemoryCache, ProductCache};
pub use catalog::FixtureCatalog;
pub use clock::{ManualClock, SystemClock};
pub use rate_limit::{BucketRegistry, RateBucket, RateLimitConfig};

#[cfg(feature = "http-catalog")]
pub use catalog::{HttpCatalog, HttpCatalogConfig};
