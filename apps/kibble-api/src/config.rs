//! Application configuration loaded from environment variables.

use std::env;
use std::num::NonZeroUsize;
use std::time::Duration;

use kibble_core::search::DEFAULT_PATTERN_CACHE_SIZE;
use kibble_infra::RateLimitConfig;
use kibble_infra::cache::ProductCacheConfig;

#[cfg(feature = "http-catalog")]
use kibble_infra::HttpCatalogConfig;

#[cfg(feature = "scheduler")]
use crate::background::SchedulerConfig;
use crate::handlers::health::DEFAULT_HEALTH_TTL;
use crate::telemetry::TelemetryConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Prefix for `detailUrl` in search results.
    pub detail_base_url: String,
    #[cfg(feature = "http-catalog")]
    pub catalog: Option<HttpCatalogConfig>,
    /// JSON product list served when no upstream catalog is configured.
    pub catalog_fixture_path: Option<String>,
    pub rate_limit: RateLimitConfig,
    pub product_cache: ProductCacheConfig,
    pub pattern_cache_size: NonZeroUsize,
    /// How long a catalog health result is reused.
    pub health_check_ttl: Duration,
    #[cfg(feature = "scheduler")]
    pub scheduler: SchedulerConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let detail_base_url = env::var("DETAIL_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| format!("http://{host}:{port}/api"));

        Self {
            detail_base_url,
            #[cfg(feature = "http-catalog")]
            catalog: HttpCatalogConfig::from_env(),
            catalog_fixture_path: env::var("CATALOG_FIXTURE_PATH").ok(),
            rate_limit: RateLimitConfig::from_env(),
            product_cache: ProductCacheConfig::from_env(),
            pattern_cache_size: env::var("PATTERN_CACHE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .and_then(NonZeroUsize::new)
                .unwrap_or(DEFAULT_PATTERN_CACHE_SIZE),
            health_check_ttl: env::var("HEALTH_CHECK_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_HEALTH_TTL),
            #[cfg(feature = "scheduler")]
            scheduler: SchedulerConfig::from_env(),
            telemetry: TelemetryConfig::from_env(),
            host,
            port,
        }
    }
}
