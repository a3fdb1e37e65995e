//! Application state - shared across all handlers.

use std::sync::Arc;

use kibble_core::ports::{Cache, Catalog, Clock, RateLimiter};
use kibble_core::search::{PatternCache, SearchPipeline};
use kibble_infra::{BucketRegistry, FixtureCatalog, InMemoryCache, ProductCache};

use crate::config::AppConfig;
use crate::handlers::health::CatalogHealth;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<dyn RateLimiter>,
    pub catalog: Arc<dyn Catalog>,
    pub pipeline: Arc<SearchPipeline>,
    pub products: Arc<ProductCache>,
    pub health: Arc<CatalogHealth>,
    pub detail_base_url: String,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub fn new(config: &AppConfig, registry: Arc<BucketRegistry>, clock: Arc<dyn Clock>) -> Self {
        let catalog = build_catalog(config);
        let patterns = Arc::new(PatternCache::new(config.pattern_cache_size));
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new(
            clock.clone(),
            config.product_cache.max_entries,
        ));
        let products = Arc::new(ProductCache::new(cache, config.product_cache.clone()));

        tracing::info!(
            rate_limit = registry.capacity(),
            window_secs = registry.window().as_secs(),
            "Application state initialized"
        );

        let health = Arc::new(CatalogHealth::new(
            catalog.clone(),
            clock.clone(),
            config.health_check_ttl,
        ));

        Self {
            health,
            ..Self::from_parts(
                registry,
                catalog,
                patterns,
                products,
                clock,
                config.detail_base_url.clone(),
            )
        }
    }

    pub fn from_parts(
        limiter: Arc<dyn RateLimiter>,
        catalog: Arc<dyn Catalog>,
        patterns: Arc<PatternCache>,
        products: Arc<ProductCache>,
        clock: Arc<dyn Clock>,
        detail_base_url: String,
    ) -> Self {
        let pipeline = Arc::new(SearchPipeline::new(catalog.clone(), patterns));
        let health = Arc::new(CatalogHealth::with_default_ttl(catalog.clone(), clock));
        Self {
            limiter,
            catalog,
            pipeline,
            products,
            health,
            detail_base_url,
        }
    }

    pub fn detail_url(&self, id: &str) -> String {
        format!("{}/products/{}", self.detail_base_url, id)
    }
}

/// Upstream catalog if configured, else a fixture file, else the bundled sample.
fn build_catalog(config: &AppConfig) -> Arc<dyn Catalog> {
    #[cfg(feature = "http-catalog")]
    if let Some(http) = &config.catalog {
        match kibble_infra::HttpCatalog::new(http.clone()) {
            Ok(catalog) => return Arc::new(catalog),
            Err(e) => {
                tracing::error!(error = %e, "Failed to build upstream catalog client. Using fixture fallback.");
            }
        }
    }

    if let Some(path) = &config.catalog_fixture_path {
        match FixtureCatalog::from_file(path) {
            Ok(catalog) => {
                tracing::info!(path = %path, products = catalog.len(), "Using fixture catalog");
                return Arc::new(catalog);
            }
            Err(e) => {
                tracing::error!(path = %path, error = %e, "Failed to load fixture catalog. Using bundled sample.");
            }
        }
    }

    tracing::warn!("No catalog configured. Serving the bundled sample catalog.");
    match FixtureCatalog::sample() {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => {
            tracing::error!(error = %e, "Bundled sample catalog is unreadable");
            Arc::new(FixtureCatalog::new(Vec::new()))
        }
    }
}

/// Product cache with default settings, used by tests.
#[cfg(test)]
pub fn test_product_cache(clock: Arc<dyn Clock>) -> Arc<ProductCache> {
    let config = kibble_infra::cache::ProductCacheConfig::default();
    Arc::new(ProductCache::new(
        Arc::new(InMemoryCache::new(clock, config.max_entries)),
        config,
    ))
}
