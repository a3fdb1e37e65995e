//! Liveness and upstream reachability.

use std::sync::Arc;
use std::time::Duration;

use actix_web::{HttpResponse, web};
use serde::Serialize;
use tokio::sync::Mutex;

use kibble_core::ports::{Catalog, CatalogQuery, Clock};

use crate::state::AppState;

pub const DEFAULT_HEALTH_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogStatus {
    Reachable,
    Unreachable,
    Invalid,
}

/// Catalog reachability, re-checked at most once per `ttl`.
///
/// The health route is not rate-limited, so it must never turn caller
/// traffic into upstream traffic. Concurrent callers wait on the single
/// check in flight.
pub struct CatalogHealth {
    catalog: Arc<dyn Catalog>,
    clock: Arc<dyn Clock>,
    ttl_ms: u64,
    last: Mutex<Option<(u64, CatalogStatus)>>,
}

impl CatalogHealth {
    pub fn new(catalog: Arc<dyn Catalog>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            catalog,
            clock,
            ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
            last: Mutex::new(None),
        }
    }

    pub fn with_default_ttl(catalog: Arc<dyn Catalog>, clock: Arc<dyn Clock>) -> Self {
        Self::new(catalog, clock, DEFAULT_HEALTH_TTL)
    }

    /// Last result if still fresh, else a one-item fetch.
    pub async fn status(&self) -> (CatalogStatus, u64) {
        let mut last = self.last.lock().await;
        let now = self.clock.now_millis();

        if let Some((checked_at, status)) = *last {
            if now.saturating_sub(checked_at) < self.ttl_ms {
                return (status, checked_at);
            }
        }

        let query = CatalogQuery {
            limit: 1,
            ..Default::default()
        };
        let status = match self.catalog.fetch_batch(&query).await {
            Ok(_) => CatalogStatus::Reachable,
            Err(e) if e.is_transient() => {
                tracing::warn!(error = %e, "Health check could not reach the catalog");
                CatalogStatus::Unreachable
            }
            Err(e) => {
                tracing::warn!(error = %e, "Health check got an unusable catalog response");
                CatalogStatus::Invalid
            }
        };

        *last = Some((now, status));
        (status, now)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the catalog cannot be reached.
    pub status: &'static str,
    pub catalog: CatalogStatus,
    pub catalog_checked_at_ms: u64,
    pub version: &'static str,
    pub timestamp: String,
    pub requests_per_window: u32,
}

/// GET /api/health
///
/// Not rate-limited. Catalog status comes from [`CatalogHealth`].
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let (catalog, checked_at) = state.health.status().await;

    HttpResponse::Ok().json(HealthResponse {
        status: if catalog == CatalogStatus::Reachable {
            "ok"
        } else {
            "degraded"
        },
        catalog,
        catalog_checked_at_ms: checked_at,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        requests_per_window: state.limiter.limit(),
    })
}
