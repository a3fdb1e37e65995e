//! Background maintenance: idle rate-limit buckets and expired cache entries.

#[cfg(feature = "scheduler")]
mod scheduler;

#[cfg(feature = "scheduler")]
pub use scheduler::{Scheduler, SchedulerConfig};

use std::sync::Arc;

use kibble_infra::{BucketRegistry, ProductCache};

use crate::config::AppConfig;

/// Handle to the running sweeps, if any.
pub struct Maintenance {
    #[cfg(feature = "scheduler")]
    scheduler: Option<Scheduler>,
}

#[cfg(feature = "scheduler")]
pub async fn start_maintenance(
    config: &AppConfig,
    registry: Arc<BucketRegistry>,
    products: Arc<ProductCache>,
) -> Maintenance {
    match Scheduler::start_sweeps(config.scheduler.clone(), registry, products).await {
        Ok(scheduler) => Maintenance {
            scheduler: Some(scheduler),
        },
        Err(e) => {
            tracing::error!(error = %e, "Failed to start maintenance scheduler; idle buckets will not be evicted");
            Maintenance { scheduler: None }
        }
    }
}

#[cfg(not(feature = "scheduler"))]
pub async fn start_maintenance(
    _config: &AppConfig,
    _registry: Arc<BucketRegistry>,
    _products: Arc<ProductCache>,
) -> Maintenance {
    tracing::info!("Running without scheduler feature - idle buckets are evicted only at the identity cap");
    Maintenance {}
}

impl Maintenance {
    pub async fn shutdown(self) {
        #[cfg(feature = "scheduler")]
        if let Some(mut scheduler) = self.scheduler {
            if let Err(e) = scheduler.shutdown().await {
                tracing::warn!(error = %e, "Scheduler did not shut down cleanly");
            }
        }
    }
}
