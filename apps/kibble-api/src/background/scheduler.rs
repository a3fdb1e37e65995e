//! Cron-style job scheduler using tokio-cron-scheduler.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use kibble_infra::{BucketRegistry, ProductCache};

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Enable scheduler.
    pub enabled: bool,
    /// Cron expression (with seconds) for the maintenance sweeps.
    pub sweep_schedule: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_schedule: "0 * * * * *".to_string(),
        }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("SCHEDULER_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            sweep_schedule: std::env::var("SCHEDULER_SWEEP_CRON")
                .unwrap_or_else(|_| Self::default().sweep_schedule),
        }
    }
}

/// Cron job scheduler wrapper.
pub struct Scheduler {
    inner: JobScheduler,
    config: SchedulerConfig,
}

impl Scheduler {
    pub async fn new(config: SchedulerConfig) -> Result<Self, JobSchedulerError> {
        let inner = JobScheduler::new().await?;
        Ok(Self { inner, config })
    }

    /// Register the bucket and cache sweeps, then start.
    pub async fn start_sweeps(
        config: SchedulerConfig,
        registry: Arc<BucketRegistry>,
        products: Arc<ProductCache>,
    ) -> Result<Self, JobSchedulerError> {
        let scheduler = Self::new(config).await?;
        let schedule = scheduler.config.sweep_schedule.clone();

        scheduler
            .add_cron(&schedule, move || {
                let registry = registry.clone();
                async move {
                    let removed = registry.evict_idle();
                    tracing::debug!(removed, tracked = registry.len(), "Rate limit sweep finished");
                }
            })
            .await?;

        scheduler
            .add_cron(&schedule, move || {
                let products = products.clone();
                async move {
                    let removed = products.purge_expired().await;
                    tracing::debug!(removed, "Product cache sweep finished");
                }
            })
            .await?;

        scheduler.start().await?;
        Ok(scheduler)
    }

    /// Add a cron job.
    pub async fn add_cron<F, Fut>(&self, schedule: &str, task: F) -> Result<(), JobSchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let job = Job::new_async(schedule, move |_uuid, _lock| {
            let task = task.clone();
            Box::pin(async move {
                task().await;
            })
        })?;

        let id = self.inner.add(job).await?;
        tracing::info!(schedule = %schedule, job_id = %id, "Cron job registered");
        Ok(())
    }

    pub async fn start(&self) -> Result<(), JobSchedulerError> {
        if !self.config.enabled {
            tracing::info!("Scheduler disabled");
            return Ok(());
        }

        self.inner.start().await?;
        tracing::info!("Scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), JobSchedulerError> {
        self.inner.shutdown().await?;
        tracing::info!("Scheduler stopped");
        Ok(())
    }
}
