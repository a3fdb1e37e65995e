//! # Kibble API Server
//!
//! The main entry point for the Actix-web HTTP server.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

use kibble_core::ports::Clock;
use kibble_infra::{BucketRegistry, SystemClock};

mod background;
mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;

use config::AppConfig;
use state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    telemetry::init_telemetry(&config.telemetry);

    tracing::info!(
        "Starting Kibble API Server on {}:{}",
        config.host,
        config.port
    );

    // One clock and one bucket registry for the whole process
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let registry = Arc::new(BucketRegistry::new(config.rate_limit.clone(), clock.clone()));
    let state = AppState::new(&config, registry.clone(), clock);

    let maintenance =
        background::start_maintenance(&config, registry, state.products.clone()).await;

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    maintenance.shutdown().await;
    Ok(())
}
