//! # Floodgate Gateway Server
//!
//! Admission gateway: per-client rate limiting and load-aware shedding in
//! front of a shared backend.

use actix_web::{App, HttpServer, web};
use anyhow::Context;
use tracing_actix_web::TracingLogger;

mod background;
mod config;
mod handlers;
mod middleware;
mod observability;
mod orchestrator;
mod state;
mod telemetry;

use config::AppConfig;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();
    let (host, port) = (config.host.clone(), config.port);

    tracing::info!("Starting Floodgate gateway on {}:{}", host, port);

    let state = AppState::new(config).await;

    #[cfg(feature = "scheduler")]
    let mut scheduler = {
        use background::scheduler::{Scheduler, SchedulerConfig};

        let scheduler = Scheduler::new(SchedulerConfig::from_env())
            .await
            .context("failed to create scheduler")?;
        scheduler
            .add_registry_sweep(state.rate_limiter.clone())
            .await
            .context("failed to register registry sweep")?;
        scheduler.start().await.context("failed to start scheduler")?;
        scheduler
    };

    let app_state = state.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(app_state.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((host.as_str(), port))
    .with_context(|| format!("failed to bind {}:{}", host, port))?
    .run()
    .await
    .context("server error")?;

    #[cfg(feature = "scheduler")]
    let _ = scheduler
        .shutdown()
        .await
        .map_err(|e| tracing::warn!(error = %e, "Scheduler did not stop cleanly"));

    tracing::info!("Floodgate gateway stopped");
    Ok(())
}
