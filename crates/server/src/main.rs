//! AgriSage server - agricultural prediction service
//!
//! Serves predictions from trained ONNX regressors, falling back to
//! closed-form heuristics for tasks without a usable model.

use agrisage_lib::{
    health::{components, HealthRegistry},
    observability::StructuredLogger,
    FsModelStore, PredictionResolver,
};
use agrisage_server::{api, ServerConfig};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting agrisage-server");

    let config = ServerConfig::load()?;
    info!(
        model_dir = %config.model_dir.display(),
        column_order = ?config.column_order,
        warm_up = config.warm_up,
        "Server configured"
    );

    let logger = StructuredLogger::new("agrisage-server");
    logger.log_startup(SERVER_VERSION, &config.model_dir.display().to_string(), config.port);

    let store = FsModelStore::new(&config.model_dir).with_max_artifact_bytes(config.max_artifact_bytes);

    let health_registry = HealthRegistry::new();
    health_registry.register(components::RESOLVER).await;
    health_registry.check_model_store(&store).await;

    let resolver = Arc::new(
        PredictionResolver::new(Arc::new(store), config.column_order).with_logger(logger.clone()),
    );

    if config.warm_up {
        let warm = resolver.clone();
        tokio::task::spawn_blocking(move || warm.warm_up()).await?;
    }

    let app_state = Arc::new(api::AppState::new(health_registry.clone(), resolver));

    health_registry.set_ready(true).await;

    api::serve(config.port, app_state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
    })
    .await?;

    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}
