//! Potability server - water potability prediction over HTTP
//!
//! Loads the fitted scaler and classifier once, then serves predictions,
//! health probes and Prometheus metrics. A missing or corrupt artifact
//! stops the process before the listener is bound.

use anyhow::{Context, Result};
use potability_lib::{
    observability::{PredictorMetrics, StructuredLogger},
    Artifacts, HealthRegistry,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting potability-server");

    let config = config::ServerConfig::load()?;
    info!(
        api_port = config.api_port,
        scaler = %config.scaler_path.display(),
        classifier = %config.classifier_path.display(),
        "Server configured"
    );

    let logger = StructuredLogger::new("potability-server");

    let artifacts = match Artifacts::load(&config.artifacts()) {
        Ok(artifacts) => artifacts,
        Err(err) => {
            logger.log_startup_failure(&err);
            return Err(err).context("Failed to load fitted artifacts");
        }
    };
    let model_version = artifacts.model_version().to_string();

    let metrics = PredictorMetrics::new();
    metrics.set_model_info(&model_version, &artifacts.scaler_info.checksum);

    let health_registry = HealthRegistry::new();
    health_registry.mark_loaded(model_version.as_str()).await;

    let predictor = artifacts.into_predictor();
    logger.log_startup(SERVER_VERSION, &model_version);

    let app_state = Arc::new(api::AppState::new(
        predictor,
        health_registry,
        metrics,
        logger.clone(),
    ));

    tokio::select! {
        result = api::serve(config.api_port, app_state) => {
            result.context("API server failed")?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}
