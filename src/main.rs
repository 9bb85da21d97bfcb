//! Fraud Scoring Service - Main Entry Point
//!
//! Loads the model artifact once and serves `POST /predict` over HTTP.

use anyhow::{Context, Result};
use fraud_scoring_service::{
    config::AppConfig, logging, models::OnnxModel, scoring::ScoringService, server,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var("FRAUD_CONFIG").ok();
    let config = AppConfig::load(config_path.as_deref())?;

    logging::init(&config.logging)?;

    info!("Starting Fraud Scoring Service");
    info!(
        "Threshold policy: amount > {:.2} uses {:.2}, otherwise {:.2}",
        config.threshold.amount_cutoff,
        config.threshold.high_value_threshold,
        config.threshold.standard_threshold
    );

    let model = OnnxModel::load(&config.model)
        .with_context(|| format!("Failed to load model artifact {}", config.model.path))?;
    let service = ScoringService::new(Arc::new(model), config.threshold);
    info!(model = %service.model_name(), "Scoring service initialized");

    server::serve(&config.server, service).await
}
