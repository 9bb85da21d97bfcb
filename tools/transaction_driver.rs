//! Transaction Driver
//!
//! Samples labeled transactions from a CSV reference set, strips the label and
//! sends each one to the scoring service, pacing requests like live traffic.

use anyhow::{Context, Result};
use clap::Parser;
use fraud_scoring_service::config::AppConfig;
use fraud_scoring_service::driver::{
    stop_signal, DriverSettings, HttpScoringClient, ReferenceSet, StopReason, TransactionDriver,
};
use fraud_scoring_service::logging;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "transaction-driver")]
#[command(about = "Replay historical transactions against the fraud scoring service", long_about = None)]
struct Args {
    /// Path to config file [default: config/config.toml, if present]
    #[arg(short, long)]
    config: Option<String>,

    /// Scoring endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// CSV file with labeled reference transactions
    #[arg(long)]
    data: Option<String>,

    /// Number of transactions to send (0 = until Ctrl-C)
    #[arg(short = 'n', long)]
    count: Option<u64>,

    /// Pause between transactions in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Seed for reproducible sampling
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(endpoint) = args.endpoint {
        config.driver.endpoint = endpoint;
    }
    if let Some(data) = args.data {
        config.driver.data_path = data;
    }
    if let Some(count) = args.count {
        config.driver.count = count;
    }
    if let Some(delay_ms) = args.delay_ms {
        config.driver.delay_ms = delay_ms;
    }

    logging::init(&config.logging)?;
    info!("Starting Transaction Driver");

    let driver_config = &config.driver;
    let dataset = ReferenceSet::from_path(&driver_config.data_path, &driver_config.label_column)
        .with_context(|| format!("Failed to load reference set {}", driver_config.data_path))?;
    let client = HttpScoringClient::new(&driver_config.endpoint, driver_config.timeout())?;

    info!(
        endpoint = %client.endpoint(),
        count = driver_config.count,
        delay_ms = driver_config.delay_ms,
        max_consecutive_failures = driver_config.max_consecutive_failures,
        "Configuration loaded"
    );

    let mut driver = TransactionDriver::new(client, dataset, DriverSettings::from(driver_config));
    if let Some(seed) = args.seed {
        driver = driver.with_seed(seed);
    }

    let (handle, stop) = stop_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Stop requested");
            handle.stop();
        }
    });

    let outcome = driver.run(stop).await;
    driver.monitor().print_summary();

    if outcome.stop_reason == StopReason::Aborted {
        warn!(failed = outcome.failed, "Run aborted by scoring failures");
        anyhow::bail!(
            "Scoring service unavailable after {} consecutive failures",
            driver_config.max_consecutive_failures
        );
    }

    Ok(())
}
