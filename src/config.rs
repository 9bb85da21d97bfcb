//! Configuration management for the scoring service and transaction driver

use crate::scoring::threshold::ThresholdPolicy;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat, FileSourceFile};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub threshold: ThresholdPolicy,
    pub driver: DriverConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind_addr: String,
    /// Upper bound for handling one request
    pub request_timeout_secs: u64,
    /// Maximum accepted request body size
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            request_timeout_secs: 10,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the ONNX model file
    pub path: String,
    /// Name reported in logs and health checks
    pub name: String,
    /// Number of threads for ONNX inference (default: 1)
    pub onnx_threads: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: "models/fraud_model.onnx".to_string(),
            name: "fraud_model".to_string(),
            onnx_threads: 1,
        }
    }
}

/// Transaction driver configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Scoring endpoint URL
    pub endpoint: String,
    /// CSV file with the historical reference transactions
    pub data_path: String,
    /// Ground-truth column stripped before sending
    pub label_column: String,
    /// Transactions per run (0 = run until stopped)
    pub count: u64,
    /// Pause between transactions
    pub delay_ms: u64,
    /// Timeout for one scoring call
    pub timeout_ms: u64,
    /// Abort after this many failed calls in a row (0 = never abort)
    pub max_consecutive_failures: u32,
}

impl DriverConfig {
    pub fn count_limit(&self) -> Option<u64> {
        (self.count > 0).then_some(self.count)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/predict".to_string(),
            data_path: "test_data.csv".to_string(),
            label_column: "Class".to_string(),
            count: 100,
            delay_ms: 1000,
            timeout_ms: 5000,
            max_consecutive_failures: 3,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Load configuration from an explicitly chosen file, or from
    /// [`DEFAULT_CONFIG_PATH`] when none is given.
    ///
    /// Only the default file may be absent; a path the caller names must exist.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::build(File::from(Path::new(DEFAULT_CONFIG_PATH)).required(false)),
        }
    }

    /// Load configuration from a specific path, which must exist.
    ///
    /// `FRAUD__SECTION__KEY` environment variables override file values.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        Self::build(File::from(path).required(true))
    }

    fn build(file: File<FileSourceFile, FileFormat>) -> Result<Self> {
        let config = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("FRAUD").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        self.threshold.validate()?;

        if self.model.onnx_threads == 0 {
            anyhow::bail!("model.onnx_threads must be at least 1");
        }
        if self.server.request_timeout_secs == 0 {
            anyhow::bail!("server.request_timeout_secs must be at least 1");
        }
        if self.driver.timeout_ms == 0 {
            anyhow::bail!("driver.timeout_ms must be at least 1");
        }
        Ok(())
    }
}
