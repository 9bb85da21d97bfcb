//! Fraud Scoring Service Library
//!
//! Scores single transactions with a pre-trained classifier and turns the
//! fraud probability into an ALLOW/BLOCK decision using an amount-sensitive
//! threshold. Includes a transaction driver that replays historical data
//! against the service as a paced live stream.

pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod scoring;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use error::ScoringError;
pub use models::{FraudModel, OnnxModel};
pub use monitor::Monitor;
pub use scoring::{ScoringService, ThresholdPolicy};
pub use types::{
    features::FeatureVector,
    scoring::{Decision, ScoringResult},
};
