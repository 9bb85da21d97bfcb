//! Type definitions for the scoring pipeline

pub mod features;
pub mod scoring;
pub mod transaction;

pub use features::{FeatureFrame, FeatureVector, AMOUNT_INDEX, FEATURE_COUNT, FEATURE_NAMES};
pub use scoring::{Decision, ErrorDetail, PredictRequest, ScoringResult};
pub use transaction::{HistoricalLogEntry, LabeledTransaction};
