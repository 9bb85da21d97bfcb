//! Scoring-and-decision pipeline

pub mod service;
pub mod threshold;

pub use service::ScoringService;
pub use threshold::ThresholdPolicy;
