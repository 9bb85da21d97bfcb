//! Transaction driver: replays historical transactions as a live stream

pub mod client;
pub mod dataset;
pub mod runner;

pub use client::{HttpScoringClient, LocalScoringClient, ScoringClient, TransportError};
pub use dataset::{DatasetError, ReferenceSet};
pub use runner::{
    stop_signal, DriverSettings, RunOutcome, StopHandle, StopReason, StopSignal,
    TransactionDriver, TransactionReport,
};
