//! Sequential, paced replay of sampled transactions against the scoring service

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::DriverConfig;
use crate::driver::client::ScoringClient;
use crate::driver::dataset::ReferenceSet;
use crate::monitor::{Monitor, DEFAULT_HISTORY_CAPACITY};
use crate::types::scoring::Decision;

/// Controls how long a run lasts and how it reacts to failures
#[derive(Debug, Clone)]
pub struct DriverSettings {
    /// Transactions to send; `None` runs until stopped
    pub count: Option<u64>,
    /// Pause between consecutive transactions
    pub delay: Duration,
    /// Abort after this many failed calls in a row (0 = never)
    pub max_consecutive_failures: u32,
}

impl From<&DriverConfig> for DriverSettings {
    fn from(config: &DriverConfig) -> Self {
        Self {
            count: config.count_limit(),
            delay: config.delay(),
            max_consecutive_failures: config.max_consecutive_failures,
        }
    }
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopReason {
    /// The requested number of transactions was sent
    #[default]
    Completed,
    /// The stop signal fired
    Stopped,
    /// Too many scoring calls failed in a row
    Aborted,
}

/// Per-transaction report
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransactionReport {
    pub index: u64,
    pub decision: Decision,
    pub probability: f64,
    pub threshold_used: f64,
}

/// Totals for one run, plus the most recent per-transaction reports
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOutcome {
    pub attempted: u64,
    pub scored: u64,
    pub failed: u64,
    pub stop_reason: StopReason,
    /// Oldest first, bounded by the driver's report capacity
    pub reports: VecDeque<TransactionReport>,
}

impl RunOutcome {
    fn record(&mut self, report: TransactionReport, capacity: usize) {
        if self.reports.len() == capacity {
            self.reports.pop_front();
        }
        self.reports.push_back(report);
    }
}

/// Sender half of the stop signal
#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

/// Receiver half of the stop signal, checked between transactions
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once stop is requested. Never resolves if every handle is dropped.
    pub async fn stopped(&mut self) {
        if self.rx.wait_for(|stopped| *stopped).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

pub fn stop_signal() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopSignal { rx })
}

/// Replays sampled transactions one at a time.
///
/// Exactly one scoring call is in flight at any moment: the driver waits for
/// each response (or failure), then pauses before drawing the next sample.
pub struct TransactionDriver<C> {
    client: C,
    dataset: ReferenceSet,
    settings: DriverSettings,
    rng: StdRng,
    monitor: Monitor,
    report_capacity: usize,
}

impl<C: ScoringClient> TransactionDriver<C> {
    pub fn new(client: C, dataset: ReferenceSet, settings: DriverSettings) -> Self {
        Self {
            client,
            dataset,
            settings,
            rng: StdRng::from_entropy(),
            monitor: Monitor::new(),
            report_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }

    /// Keep at most `capacity` reports in the run outcome
    pub fn with_report_capacity(mut self, capacity: usize) -> Self {
        self.report_capacity = capacity.max(1);
        self
    }

    /// Fix the sampling sequence, for reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run until the count is exhausted, the stop signal fires, or the
    /// failure policy aborts.
    pub async fn run(&mut self, mut stop: StopSignal) -> RunOutcome {
        let Self {
            client,
            dataset,
            settings,
            rng,
            monitor,
            report_capacity,
        } = self;

        let mut outcome = RunOutcome::default();
        let mut consecutive_failures = 0u32;

        info!(
            count = ?settings.count,
            delay_ms = settings.delay.as_millis() as u64,
            reference_set = dataset.len(),
            "Starting transaction stream"
        );

        for (index, transaction) in dataset.samples(rng, settings.count).enumerate() {
            let index = index as u64;

            if index > 0 && !settings.delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(settings.delay) => {}
                    _ = stop.stopped() => {}
                }
            }
            if stop.is_stopped() {
                outcome.stop_reason = StopReason::Stopped;
                break;
            }

            let (request, label) = transaction.strip_label();
            let amount = transaction.features.amount();

            outcome.attempted += 1;
            let started = Instant::now();

            match client.score(&request).await {
                Ok(result) => {
                    consecutive_failures = 0;
                    outcome.scored += 1;

                    info!(
                        index = index,
                        decision = %result.decision,
                        probability = result.probability,
                        threshold = result.threshold_used,
                        "Transaction {}: Model says {} (Prob: {:.4})",
                        index,
                        result.decision,
                        result.probability
                    );

                    monitor.observe(amount, &result, label, started.elapsed());
                    outcome.record(
                        TransactionReport {
                            index,
                            decision: result.decision,
                            probability: result.probability,
                            threshold_used: result.threshold_used,
                        },
                        *report_capacity,
                    );
                }
                Err(e) => {
                    consecutive_failures += 1;
                    outcome.failed += 1;

                    warn!(
                        index = index,
                        error = %e,
                        consecutive_failures = consecutive_failures,
                        "Scoring call failed"
                    );

                    if settings.max_consecutive_failures > 0
                        && consecutive_failures >= settings.max_consecutive_failures
                    {
                        error!(
                            consecutive_failures = consecutive_failures,
                            "Aborting run after repeated scoring failures"
                        );
                        outcome.stop_reason = StopReason::Aborted;
                        break;
                    }
                }
            }
        }

        info!(
            attempted = outcome.attempted,
            scored = outcome.scored,
            failed = outcome.failed,
            stop_reason = ?outcome.stop_reason,
            "Transaction stream finished"
        );

        outcome
    }
}
