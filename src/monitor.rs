//! Outcome tracking for a stream of scored transactions.
//!
//! The monitor sits outside the scoring boundary: it is the only place where
//! a decision meets the ground-truth label.

use std::collections::VecDeque;
use std::time::Duration;
use tracing::info;

use crate::types::scoring::ScoringResult;
use crate::types::transaction::HistoricalLogEntry;

/// Entries kept in the history before the oldest are dropped
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Rows of the live log shown with the session summary
pub const RECENT_LOG_ROWS: usize = 10;

/// Latency samples kept for percentile estimates
const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Accumulated results of a monitoring session
#[derive(Debug)]
pub struct Monitor {
    /// Frauds blocked (true-positive BLOCKs)
    frauds_caught: u64,
    /// Sum of |amount| over true-positive BLOCKs
    money_saved: f64,
    allowed: u64,
    blocked: u64,
    /// BLOCKs on normal transactions
    false_alarms: u64,
    /// ALLOWs on fraudulent transactions
    missed_frauds: u64,
    /// Newest entry at the back
    history: VecDeque<HistoricalLogEntry>,
    history_capacity: usize,
    /// Scoring call latencies (in microseconds)
    latencies: Vec<u64>,
}

impl Monitor {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(history_capacity: usize) -> Self {
        Self {
            frauds_caught: 0,
            money_saved: 0.0,
            allowed: 0,
            blocked: 0,
            false_alarms: 0,
            missed_frauds: 0,
            history: VecDeque::with_capacity(history_capacity.min(DEFAULT_HISTORY_CAPACITY)),
            history_capacity: history_capacity.max(1),
            latencies: Vec::with_capacity(1000),
        }
    }

    /// Record one scored transaction together with its known label
    pub fn observe(
        &mut self,
        amount: f64,
        result: &ScoringResult,
        ground_truth_label: u8,
        latency: Duration,
    ) -> &HistoricalLogEntry {
        let entry = HistoricalLogEntry::new(amount, result, ground_truth_label);
        let is_fraud = ground_truth_label == crate::types::transaction::FRAUD_LABEL;

        match (result.decision.is_block(), is_fraud) {
            (true, true) => {
                self.blocked += 1;
                self.frauds_caught += 1;
                self.money_saved += amount.abs();
            }
            (true, false) => {
                self.blocked += 1;
                self.false_alarms += 1;
            }
            (false, true) => {
                self.allowed += 1;
                self.missed_frauds += 1;
            }
            (false, false) => self.allowed += 1,
        }

        self.latencies.push(latency.as_micros() as u64);
        if self.latencies.len() > MAX_LATENCY_SAMPLES {
            self.latencies.drain(0..MAX_LATENCY_SAMPLES / 2);
        }

        if self.history.len() == self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(entry);
        &self.history[self.history.len() - 1]
    }

    pub fn frauds_caught(&self) -> u64 {
        self.frauds_caught
    }

    pub fn money_saved(&self) -> f64 {
        self.money_saved
    }

    pub fn observed(&self) -> u64 {
        self.allowed + self.blocked
    }

    /// Up to `n` most recent entries, newest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &HistoricalLogEntry> {
        self.history.iter().rev().take(n)
    }

    /// Recent entries rendered as log rows, newest first
    pub fn recent_log_lines(&self, n: usize) -> Vec<String> {
        self.recent(n)
            .map(|entry| {
                format!(
                    "{} | amount {:>9.2} | prob {:.4} | threshold {:.2} | {:<5} | label {}",
                    entry.timestamp.format("%H:%M:%S"),
                    entry.amount,
                    entry.probability,
                    entry.threshold_used,
                    entry.action,
                    entry.ground_truth_label
                )
            })
            .collect()
    }

    /// Retained history in insertion order
    pub fn history(&self) -> impl Iterator<Item = &HistoricalLogEntry> {
        self.history.iter()
    }

    pub fn summary(&self) -> MonitorSummary {
        let observed = self.observed();
        let ratio = |num: u64, den: u64| if den > 0 { num as f64 / den as f64 } else { 0.0 };

        MonitorSummary {
            observed,
            allowed: self.allowed,
            blocked: self.blocked,
            frauds_caught: self.frauds_caught,
            false_alarms: self.false_alarms,
            missed_frauds: self.missed_frauds,
            money_saved: self.money_saved,
            block_rate: ratio(self.blocked, observed),
            precision: ratio(self.frauds_caught, self.blocked),
            recall: ratio(self.frauds_caught, self.frauds_caught + self.missed_frauds),
            latency: LatencyStats::from_samples(&self.latencies),
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let s = self.summary();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║              TRANSACTION DRIVER - SESSION SUMMARY            ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Transactions Scored: {:>8}  │  Block Rate: {:>6.1}%        ║",
            s.observed,
            s.block_rate * 100.0
        );
        info!(
            "║ Allowed: {:>8}  Blocked: {:>8}                           ║",
            s.allowed, s.blocked
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Frauds Blocked: {:>6}  False Alarms: {:>6}  Missed: {:>6} ║",
            s.frauds_caught, s.false_alarms, s.missed_frauds
        );
        info!(
            "║ Money Saved (scaled): {:>12.2}                           ║",
            s.money_saved
        );
        info!(
            "║ Precision: {:>5.1}%  Recall: {:>5.1}%                          ║",
            s.precision * 100.0,
            s.recall * 100.0
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Latency (μs): mean={:>6} p50={:>6} p95={:>6} p99={:>6}     ║",
            s.latency.mean_us, s.latency.p50_us, s.latency.p95_us, s.latency.p99_us
        );
        info!("╚══════════════════════════════════════════════════════════════╝");

        let lines = self.recent_log_lines(RECENT_LOG_ROWS);
        if !lines.is_empty() {
            info!("Live transaction log (newest first):");
            for line in lines {
                info!("  {}", line);
            }
        }
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate view of a session
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSummary {
    pub observed: u64,
    pub allowed: u64,
    pub blocked: u64,
    pub frauds_caught: u64,
    pub false_alarms: u64,
    pub missed_frauds: u64,
    pub money_saved: f64,
    pub block_rate: f64,
    /// Share of BLOCKs that were real fraud
    pub precision: f64,
    /// Share of observed frauds that were blocked
    pub recall: f64,
    pub latency: LatencyStats,
}

/// Scoring call latency statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

impl LatencyStats {
    fn from_samples(samples: &[u64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        Self {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: sorted[count - 1],
        }
    }
}
