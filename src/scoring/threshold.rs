//! Amount-sensitive decision threshold.
//!
//! Large transactions are screened with a lower (stricter) blocking bar;
//! small ones use a higher bar to limit customer friction.

use crate::types::scoring::Decision;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Two-tier threshold policy keyed on `scaled_amount`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdPolicy {
    /// Amounts strictly above this use `high_value_threshold`
    pub amount_cutoff: f64,
    /// Threshold for high-value transactions
    pub high_value_threshold: f64,
    /// Threshold for everything else
    pub standard_threshold: f64,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            amount_cutoff: 5.0,
            high_value_threshold: 0.25,
            standard_threshold: 0.55,
        }
    }
}

impl ThresholdPolicy {
    /// Threshold for a given scaled amount. The cutoff itself is not high-value.
    pub fn threshold_for(&self, amount: f64) -> f64 {
        if amount > self.amount_cutoff {
            self.high_value_threshold
        } else {
            self.standard_threshold
        }
    }

    /// Returns the threshold applied and the resulting decision
    pub fn decide(&self, probability: f64, amount: f64) -> (f64, Decision) {
        let threshold = self.threshold_for(amount);
        (threshold, Decision::from_probability(probability, threshold))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.amount_cutoff.is_finite() {
            anyhow::bail!("threshold.amount_cutoff must be finite");
        }
        for (name, value) in [
            ("high_value_threshold", self.high_value_threshold),
            ("standard_threshold", self.standard_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("threshold.{} must be within [0, 1], got {}", name, value);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers() {
        let policy = ThresholdPolicy::default();
        assert_eq!(policy.threshold_for(10.0), 0.25);
        assert_eq!(policy.threshold_for(1.0), 0.55);
        assert_eq!(policy.threshold_for(-3.0), 0.55);
    }

    #[test]
    fn test_cutoff_is_exclusive() {
        let policy = ThresholdPolicy::default();
        assert_eq!(policy.threshold_for(5.0), 0.55);
        assert_eq!(policy.threshold_for(5.000001), 0.25);
    }

    #[test]
    fn test_decide() {
        let policy = ThresholdPolicy::default();
        assert_eq!(policy.decide(0.30, 6.0), (0.25, Decision::Block));
        assert_eq!(policy.decide(0.30, 2.0), (0.55, Decision::Allow));
        assert_eq!(policy.decide(0.55, 5.0), (0.55, Decision::Block));
    }

    #[test]
    fn test_validate() {
        assert!(ThresholdPolicy::default().validate().is_ok());

        let policy = ThresholdPolicy {
            standard_threshold: -0.1,
            ..ThresholdPolicy::default()
        };
        assert!(policy.validate().is_err());

        let policy = ThresholdPolicy {
            amount_cutoff: f64::NAN,
            ..ThresholdPolicy::default()
        };
        assert!(policy.validate().is_err());
    }
}
