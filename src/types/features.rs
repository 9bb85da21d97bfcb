//! Feature vector contract shared by the scoring service and its clients.
//!
//! The model was trained on 31 columns: 28 anonymized principal components,
//! the hour of day, and the scaled amount and time. Every consumer binds
//! values to these names in exactly this order.

use crate::error::ScoringError;

/// Number of features the model expects
pub const FEATURE_COUNT: usize = 31;

/// Position of `scaled_amount`, the only field read by the threshold policy
pub const AMOUNT_INDEX: usize = 29;

/// Column names in the order the model was trained on
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "V1",
    "V2",
    "V3",
    "V4",
    "V5",
    "V6",
    "V7",
    "V8",
    "V9",
    "V10",
    "V11",
    "V12",
    "V13",
    "V14",
    "V15",
    "V16",
    "V17",
    "V18",
    "V19",
    "V20",
    "V21",
    "V22",
    "V23",
    "V24",
    "V25",
    "V26",
    "V27",
    "V28",
    "Hour",
    "scaled_amount",
    "scaled_time",
];

/// A validated, model-ready transaction: exactly 31 finite values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Validate raw values into a feature vector.
    ///
    /// Rejects any length other than 31 rather than truncating or padding.
    pub fn try_from_slice(values: &[f64]) -> Result<Self, ScoringError> {
        let values: [f64; FEATURE_COUNT] =
            values.try_into().map_err(|_| ScoringError::Validation {
                expected: FEATURE_COUNT,
                actual: values.len(),
            })?;

        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(ScoringError::NonFiniteFeature {
                name: FEATURE_NAMES[index],
                index,
            });
        }

        Ok(Self { values })
    }

    /// The `scaled_amount` value
    pub fn amount(&self) -> f64 {
        self.values[AMOUNT_INDEX]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.values.to_vec()
    }

    /// Bind the values to their column names as a single-row frame
    pub fn to_frame(&self) -> FeatureFrame {
        FeatureFrame { row: self.values }
    }
}

/// Single-row table with the 31 named columns in training order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    row: [f64; FEATURE_COUNT],
}

impl FeatureFrame {
    pub fn columns(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }

    pub fn row(&self) -> &[f64] {
        &self.row
    }

    /// Row values as `f32`, the input type of exported tree models
    pub fn row_f32(&self) -> Vec<f32> {
        self.row.iter().map(|&v| v as f32).collect()
    }

    /// Look up a value by column name
    pub fn get(&self, column: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|&name| name == column)
            .map(|index| self.row[index])
    }

    /// Iterate `(column, value)` pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.row.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_values(amount: f64) -> Vec<f64> {
        let mut values = vec![0.0; 28];
        values.extend([12.0, amount, 0.0]);
        values
    }

    #[test]
    fn test_feature_names_layout() {
        assert_eq!(FEATURE_NAMES.len(), FEATURE_COUNT);
        assert_eq!(FEATURE_NAMES[0], "V1");
        assert_eq!(FEATURE_NAMES[27], "V28");
        assert_eq!(FEATURE_NAMES[28], "Hour");
        assert_eq!(FEATURE_NAMES[AMOUNT_INDEX], "scaled_amount");
        assert_eq!(FEATURE_NAMES[30], "scaled_time");
    }

    #[test]
    fn test_rejects_wrong_length() {
        let err = FeatureVector::try_from_slice(&[0.0; 30]).unwrap_err();
        assert_eq!(
            err,
            ScoringError::Validation {
                expected: 31,
                actual: 30
            }
        );

        let err = FeatureVector::try_from_slice(&[0.0; 32]).unwrap_err();
        assert_eq!(
            err,
            ScoringError::Validation {
                expected: 31,
                actual: 32
            }
        );

        assert!(FeatureVector::try_from_slice(&[]).is_err());
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut values = sample_values(6.0);
        values[3] = f64::NAN;
        let err = FeatureVector::try_from_slice(&values).unwrap_err();
        assert_eq!(
            err,
            ScoringError::NonFiniteFeature {
                name: "V4",
                index: 3
            }
        );

        let mut values = sample_values(6.0);
        values[AMOUNT_INDEX] = f64::INFINITY;
        assert!(FeatureVector::try_from_slice(&values).is_err());
    }

    #[test]
    fn test_amount_and_frame_binding() {
        let vector = FeatureVector::try_from_slice(&sample_values(6.0)).unwrap();
        assert_eq!(vector.amount(), 6.0);

        let frame = vector.to_frame();
        assert_eq!(frame.columns().len(), FEATURE_COUNT);
        assert_eq!(frame.get("Hour"), Some(12.0));
        assert_eq!(frame.get("scaled_amount"), Some(6.0));
        assert_eq!(frame.get("Class"), None);
        assert_eq!(frame.iter().nth(29), Some(("scaled_amount", 6.0)));
        assert_eq!(frame.row_f32()[28], 12.0_f32);
    }
}
