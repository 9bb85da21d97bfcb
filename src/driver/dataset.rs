//! Historical reference transactions and random sampling over them

use crate::types::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use crate::types::transaction::{LabeledTransaction, FRAUD_LABEL};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing column '{0}'")]
    MissingColumn(String),

    #[error("Line {line}: invalid value '{value}' in column '{column}'")]
    InvalidValue {
        line: u64,
        column: String,
        value: String,
    },

    #[error("Line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },

    #[error("Reference set is empty")]
    Empty,
}

/// Labeled transactions the driver samples from
#[derive(Debug, Clone)]
pub struct ReferenceSet {
    transactions: Vec<LabeledTransaction>,
}

impl ReferenceSet {
    pub fn new(transactions: Vec<LabeledTransaction>) -> Result<Self, DatasetError> {
        if transactions.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(Self { transactions })
    }

    /// Load a CSV file with the 31 feature columns and a label column
    pub fn from_path<P: AsRef<Path>>(path: P, label_column: &str) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DatasetError::Open {
            path: path.display().to_string(),
            source,
        })?;

        let set = Self::from_reader(file, label_column)?;
        info!(
            path = %path.display(),
            transactions = set.len(),
            frauds = set.fraud_count(),
            "Reference set loaded"
        );
        Ok(set)
    }

    /// Parse CSV from any reader.
    ///
    /// Columns are matched by header name, so their order in the file does not
    /// matter. Extra columns are ignored.
    pub fn from_reader<R: Read>(reader: R, label_column: &str) -> Result<Self, DatasetError> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.clone();

        let column_index = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim() == name)
                .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
        };

        let feature_columns = FEATURE_NAMES
            .iter()
            .map(|&name| column_index(name))
            .collect::<Result<Vec<usize>, _>>()?;
        let label_index = column_index(label_column)?;

        let mut transactions = Vec::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            let field = |index: usize, column: &str| -> Result<f64, DatasetError> {
                let raw = record.get(index).unwrap_or_default().trim();
                raw.parse::<f64>().map_err(|_| DatasetError::InvalidValue {
                    line,
                    column: column.to_string(),
                    value: raw.to_string(),
                })
            };

            let mut values = [0.0; FEATURE_COUNT];
            for (slot, (&index, name)) in values
                .iter_mut()
                .zip(feature_columns.iter().zip(FEATURE_NAMES.iter()))
            {
                *slot = field(index, *name)?;
            }

            let features =
                FeatureVector::try_from_slice(&values).map_err(|e| DatasetError::InvalidRow {
                    line,
                    reason: e.to_string(),
                })?;

            let raw_label = field(label_index, label_column)?;
            let label = if raw_label == 0.0 {
                0
            } else if raw_label == 1.0 {
                FRAUD_LABEL
            } else {
                return Err(DatasetError::InvalidValue {
                    line,
                    column: label_column.to_string(),
                    value: raw_label.to_string(),
                });
            };

            transactions.push(LabeledTransaction::new(features, label));
        }

        Self::new(transactions)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn fraud_count(&self) -> usize {
        self.transactions.iter().filter(|tx| tx.is_fraud()).count()
    }

    pub fn transactions(&self) -> &[LabeledTransaction] {
        &self.transactions
    }

    /// Draw one transaction uniformly, with replacement
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &LabeledTransaction {
        // `new` rejects empty sets, so `choose` always yields
        self.transactions
            .choose(rng)
            .unwrap_or_else(|| &self.transactions[0])
    }

    /// Lazy stream of independent draws; `None` means unbounded
    pub fn samples<'a, R: Rng>(&'a self, rng: &'a mut R, limit: Option<u64>) -> Samples<'a, R> {
        Samples {
            set: self,
            rng,
            remaining: limit,
        }
    }
}

/// Iterator of independent samples from a [`ReferenceSet`]
pub struct Samples<'a, R> {
    set: &'a ReferenceSet,
    rng: &'a mut R,
    remaining: Option<u64>,
}

impl<'a, R: Rng> Iterator for Samples<'a, R> {
    type Item = &'a LabeledTransaction;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }
        Some(self.set.sample(self.rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn csv_fixture(rows: &[(f64, u8)]) -> String {
        let mut header: Vec<String> = vec!["Class".to_string()];
        header.extend(FEATURE_NAMES.iter().rev().map(|n| n.to_string()));
        let mut csv = header.join(",");
        csv.push('\n');

        for (amount, label) in rows {
            let mut fields = vec![label.to_string()];
            for name in FEATURE_NAMES.iter().rev() {
                let value = match *name {
                    "scaled_amount" => *amount,
                    "Hour" => 13.0,
                    _ => 0.5,
                };
                fields.push(value.to_string());
            }
            csv.push_str(&fields.join(","));
            csv.push('\n');
        }
        csv
    }

    #[test]
    fn test_load_binds_columns_by_name() {
        let csv = csv_fixture(&[(6.0, 1), (2.0, 0)]);
        let set = ReferenceSet::from_reader(csv.as_bytes(), "Class").unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.fraud_count(), 1);

        let first = &set.transactions()[0];
        assert!(first.is_fraud());
        assert_eq!(first.features.amount(), 6.0);
        assert_eq!(first.features.as_slice()[28], 13.0);
        assert_eq!(first.features.as_slice().len(), FEATURE_COUNT);
    }

    #[test]
    fn test_missing_feature_column() {
        let csv = "V1,V2,Class\n0.1,0.2,0\n";
        let err = ReferenceSet::from_reader(csv.as_bytes(), "Class").unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn(ref c) if c == "V3"));
    }

    #[test]
    fn test_missing_label_column() {
        let csv = csv_fixture(&[(1.0, 0)]);
        let err = ReferenceSet::from_reader(csv.as_bytes(), "is_fraud").unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn(ref c) if c == "is_fraud"));
    }

    #[test]
    fn test_invalid_value() {
        let csv = csv_fixture(&[(1.0, 0)]).replace(",13,", ",noon,");
        let err = ReferenceSet::from_reader(csv.as_bytes(), "Class").unwrap_err();
        assert!(matches!(err, DatasetError::InvalidValue { ref column, .. } if column == "Hour"));
    }

    #[test]
    fn test_label_must_be_zero_or_one() {
        for bad in ["2", "-1", "nan", "0.5"] {
            let csv = csv_fixture(&[(1.0, 0)]).replace("\n0,", &format!("\n{},", bad));
            let err = ReferenceSet::from_reader(csv.as_bytes(), "Class").unwrap_err();
            assert!(
                matches!(err, DatasetError::InvalidValue { ref column, .. } if column == "Class"),
                "label {bad} accepted"
            );
        }
    }

    #[test]
    fn test_float_formatted_labels_accepted() {
        let csv = csv_fixture(&[(1.0, 0), (2.0, 1)])
            .replace("\n0,", "\n0.0,")
            .replace("\n1,", "\n1.0,");
        let set = ReferenceSet::from_reader(csv.as_bytes(), "Class").unwrap();
        assert_eq!(set.fraud_count(), 1);
    }

    #[test]
    fn test_empty_set_rejected() {
        let csv = csv_fixture(&[]);
        let err = ReferenceSet::from_reader(csv.as_bytes(), "Class").unwrap_err();
        assert!(matches!(err, DatasetError::Empty));
    }

    #[test]
    fn test_bounded_samples() {
        let csv = csv_fixture(&[(6.0, 1), (2.0, 0), (3.0, 0)]);
        let set = ReferenceSet::from_reader(csv.as_bytes(), "Class").unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        assert_eq!(set.samples(&mut rng, Some(5)).count(), 5);
        assert_eq!(set.samples(&mut rng, Some(0)).count(), 0);
    }

    #[test]
    fn test_unbounded_samples_draw_with_replacement() {
        let csv = csv_fixture(&[(6.0, 1), (2.0, 0)]);
        let set = ReferenceSet::from_reader(csv.as_bytes(), "Class").unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        // More draws than rows is only possible with replacement
        let drawn: Vec<_> = set.samples(&mut rng, None).take(50).collect();
        assert_eq!(drawn.len(), 50);
        assert!(drawn.iter().any(|tx| tx.is_fraud()));
        assert!(drawn.iter().any(|tx| !tx.is_fraud()));
    }
}
