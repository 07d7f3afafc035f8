//! Tabular dataset model: named numeric features, customer keys and one
//! non-negative outcome column.
//!
//! A `Dataset` is immutable after construction. Strategies that need a
//! transformed outcome pass their own response vector to the predictors
//! instead of mutating the shared table, so every strategy sees the same
//! split.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while building or splitting a dataset
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("row {row} has {got} features, schema has {expected} columns")]
    Schema {
        row: usize,
        got: usize,
        expected: usize,
    },

    #[error("outcome for key '{key}' is negative: {value}")]
    NegativeOutcome { key: String, value: f64 },

    #[error("non-finite feature value in row {row}, column '{column}'")]
    NonFiniteFeature { row: usize, column: String },

    #[error("duplicate customer key: '{0}'")]
    DuplicateKey(String),

    #[error("column not found: '{0}'")]
    UnknownColumn(String),

    #[error("row count mismatch: {keys} keys, {rows} rows, {outcomes} outcomes")]
    LengthMismatch {
        keys: usize,
        rows: usize,
        outcomes: usize,
    },

    #[error("test fraction must be in (0, 1), got {0}")]
    InvalidTestFraction(f64),

    #[error("cannot split {rows} rows with test fraction {fraction}")]
    SplitTooSmall { rows: usize, fraction: f64 },

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid numeric value '{value}' in column '{column}'")]
    ParseValue { column: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One customer-period record: a feature vector plus its outcome.
#[derive(Debug, Clone)]
pub struct Observation<'a> {
    /// Stable customer key
    pub key: &'a str,
    /// Feature values in schema order
    pub features: &'a [f64],
    /// Non-negative spend outcome
    pub outcome: f64,
}

/// Immutable feature table with a designated outcome column.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<String>,
    keys: Vec<String>,
    rows: Vec<Vec<f64>>,
    outcome: Vec<f64>,
    outcome_column: String,
}

impl Dataset {
    /// Construct a dataset, validating schema width, key uniqueness,
    /// feature finiteness and outcome non-negativity.
    ///
    /// # Errors
    ///
    /// Returns a `DatasetError` describing the first violated invariant.
    pub fn new(
        columns: Vec<String>,
        keys: Vec<String>,
        rows: Vec<Vec<f64>>,
        outcome_column: &str,
        outcome: Vec<f64>,
    ) -> Result<Self, DatasetError> {
        if keys.len() != rows.len() || rows.len() != outcome.len() {
            return Err(DatasetError::LengthMismatch {
                keys: keys.len(),
                rows: rows.len(),
                outcomes: outcome.len(),
            });
        }

        let mut seen = HashSet::with_capacity(keys.len());
        for key in &keys {
            if !seen.insert(key.as_str()) {
                return Err(DatasetError::DuplicateKey(key.clone()));
            }
        }

        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(DatasetError::Schema {
                    row: i,
                    got: row.len(),
                    expected: columns.len(),
                });
            }
            for (j, value) in row.iter().enumerate() {
                if !value.is_finite() {
                    return Err(DatasetError::NonFiniteFeature {
                        row: i,
                        column: columns[j].clone(),
                    });
                }
            }
        }

        for (key, &value) in keys.iter().zip(&outcome) {
            if !(value >= 0.0) {
                return Err(DatasetError::NegativeOutcome {
                    key: key.clone(),
                    value,
                });
            }
        }

        Ok(Self {
            columns,
            keys,
            rows,
            outcome,
            outcome_column: outcome_column.to_string(),
        })
    }

    /// Load a dataset from a headered CSV file.
    ///
    /// All columns other than `outcome_column` and the optional `key_column`
    /// become numeric features. Without a key column, the row index serves
    /// as the customer key.
    ///
    /// # Errors
    ///
    /// Returns an error on IO/parse failure, a missing column, or any
    /// violated dataset invariant.
    pub fn from_csv(
        path: &Path,
        outcome_column: &str,
        key_column: Option<&str>,
    ) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;

        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        let outcome_idx = headers
            .iter()
            .position(|h| h == outcome_column)
            .ok_or_else(|| DatasetError::UnknownColumn(outcome_column.to_string()))?;
        let key_idx = match key_column {
            Some(name) => Some(
                headers
                    .iter()
                    .position(|h| h == name)
                    .ok_or_else(|| DatasetError::UnknownColumn(name.to_string()))?,
            ),
            None => None,
        };

        let feature_columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != outcome_idx && Some(*i) != key_idx)
            .map(|(i, name)| (i, name.clone()))
            .collect();

        let mut keys = Vec::new();
        let mut rows = Vec::new();
        let mut outcome = Vec::new();

        for (row_idx, record) in reader.records().enumerate() {
            let record = record?;

            let key = key_idx
                .and_then(|i| record.get(i))
                .map_or_else(|| row_idx.to_string(), String::from);
            keys.push(key);

            let mut row = Vec::with_capacity(feature_columns.len());
            for (i, name) in &feature_columns {
                let raw = record.get(*i).unwrap_or("");
                let value: f64 = raw.trim().parse().map_err(|_| DatasetError::ParseValue {
                    column: name.clone(),
                    value: raw.to_string(),
                })?;
                row.push(value);
            }
            rows.push(row);

            let raw = record.get(outcome_idx).unwrap_or("");
            let value: f64 = raw.trim().parse().map_err(|_| DatasetError::ParseValue {
                column: outcome_column.to_string(),
                value: raw.to_string(),
            })?;
            outcome.push(value);
        }

        let columns = feature_columns.into_iter().map(|(_, name)| name).collect();
        Self::new(columns, keys, rows, outcome_column, outcome)
    }

    /// Feature column names in schema order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Name of the designated outcome column.
    #[must_use]
    pub fn outcome_column(&self) -> &str {
        &self.outcome_column
    }

    /// Customer keys, one per row.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Outcome values, one per row.
    #[must_use]
    pub fn outcome(&self) -> &[f64] {
        &self.outcome
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Feature values for one row.
    ///
    /// # Panics
    ///
    /// Panics when `index >= self.len()`.
    #[must_use]
    pub fn row(&self, index: usize) -> &[f64] {
        &self.rows[index]
    }

    /// Iterate rows as [`Observation`] views.
    pub fn observations(&self) -> impl Iterator<Item = Observation<'_>> {
        self.keys
            .iter()
            .zip(&self.rows)
            .zip(&self.outcome)
            .map(|((key, features), &outcome)| Observation {
                key,
                features,
                outcome,
            })
    }

    /// New dataset containing only the given row indices, same schema.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            keys: indices.iter().map(|&i| self.keys[i].clone()).collect(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
            outcome: indices.iter().map(|&i| self.outcome[i]).collect(),
            outcome_column: self.outcome_column.clone(),
        }
    }

    /// Indices of rows whose outcome is strictly positive.
    #[must_use]
    pub fn positive_indices(&self) -> Vec<usize> {
        self.outcome
            .iter()
            .enumerate()
            .filter(|(_, &y)| y > 0.0)
            .map(|(i, _)| i)
            .collect()
    }

    /// Deterministic train/test split with disjoint keys.
    ///
    /// Rows are shuffled with a ChaCha8 generator seeded from `seed`
    /// (Fisher-Yates, same seed gives the same split on every run) and the
    /// first `ceil(n * test_fraction)` shuffled rows become the test set.
    ///
    /// # Errors
    ///
    /// Returns an error if the fraction is outside (0, 1) or either side of
    /// the split would be empty.
    #[allow(clippy::cast_precision_loss, clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn split(&self, test_fraction: f64, seed: u64) -> Result<(Self, Self), DatasetError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(DatasetError::InvalidTestFraction(test_fraction));
        }

        let n = self.len();
        let n_test = ((n as f64) * test_fraction).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(DatasetError::SplitTooSmall {
                rows: n,
                fraction: test_fraction,
            });
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for i in (1..n).rev() {
            let j = (rng.next_u64() % (i as u64 + 1)) as usize;
            indices.swap(i, j);
        }

        let test = self.select(&indices[..n_test]);
        let train = self.select(&indices[n_test..]);
        Ok((train, test))
    }
}
