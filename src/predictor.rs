//! Fit/predict contracts for pluggable black-box predictors.
//!
//! The hurdle model and the harness only ever see these traits; any learner
//! that satisfies them slots in, which is how the tests substitute
//! deterministic stubs for real training.

use crate::dataset::Dataset;
use thiserror::Error;

/// Errors surfaced by predictor implementations
#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("training failed: {0}")]
    Training(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("feature schema mismatch: fit saw [{fitted}], predict got [{got}]")]
    Schema { fitted: String, got: String },

    #[error("predict called before fit")]
    NotFitted,
}

/// Continuous-response predictor.
pub trait Regressor {
    /// Train on a feature table and a response vector of equal length.
    ///
    /// # Errors
    ///
    /// Returns `PredictorError::Training` if the response length mismatches
    /// the row count or contains non-finite values.
    fn fit(&mut self, features: &Dataset, response: &[f64]) -> Result<(), PredictorError>;

    /// Predict one value per input row.
    ///
    /// # Errors
    ///
    /// Returns `PredictorError::NotFitted` before [`Regressor::fit`], or
    /// `PredictorError::Schema` if the feature columns differ from those
    /// seen at fit time.
    fn predict(&self, features: &Dataset) -> Result<Vec<f64>, PredictorError>;
}

/// Binary predictor: probabilities plus hard labels at a threshold.
pub trait Classifier {
    /// Train on a feature table and {0, 1} labels of equal length.
    ///
    /// # Errors
    ///
    /// Returns `PredictorError::Training` on length mismatch.
    fn fit(&mut self, features: &Dataset, labels: &[u8]) -> Result<(), PredictorError>;

    /// Predicted probability of class 1, one per input row.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Regressor::predict`].
    fn predict_proba(&self, features: &Dataset) -> Result<Vec<f64>, PredictorError>;

    /// Hard {0, 1} labels from the internal probability and the
    /// implementation's configured threshold.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Regressor::predict`].
    fn predict(&self, features: &Dataset) -> Result<Vec<u8>, PredictorError>;
}

/// Validate a continuous response vector against the feature table.
///
/// # Errors
///
/// Returns `PredictorError::Training` on length mismatch or non-finite values.
pub fn check_response(features: &Dataset, response: &[f64]) -> Result<(), PredictorError> {
    if response.len() != features.len() {
        return Err(PredictorError::Training(format!(
            "response length {} does not match {} feature rows",
            response.len(),
            features.len()
        )));
    }
    if let Some(bad) = response.iter().find(|v| !v.is_finite()) {
        return Err(PredictorError::Training(format!(
            "non-finite response value: {bad}"
        )));
    }
    Ok(())
}

/// Validate predict-time columns against the schema captured at fit time.
///
/// # Errors
///
/// Returns `PredictorError::Schema` when the column names or order differ.
pub fn check_schema(fitted: &[String], features: &Dataset) -> Result<(), PredictorError> {
    if fitted != features.columns() {
        return Err(PredictorError::Schema {
            fitted: fitted.join(", "),
            got: features.columns().join(", "),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn features(n: usize) -> Dataset {
        let keys: Vec<String> = (0..n).map(|i| format!("k{i}")).collect();
        let rows: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64]).collect();
        let outcome = vec![0.0; n];
        Dataset::new(vec!["x".to_string()], keys, rows, "y", outcome).unwrap()
    }

    #[test]
    fn test_check_response_length_mismatch() {
        let data = features(3);
        let err = check_response(&data, &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, PredictorError::Training(_)));
    }

    #[test]
    fn test_check_response_non_finite() {
        let data = features(2);
        assert!(check_response(&data, &[1.0, f64::INFINITY]).is_err());
        assert!(check_response(&data, &[1.0, f64::NAN]).is_err());
        assert!(check_response(&data, &[1.0, 2.0]).is_ok());
    }

    #[test]
    fn test_check_schema_mismatch() {
        let data = features(2);
        let err = check_schema(&["other".to_string()], &data).unwrap_err();
        assert!(matches!(err, PredictorError::Schema { .. }));
        assert!(check_schema(&["x".to_string()], &data).is_ok());
    }
}
