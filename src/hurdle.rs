//! Two-stage hurdle model: a purchase/no-purchase classifier gating a
//! log-scale magnitude regression.
//!
//! The regression stage only ever trains on rows with outcome > 0 (natural
//! log is undefined at zero), while the classifier trains on every row. At
//! predict time the regression runs on all rows and the classifier's hard
//! 0/1 indicator is applied multiplicatively afterward - a gate, not a
//! blend: a row the classifier rejects predicts exactly 0 no matter what
//! magnitude the regression produced.

use crate::dataset::Dataset;
use crate::predictor::{Classifier, PredictorError, Regressor};
use crate::smearing::{smearing_factor, SmearingError};
use crate::transform;
use thiserror::Error;

/// Errors from hurdle fitting, correction, and prediction
#[derive(Error, Debug)]
pub enum HurdleError {
    #[error("model must be fitted first (state is {0:?})")]
    NotFitted(HurdleState),

    #[error("no rows with outcome > 0: the regression stage has nothing to learn from")]
    InsufficientData,

    #[error(transparent)]
    Predictor(#[from] PredictorError),

    #[error(transparent)]
    Smearing(#[from] SmearingError),

    #[error(transparent)]
    Transform(#[from] transform::TransformError),
}

/// Lifecycle of a hurdle model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HurdleState {
    /// Constructed, neither stage trained
    Unfitted,
    /// Both stages trained, no smearing factor
    Fitted,
    /// Fitted plus a stored smearing factor
    Corrected,
}

/// Composite two-stage estimator over pluggable predictor stages.
pub struct HurdleModel<C: Classifier, R: Regressor> {
    classifier: C,
    regressor: R,
    state: HurdleState,
    smearing: Option<f64>,
}

impl<C: Classifier, R: Regressor> HurdleModel<C, R> {
    /// Wrap a classification stage and a regression stage.
    #[must_use]
    pub const fn new(classifier: C, regressor: R) -> Self {
        Self {
            classifier,
            regressor,
            state: HurdleState::Unfitted,
            smearing: None,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> HurdleState {
        self.state
    }

    /// Stored smearing factor, present only in the Corrected state.
    #[must_use]
    pub const fn smearing(&self) -> Option<f64> {
        self.smearing
    }

    /// Fit both stages on the training set.
    ///
    /// The classifier trains on the full set with the derived binary label
    /// `outcome > 0`; the regressor trains on the positive subset under
    /// natural log. Refitting replaces all prior state, including any
    /// smearing factor.
    ///
    /// # Errors
    ///
    /// `HurdleError::InsufficientData` when no row has a positive outcome
    /// (in which case neither stage is retrained and any previously fitted
    /// model is left intact); predictor failures propagate as
    /// `HurdleError::Predictor` and leave the model `Unfitted`.
    pub fn fit(&mut self, train: &Dataset) -> Result<(), HurdleError> {
        let positive = train.positive_indices();
        if positive.is_empty() {
            return Err(HurdleError::InsufficientData);
        }
        let subset = train.select(&positive);
        let log_outcome = transform::ln_all(subset.outcome())?;

        // Once either stage retrains, the model is all-new or nothing:
        // a stage failure mid-fit must never leave a servable mix of old
        // and new stages.
        self.state = HurdleState::Unfitted;
        self.smearing = None;

        let labels: Vec<u8> = train.outcome().iter().map(|&y| u8::from(y > 0.0)).collect();
        self.classifier.fit(train, &labels)?;
        self.regressor.fit(&subset, &log_outcome)?;

        self.state = HurdleState::Fitted;
        Ok(())
    }

    /// Compute and store the smearing factor from training residuals.
    ///
    /// Must be handed the same training set the stages were fit on; the
    /// factor comes from in-sample residuals on the positive subset, never
    /// from held-out data.
    ///
    /// # Errors
    ///
    /// `HurdleError::NotFitted` before [`HurdleModel::fit`];
    /// `HurdleError::Smearing` when the positive subset has fewer than 2
    /// rows.
    pub fn correct(&mut self, train: &Dataset) -> Result<f64, HurdleError> {
        if self.state == HurdleState::Unfitted {
            return Err(HurdleError::NotFitted(self.state));
        }

        let positive = train.positive_indices();
        if positive.is_empty() {
            return Err(HurdleError::InsufficientData);
        }
        let subset = train.select(&positive);
        let observed_log = transform::ln_all(subset.outcome())?;
        let predicted_log = self.regressor.predict(&subset)?;

        let factor = smearing_factor(&observed_log, &predicted_log)?;
        self.smearing = Some(factor);
        self.state = HurdleState::Corrected;
        Ok(factor)
    }

    /// Predict expected spend for every row.
    ///
    /// Returns `indicator * exp(regression) * smearing_factor`, where the
    /// factor is 1 until [`HurdleModel::correct`] has run. Every prediction
    /// is non-negative, and gated rows are exactly 0.
    ///
    /// # Errors
    ///
    /// `HurdleError::NotFitted` before [`HurdleModel::fit`]; stage
    /// prediction failures propagate.
    pub fn predict(&self, test: &Dataset) -> Result<Vec<f64>, HurdleError> {
        if self.state == HurdleState::Unfitted {
            return Err(HurdleError::NotFitted(self.state));
        }

        let indicators = self.classifier.predict(test)?;
        let log_magnitude = self.regressor.predict(test)?;
        let factor = self.smearing.unwrap_or(1.0);

        Ok(indicators
            .iter()
            .zip(&log_magnitude)
            .map(|(&gate, &log_m)| {
                if gate == 0 {
                    0.0
                } else {
                    log_m.exp() * factor
                }
            })
            .collect())
    }

    /// Hard purchase indicators from the classification stage alone.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`HurdleModel::predict`].
    pub fn predict_indicator(&self, test: &Dataset) -> Result<Vec<u8>, HurdleError> {
        if self.state == HurdleState::Unfitted {
            return Err(HurdleError::NotFitted(self.state));
        }
        Ok(self.classifier.predict(test)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::predictor::check_schema;

    /// Stub classifier returning a fixed label pattern (row index parity or
    /// constant), independent of features.
    struct StubClassifier {
        fitted: bool,
        label_for: fn(usize) -> u8,
    }

    impl Classifier for StubClassifier {
        fn fit(&mut self, _features: &Dataset, _labels: &[u8]) -> Result<(), PredictorError> {
            self.fitted = true;
            Ok(())
        }

        fn predict_proba(&self, features: &Dataset) -> Result<Vec<f64>, PredictorError> {
            if !self.fitted {
                return Err(PredictorError::NotFitted);
            }
            Ok((0..features.len())
                .map(|i| f64::from((self.label_for)(i)))
                .collect())
        }

        fn predict(&self, features: &Dataset) -> Result<Vec<u8>, PredictorError> {
            if !self.fitted {
                return Err(PredictorError::NotFitted);
            }
            Ok((0..features.len()).map(self.label_for).collect())
        }
    }

    /// Stub regressor predicting a constant, remembering what it was fit on.
    /// Flipping `fail_fit` makes every subsequent fit call error.
    struct StubRegressor {
        constant: f64,
        schema: Option<Vec<String>>,
        fit_response: Vec<f64>,
        fail_fit: bool,
    }

    impl StubRegressor {
        fn new(constant: f64) -> Self {
            Self {
                constant,
                schema: None,
                fit_response: Vec::new(),
                fail_fit: false,
            }
        }
    }

    impl Regressor for StubRegressor {
        fn fit(&mut self, features: &Dataset, response: &[f64]) -> Result<(), PredictorError> {
            if self.fail_fit {
                return Err(PredictorError::Training("singular system".to_string()));
            }
            self.schema = Some(features.columns().to_vec());
            self.fit_response = response.to_vec();
            Ok(())
        }

        fn predict(&self, features: &Dataset) -> Result<Vec<f64>, PredictorError> {
            let schema = self.schema.as_ref().ok_or(PredictorError::NotFitted)?;
            check_schema(schema, features)?;
            Ok(vec![self.constant; features.len()])
        }
    }

    fn zero_inflated_dataset(n: usize) -> Dataset {
        // even rows: zero outcome; odd rows: exp(1 + i/n)
        let cols = vec!["x".to_string()];
        let keys: Vec<String> = (0..n).map(|i| format!("c{i}")).collect();
        let rows: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64]).collect();
        let outcome: Vec<f64> = (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    0.0
                } else {
                    (1.0 + i as f64 / n as f64).exp()
                }
            })
            .collect();
        Dataset::new(cols, keys, rows, "spend", outcome).unwrap()
    }

    fn stub_model(label_for: fn(usize) -> u8, constant: f64) -> HurdleModel<StubClassifier, StubRegressor> {
        HurdleModel::new(
            StubClassifier {
                fitted: false,
                label_for,
            },
            StubRegressor::new(constant),
        )
    }

    #[test]
    fn test_predict_before_fit_is_illegal() {
        let data = zero_inflated_dataset(10);
        let model = stub_model(|_| 1, 0.0);
        assert!(matches!(
            model.predict(&data),
            Err(HurdleError::NotFitted(HurdleState::Unfitted))
        ));
    }

    #[test]
    fn test_correct_before_fit_is_illegal() {
        let data = zero_inflated_dataset(10);
        let mut model = stub_model(|_| 1, 0.0);
        assert!(matches!(
            model.correct(&data),
            Err(HurdleError::NotFitted(HurdleState::Unfitted))
        ));
    }

    #[test]
    fn test_state_transitions() {
        let data = zero_inflated_dataset(10);
        let mut model = stub_model(|_| 1, 1.0);
        assert_eq!(model.state(), HurdleState::Unfitted);

        model.fit(&data).unwrap();
        assert_eq!(model.state(), HurdleState::Fitted);
        assert_eq!(model.smearing(), None);

        model.correct(&data).unwrap();
        assert_eq!(model.state(), HurdleState::Corrected);
        assert!(model.smearing().unwrap() > 0.0);
    }

    #[test]
    fn test_refit_clears_correction() {
        let data = zero_inflated_dataset(10);
        let mut model = stub_model(|_| 1, 1.0);
        model.fit(&data).unwrap();
        model.correct(&data).unwrap();

        model.fit(&data).unwrap();
        assert_eq!(model.state(), HurdleState::Fitted);
        assert_eq!(model.smearing(), None);
    }

    #[test]
    fn test_regression_stage_sees_only_positive_log_outcomes() {
        let data = zero_inflated_dataset(10);
        let mut model = stub_model(|_| 1, 0.0);
        model.fit(&data).unwrap();

        // 5 odd rows, all responses are finite logs of positive outcomes
        assert_eq!(model.regressor.fit_response.len(), 5);
        assert!(model.regressor.fit_response.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_all_zero_outcomes_is_insufficient_data() {
        let cols = vec!["x".to_string()];
        let keys = vec!["a".to_string(), "b".to_string()];
        let rows = vec![vec![1.0], vec![2.0]];
        let data = Dataset::new(cols, keys, rows, "spend", vec![0.0, 0.0]).unwrap();

        let mut model = stub_model(|_| 1, 0.0);
        assert!(matches!(
            model.fit(&data),
            Err(HurdleError::InsufficientData)
        ));
    }

    #[test]
    fn test_refit_on_all_zero_data_leaves_prior_model_intact() {
        let data = zero_inflated_dataset(10);
        let mut model = stub_model(|_| 1, 1.0);
        model.fit(&data).unwrap();
        let factor = model.correct(&data).unwrap();
        let before = model.predict(&data).unwrap();

        let cols = vec!["x".to_string()];
        let keys = vec!["a".to_string(), "b".to_string()];
        let rows = vec![vec![1.0], vec![2.0]];
        let degenerate = Dataset::new(cols, keys, rows, "spend", vec![0.0, 0.0]).unwrap();

        // fails fast, before either stage retrains
        assert!(matches!(
            model.fit(&degenerate),
            Err(HurdleError::InsufficientData)
        ));
        assert_eq!(model.state(), HurdleState::Corrected);
        assert_eq!(model.smearing(), Some(factor));
        assert_eq!(model.predict(&data).unwrap(), before);
    }

    #[test]
    fn test_stage_failure_during_refit_downgrades_to_unfitted() {
        let data = zero_inflated_dataset(10);
        let mut model = stub_model(|_| 1, 1.0);
        model.fit(&data).unwrap();
        model.correct(&data).unwrap();

        // the classifier has already retrained when the regression stage
        // errors, so the half-new model must refuse to serve
        model.regressor.fail_fit = true;
        assert!(matches!(
            model.fit(&data),
            Err(HurdleError::Predictor(PredictorError::Training(_)))
        ));
        assert_eq!(model.state(), HurdleState::Unfitted);
        assert_eq!(model.smearing(), None);
        assert!(matches!(
            model.predict(&data),
            Err(HurdleError::NotFitted(HurdleState::Unfitted))
        ));
    }

    #[test]
    fn test_gate_forces_exact_zero() {
        let data = zero_inflated_dataset(20);
        // classifier gates out even rows; regression predicts a huge magnitude
        let mut model = stub_model(|i| u8::from(i % 2 == 1), 50.0);
        model.fit(&data).unwrap();

        let preds = model.predict(&data).unwrap();
        let indicators = model.predict_indicator(&data).unwrap();
        for (p, g) in preds.iter().zip(&indicators) {
            if *g == 0 {
                assert_eq!(*p, 0.0);
            } else {
                assert!(*p > 0.0);
            }
        }
    }

    #[test]
    fn test_predictions_non_negative() {
        let data = zero_inflated_dataset(20);
        let mut model = stub_model(|i| u8::from(i % 3 == 0), -4.0);
        model.fit(&data).unwrap();
        assert!(model.predict(&data).unwrap().iter().all(|&p| p >= 0.0));
    }

    #[test]
    fn test_correction_scales_passed_rows() {
        let data = zero_inflated_dataset(20);
        let mut model = stub_model(|_| 1, 1.5);
        model.fit(&data).unwrap();

        let uncorrected = model.predict(&data).unwrap();
        let factor = model.correct(&data).unwrap();
        let corrected = model.predict(&data).unwrap();

        for (u, c) in uncorrected.iter().zip(&corrected) {
            assert!((c - u * factor).abs() < 1e-12);
        }
    }

    #[test]
    fn test_correct_requires_two_positive_rows() {
        let cols = vec!["x".to_string()];
        let keys = vec!["a".to_string(), "b".to_string()];
        let rows = vec![vec![1.0], vec![2.0]];
        let data = Dataset::new(cols, keys, rows, "spend", vec![0.0, 5.0]).unwrap();

        let mut model = stub_model(|_| 1, 1.0);
        model.fit(&data).unwrap();
        assert!(matches!(
            model.correct(&data),
            Err(HurdleError::Smearing(SmearingError::InsufficientData(1)))
        ));
    }
}
