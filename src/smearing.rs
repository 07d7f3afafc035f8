//! Duan's smearing estimator for log re-transformation bias.
//!
//! Exponentiating a log-scale prediction systematically underestimates the
//! conditional mean (Jensen's inequality). Duan's correction multiplies the
//! re-transformed prediction by the mean of exponentiated in-sample
//! residuals, estimating `E[exp(eps)]` without assuming a residual
//! distribution.
//!
//! One global factor is a deliberate tradeoff: under heteroscedastic
//! residuals it under- or over-corrects in different regions of feature
//! space. A locally weighted correction would address that; this module
//! does not.

use thiserror::Error;

/// Errors from smearing-factor computation
#[derive(Error, Debug)]
pub enum SmearingError {
    #[error("need at least 2 residuals to estimate a smearing factor, got {0}")]
    InsufficientData(usize),

    #[error("observed/predicted length mismatch: {observed} vs {predicted}")]
    LengthMismatch { observed: usize, predicted: usize },
}

/// Compute Duan's smearing factor from in-sample log-scale pairs.
///
/// Both slices must come from the training subset the regression stage was
/// fit on; feeding held-out data here would leak it into the correction.
/// The result is strictly positive (a mean of exponentials) but not
/// necessarily >= 1.
///
/// # Errors
///
/// Returns an error on length mismatch or fewer than 2 residuals. Failing
/// loudly rather than defaulting to 1.0 keeps an undertrained regression
/// stage from silently passing as "corrected".
#[allow(clippy::cast_precision_loss)]
pub fn smearing_factor(
    observed_log: &[f64],
    predicted_log: &[f64],
) -> Result<f64, SmearingError> {
    if observed_log.len() != predicted_log.len() {
        return Err(SmearingError::LengthMismatch {
            observed: observed_log.len(),
            predicted: predicted_log.len(),
        });
    }
    if observed_log.len() < 2 {
        return Err(SmearingError::InsufficientData(observed_log.len()));
    }

    let sum: f64 = observed_log
        .iter()
        .zip(predicted_log)
        .map(|(obs, pred)| (obs - pred).exp())
        .sum();
    Ok(sum / observed_log.len() as f64)
}
