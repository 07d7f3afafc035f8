//! Outcome transforms with explicit domains and inverses.
//!
//! Each transform is a pure function over scalars, with slice helpers for
//! whole response vectors. Domain violations surface as `TransformError`
//! rather than silently producing NaN/-inf, since a NaN smuggled into a
//! training response would bias every downstream metric invisibly.

use thiserror::Error;

/// Errors that can occur when applying a transform
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("value {value} outside transform domain: {domain}")]
    Domain { value: f64, domain: &'static str },

    #[error("cannot compute a quantile of an empty slice")]
    EmptyInput,

    #[error("quantile must be in [0, 1], got {0}")]
    InvalidQuantile(f64),
}

/// Identity transform. Domain: all reals; inverse: itself.
#[must_use]
pub const fn identity(x: f64) -> f64 {
    x
}

/// Cap a value at `cap`. Lossy by construction: values above the cap are
/// indistinguishable after the fact, so there is no inverse.
#[must_use]
pub fn winsorize(x: f64, cap: f64) -> f64 {
    x.min(cap)
}

/// Winsorize a whole response vector against one cap.
#[must_use]
pub fn winsorize_all(values: &[f64], cap: f64) -> Vec<f64> {
    values.iter().map(|&x| winsorize(x, cap)).collect()
}

/// ln(1 + x). Domain: x >= -1 (outcomes here are always >= 0, which maps
/// zero-inflation to a point mass at 0 on the transformed scale rather
/// than eliminating it).
///
/// # Errors
///
/// Returns `TransformError::Domain` for x < -1.
pub fn log1p(x: f64) -> Result<f64, TransformError> {
    if x < -1.0 {
        return Err(TransformError::Domain {
            value: x,
            domain: "log1p requires x >= -1",
        });
    }
    Ok(x.ln_1p())
}

/// exp(x) - 1, the exact inverse of [`log1p`]. Domain: all reals.
#[must_use]
pub fn expm1(x: f64) -> f64 {
    x.exp_m1()
}

/// Natural log. Domain: x > 0 strictly; zero outcomes must be filtered
/// out before this is reached (the hurdle's regression stage does exactly
/// that).
///
/// # Errors
///
/// Returns `TransformError::Domain` for x <= 0.
pub fn ln(x: f64) -> Result<f64, TransformError> {
    if x <= 0.0 {
        return Err(TransformError::Domain {
            value: x,
            domain: "ln requires x > 0",
        });
    }
    Ok(x.ln())
}

/// Apply [`log1p`] to every element.
///
/// # Errors
///
/// Returns the first domain violation encountered.
pub fn log1p_all(values: &[f64]) -> Result<Vec<f64>, TransformError> {
    values.iter().map(|&x| log1p(x)).collect()
}

/// Apply [`ln`] to every element.
///
/// # Errors
///
/// Returns the first domain violation encountered.
pub fn ln_all(values: &[f64]) -> Result<Vec<f64>, TransformError> {
    values.iter().map(|&x| ln(x)).collect()
}

/// Nearest-rank quantile of an unsorted slice.
///
/// Used to derive the winsorize cap from the training outcome only; the
/// test outcome never feeds into the cap.
///
/// # Errors
///
/// Returns an error for an empty slice or a quantile outside [0, 1].
#[allow(clippy::cast_precision_loss, clippy::cast_sign_loss, clippy::cast_possible_truncation)]
pub fn quantile(values: &[f64], q: f64) -> Result<f64, TransformError> {
    if values.is_empty() {
        return Err(TransformError::EmptyInput);
    }
    if !(0.0..=1.0).contains(&q) {
        return Err(TransformError::InvalidQuantile(q));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let idx = ((sorted.len() as f64 * q).ceil() as usize).saturating_sub(1);
    Ok(sorted[idx.min(sorted.len() - 1)])
}
