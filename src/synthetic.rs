//! Seeded synthetic zero-inflated spend data for demos, tests and benches.
//!
//! The generated table mimics the shape of an RFM aggregation: a recency
//! feature that separates returning customers from lapsed ones, an order
//! count, and a noisy log of prior spend that carries the magnitude signal.
//! Positive outcomes are log-normal, zero outcomes make up a configured
//! fraction of rows.

use crate::dataset::{Dataset, DatasetError};
use rand::distributions::Distribution;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use statrs::distribution::Normal;
use thiserror::Error;

/// Errors from synthetic data generation
#[derive(Error, Debug)]
pub enum SyntheticError {
    #[error("rows must be >= 2, got {0}")]
    TooFewRows(usize),

    #[error("zero_fraction must be in [0, 1), got {0}")]
    InvalidZeroFraction(f64),

    #[error("sigma must be > 0, got {0}")]
    InvalidSigma(f64),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Parameters of the synthetic population
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Number of customers
    pub rows: usize,
    /// Fraction of customers with zero spend
    pub zero_fraction: f64,
    /// Mean of log-spend for returning customers
    pub mu: f64,
    /// Standard deviation of log-spend
    pub sigma: f64,
    /// Generator seed
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            rows: 1000,
            zero_fraction: 0.5,
            mu: 2.0,
            sigma: 0.5,
            seed: 42,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn unit(rng: &mut ChaCha8Rng) -> f64 {
    rng.next_u64() as f64 / u64::MAX as f64
}

/// Generate a synthetic customer-spend dataset.
///
/// Deterministic for a given config: the same seed reproduces the same
/// table byte for byte.
///
/// # Errors
///
/// Returns an error for out-of-range parameters.
#[allow(clippy::cast_precision_loss)]
pub fn generate(config: &SyntheticConfig) -> Result<Dataset, SyntheticError> {
    if config.rows < 2 {
        return Err(SyntheticError::TooFewRows(config.rows));
    }
    if !(0.0..1.0).contains(&config.zero_fraction) {
        return Err(SyntheticError::InvalidZeroFraction(config.zero_fraction));
    }
    if config.sigma <= 0.0 {
        return Err(SyntheticError::InvalidSigma(config.sigma));
    }

    // parameters already validated, Normal::new cannot fail here
    let noise = Normal::new(0.0, config.sigma)
        .map_err(|_| SyntheticError::InvalidSigma(config.sigma))?;
    let jitter = Normal::new(0.0, 0.3).map_err(|_| SyntheticError::InvalidSigma(0.3))?;

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let columns = vec![
        "recency_days".to_string(),
        "order_count".to_string(),
        "prior_spend_log".to_string(),
    ];

    let mut keys = Vec::with_capacity(config.rows);
    let mut rows = Vec::with_capacity(config.rows);
    let mut outcome = Vec::with_capacity(config.rows);

    for i in 0..config.rows {
        keys.push(format!("cust-{i:06}"));

        let returns = unit(&mut rng) >= config.zero_fraction;
        if returns {
            let log_spend = config.mu + noise.sample(&mut rng);
            let recency = 30.0 * unit(&mut rng);
            let orders = (1.0 + 6.0 * unit(&mut rng)).round();
            let prior = 0.8 * log_spend + jitter.sample(&mut rng);
            rows.push(vec![recency, orders, prior]);
            outcome.push(log_spend.exp());
        } else {
            let recency = 30.0 + 60.0 * unit(&mut rng);
            let orders = (2.0 * unit(&mut rng)).round();
            let prior = jitter.sample(&mut rng);
            rows.push(vec![recency, orders, prior]);
            outcome.push(0.0);
        }
    }

    Ok(Dataset::new(columns, keys, rows, "spend", outcome)?)
}
