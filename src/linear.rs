//! Built-in deterministic learners: least-squares regression and logistic
//! classification.
//!
//! These are deliberately plain tabular learners. Anything satisfying the
//! traits in [`crate::predictor`] can replace them; the harness only needs
//! a predictor that trains deterministically from the same data and seed.

use crate::dataset::Dataset;
use crate::predictor::{check_response, check_schema, Classifier, PredictorError, Regressor};

/// Ordinary least squares with an intercept, solved by Gaussian elimination
/// on the normal equations. A small ridge term keeps near-collinear feature
/// sets solvable.
#[derive(Debug, Clone)]
pub struct LinearRegressor {
    ridge: f64,
    weights: Option<Vec<f64>>,
    schema: Option<Vec<String>>,
}

impl Default for LinearRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegressor {
    /// Regressor with the default ridge term (1e-6).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ridge: 1e-6,
            weights: None,
            schema: None,
        }
    }

    /// Override the ridge regularization strength.
    #[must_use]
    pub const fn with_ridge(mut self, ridge: f64) -> Self {
        self.ridge = ridge;
        self
    }

    /// Fitted weights (intercept first), if trained.
    #[must_use]
    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }
}

impl Regressor for LinearRegressor {
    fn fit(&mut self, features: &Dataset, response: &[f64]) -> Result<(), PredictorError> {
        check_response(features, response)?;
        if features.is_empty() {
            return Err(PredictorError::Training("empty training set".to_string()));
        }

        let p = features.columns().len() + 1; // intercept at index 0
        let mut xtx = vec![vec![0.0; p]; p];
        let mut xty = vec![0.0; p];

        for (i, &y) in response.iter().enumerate() {
            let row = features.row(i);
            for a in 0..p {
                let xa = if a == 0 { 1.0 } else { row[a - 1] };
                xty[a] += xa * y;
                for b in a..p {
                    let xb = if b == 0 { 1.0 } else { row[b - 1] };
                    xtx[a][b] += xa * xb;
                }
            }
        }
        // symmetric fill + ridge on the diagonal (not the intercept)
        for a in 0..p {
            for b in 0..a {
                xtx[a][b] = xtx[b][a];
            }
            if a > 0 {
                xtx[a][a] += self.ridge;
            }
        }

        let weights = solve(xtx, xty)
            .ok_or_else(|| PredictorError::Training("singular normal equations".to_string()))?;

        self.weights = Some(weights);
        self.schema = Some(features.columns().to_vec());
        Ok(())
    }

    fn predict(&self, features: &Dataset) -> Result<Vec<f64>, PredictorError> {
        let weights = self.weights.as_ref().ok_or(PredictorError::NotFitted)?;
        let schema = self.schema.as_ref().ok_or(PredictorError::NotFitted)?;
        check_schema(schema, features)?;

        Ok((0..features.len())
            .map(|i| {
                let row = features.row(i);
                weights[0]
                    + row
                        .iter()
                        .zip(&weights[1..])
                        .map(|(x, w)| x * w)
                        .sum::<f64>()
            })
            .collect())
    }
}

/// Solve a dense linear system by Gaussian elimination with partial pivoting.
/// Returns None when the matrix is singular to working precision.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

/// Logistic regression trained by full-batch gradient descent over
/// internally standardized features. Deterministic: no random
/// initialization, fixed iteration count.
#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    threshold: f64,
    learning_rate: f64,
    iterations: usize,
    weights: Option<Vec<f64>>,
    means: Vec<f64>,
    stds: Vec<f64>,
    schema: Option<Vec<String>>,
}

impl Default for LogisticClassifier {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl LogisticClassifier {
    /// Classifier with the given decision threshold.
    #[must_use]
    pub const fn new(threshold: f64) -> Self {
        Self {
            threshold,
            learning_rate: 0.5,
            iterations: 300,
            weights: None,
            means: Vec::new(),
            stds: Vec::new(),
            schema: None,
        }
    }

    /// Override gradient-descent hyperparameters.
    #[must_use]
    pub const fn with_training(mut self, learning_rate: f64, iterations: usize) -> Self {
        self.learning_rate = learning_rate;
        self.iterations = iterations;
        self
    }

    /// The configured decision threshold.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    fn standardized(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .enumerate()
            .map(|(j, x)| (x - self.means[j]) / self.stds[j])
            .collect()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Classifier for LogisticClassifier {
    #[allow(clippy::cast_precision_loss)]
    fn fit(&mut self, features: &Dataset, labels: &[u8]) -> Result<(), PredictorError> {
        if labels.len() != features.len() {
            return Err(PredictorError::Training(format!(
                "label length {} does not match {} feature rows",
                labels.len(),
                features.len()
            )));
        }
        if features.is_empty() {
            return Err(PredictorError::Training("empty training set".to_string()));
        }
        if let Some(bad) = labels.iter().find(|&&l| l > 1) {
            return Err(PredictorError::Training(format!(
                "labels must be 0 or 1, got {bad}"
            )));
        }

        let n = features.len() as f64;
        let p = features.columns().len();

        // standardization parameters from the training set only
        let mut means = vec![0.0; p];
        for i in 0..features.len() {
            for (j, x) in features.row(i).iter().enumerate() {
                means[j] += x;
            }
        }
        for m in &mut means {
            *m /= n;
        }
        let mut stds = vec![0.0; p];
        for i in 0..features.len() {
            for (j, x) in features.row(i).iter().enumerate() {
                stds[j] += (x - means[j]).powi(2);
            }
        }
        for s in &mut stds {
            *s = (*s / n).sqrt();
            if *s < 1e-12 {
                *s = 1.0; // constant column carries no signal
            }
        }
        self.means = means;
        self.stds = stds;

        let mut weights = vec![0.0; p + 1];
        for _ in 0..self.iterations {
            let mut grad = vec![0.0; p + 1];
            for (i, &label) in labels.iter().enumerate() {
                let row = self.standardized(features.row(i));
                let z = weights[0]
                    + row.iter().zip(&weights[1..]).map(|(x, w)| x * w).sum::<f64>();
                let err = sigmoid(z) - f64::from(label);
                grad[0] += err;
                for (g, x) in grad[1..].iter_mut().zip(&row) {
                    *g += err * x;
                }
            }
            for (w, g) in weights.iter_mut().zip(&grad) {
                *w -= self.learning_rate * g / n;
            }
        }

        self.weights = Some(weights);
        self.schema = Some(features.columns().to_vec());
        Ok(())
    }

    fn predict_proba(&self, features: &Dataset) -> Result<Vec<f64>, PredictorError> {
        let weights = self.weights.as_ref().ok_or(PredictorError::NotFitted)?;
        let schema = self.schema.as_ref().ok_or(PredictorError::NotFitted)?;
        check_schema(schema, features)?;

        Ok((0..features.len())
            .map(|i| {
                let row = self.standardized(features.row(i));
                let z = weights[0]
                    + row.iter().zip(&weights[1..]).map(|(x, w)| x * w).sum::<f64>();
                sigmoid(z)
            })
            .collect())
    }

    fn predict(&self, features: &Dataset) -> Result<Vec<u8>, PredictorError> {
        Ok(self
            .predict_proba(features)?
            .into_iter()
            .map(|p| u8::from(p >= self.threshold))
            .collect())
    }
}
