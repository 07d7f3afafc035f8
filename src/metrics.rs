//! Metric suite: pure numeric reductions over true/predicted vectors.
//!
//! Degenerate inputs (zero variance, empty or mismatched vectors) yield NaN
//! instead of panicking, so a pathological strategy still produces a report
//! row that downstream ranking can skip.

use serde::{Deserialize, Serialize};

/// Whether lower or higher values of a metric indicate a better model.
///
/// Error metrics rank ascending, correlation-style metrics descending; the
/// direction travels with the metric so the ranking never has to guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankDirection {
    /// Smaller is better (errors, distances)
    LowerIsBetter,
    /// Larger is better (correlations, R²)
    HigherIsBetter,
}

/// A single named metric value with its ranking direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    /// Metric name
    pub name: String,
    /// Computed value (NaN when undefined)
    pub value: f64,
    /// Ranking direction
    pub direction: RankDirection,
}

impl Metric {
    fn new(name: &str, value: f64, direction: RankDirection) -> Self {
        Self {
            name: name.to_string(),
            value,
            direction,
        }
    }
}

/// Metric values for one strategy, tagged with the strategy name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricReport {
    /// Strategy or model identifier
    pub strategy: String,
    /// Named metric values in suite order
    pub metrics: Vec<Metric>,
    /// 2x2 confusion matrix (rows = true class, cols = predicted, ordered [0, 1]);
    /// only present for classification reports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confusion: Option<[[u64; 2]; 2]>,
}

impl MetricReport {
    /// Look up a metric value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.metrics.iter().find(|m| m.name == name).map(|m| m.value)
    }
}

/// Full regression suite for one strategy's predictions.
#[must_use]
pub fn regression_report(strategy: &str, y_true: &[f64], y_pred: &[f64]) -> MetricReport {
    use RankDirection::{HigherIsBetter, LowerIsBetter};
    MetricReport {
        strategy: strategy.to_string(),
        metrics: vec![
            Metric::new("rmse", rmse(y_true, y_pred), LowerIsBetter),
            Metric::new("mse", mse(y_true, y_pred), LowerIsBetter),
            Metric::new("mae", mae(y_true, y_pred), LowerIsBetter),
            Metric::new("median_ae", median_absolute_error(y_true, y_pred), LowerIsBetter),
            Metric::new("r2", r_squared(y_true, y_pred), HigherIsBetter),
            Metric::new("pearson", pearson(y_true, y_pred), HigherIsBetter),
            Metric::new("spearman", spearman(y_true, y_pred), HigherIsBetter),
            Metric::new("wasserstein", wasserstein_1d(y_true, y_pred), LowerIsBetter),
        ],
        confusion: None,
    }
}

/// Full classification suite for binary labels.
#[must_use]
pub fn classification_report(strategy: &str, y_true: &[u8], y_pred: &[u8]) -> MetricReport {
    use RankDirection::HigherIsBetter;
    MetricReport {
        strategy: strategy.to_string(),
        metrics: vec![
            Metric::new("accuracy", accuracy(y_true, y_pred), HigherIsBetter),
            Metric::new("precision_weighted", precision_weighted(y_true, y_pred), HigherIsBetter),
            Metric::new("recall_weighted", recall_weighted(y_true, y_pred), HigherIsBetter),
            Metric::new("f1_weighted", f1_weighted(y_true, y_pred), HigherIsBetter),
        ],
        confusion: Some(confusion_matrix(y_true, y_pred)),
    }
}

fn paired_ok(y_true: &[f64], y_pred: &[f64]) -> bool {
    !y_true.is_empty() && y_true.len() == y_pred.len()
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean squared error.
#[must_use]
pub fn mse(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if !paired_ok(y_true, y_pred) {
        return f64::NAN;
    }
    let sq: Vec<f64> = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .collect();
    mean(&sq)
}

/// Root mean squared error.
#[must_use]
pub fn rmse(y_true: &[f64], y_pred: &[f64]) -> f64 {
    mse(y_true, y_pred).sqrt()
}

/// Mean absolute error.
#[must_use]
pub fn mae(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if !paired_ok(y_true, y_pred) {
        return f64::NAN;
    }
    let abs: Vec<f64> = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).abs()).collect();
    mean(&abs)
}

/// Median of absolute errors; well-defined for a single pair.
#[must_use]
pub fn median_absolute_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if !paired_ok(y_true, y_pred) {
        return f64::NAN;
    }
    let mut abs: Vec<f64> = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).abs()).collect();
    abs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = abs.len();
    if n % 2 == 1 {
        abs[n / 2]
    } else {
        (abs[n / 2 - 1] + abs[n / 2]) / 2.0
    }
}

/// Coefficient of determination. NaN when the true outcome has zero variance.
#[must_use]
pub fn r_squared(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if !paired_ok(y_true, y_pred) {
        return f64::NAN;
    }
    let mean_true = mean(y_true);
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean_true).powi(2)).sum();
    if ss_tot < f64::EPSILON {
        return f64::NAN;
    }
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    1.0 - ss_res / ss_tot
}

/// Pearson correlation. NaN when either vector has zero variance.
#[must_use]
pub fn pearson(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if !paired_ok(y_true, y_pred) {
        return f64::NAN;
    }
    let mean_t = mean(y_true);
    let mean_p = mean(y_pred);
    let mut cov = 0.0;
    let mut var_t = 0.0;
    let mut var_p = 0.0;
    for (t, p) in y_true.iter().zip(y_pred) {
        cov += (t - mean_t) * (p - mean_p);
        var_t += (t - mean_t).powi(2);
        var_p += (p - mean_p).powi(2);
    }
    let denom = (var_t * var_p).sqrt();
    if denom < f64::EPSILON {
        return f64::NAN;
    }
    cov / denom
}

/// Spearman rank correlation: Pearson over average-tie ranks.
#[must_use]
pub fn spearman(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if !paired_ok(y_true, y_pred) {
        return f64::NAN;
    }
    pearson(&average_ranks(y_true), &average_ranks(y_pred))
}

/// Assign 1-based ranks, ties receiving the average of their positions.
#[allow(clippy::cast_precision_loss)]
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && (values[order[j + 1]] - values[order[i]]).abs() < f64::EPSILON
        {
            j += 1;
        }
        // positions i..=j share the same value
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        i = j + 1;
    }
    ranks
}

/// 1-D Wasserstein (earth-mover's) distance between two equal-length
/// empirical distributions: mean absolute difference of sorted samples.
#[must_use]
pub fn wasserstein_1d(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if !paired_ok(y_true, y_pred) {
        return f64::NAN;
    }
    let mut a = y_true.to_vec();
    let mut b = y_pred.to_vec();
    a.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));
    b.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));
    let abs: Vec<f64> = a.iter().zip(&b).map(|(x, y)| (x - y).abs()).collect();
    mean(&abs)
}

/// 2x2 confusion matrix, rows = true class, columns = predicted, ordered [0, 1].
#[must_use]
pub fn confusion_matrix(y_true: &[u8], y_pred: &[u8]) -> [[u64; 2]; 2] {
    let mut m = [[0_u64; 2]; 2];
    for (&t, &p) in y_true.iter().zip(y_pred) {
        m[usize::from(t.min(1))][usize::from(p.min(1))] += 1;
    }
    m
}

/// Fraction of labels predicted exactly.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn accuracy(y_true: &[u8], y_pred: &[u8]) -> f64 {
    if y_true.is_empty() || y_true.len() != y_pred.len() {
        return f64::NAN;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

#[allow(clippy::cast_precision_loss)]
fn per_class_weighted<F>(y_true: &[u8], y_pred: &[u8], score: F) -> f64
where
    F: Fn(&[[u64; 2]; 2], usize) -> f64,
{
    if y_true.is_empty() || y_true.len() != y_pred.len() {
        return f64::NAN;
    }
    let m = confusion_matrix(y_true, y_pred);
    let total = y_true.len() as f64;
    let mut weighted = 0.0;
    for class in 0..2 {
        let support = (m[class][0] + m[class][1]) as f64;
        if support > 0.0 {
            weighted += score(&m, class) * support / total;
        }
    }
    weighted
}

#[allow(clippy::cast_precision_loss)]
fn class_precision(m: &[[u64; 2]; 2], class: usize) -> f64 {
    let predicted = (m[0][class] + m[1][class]) as f64;
    if predicted > 0.0 {
        m[class][class] as f64 / predicted
    } else {
        0.0
    }
}

#[allow(clippy::cast_precision_loss)]
fn class_recall(m: &[[u64; 2]; 2], class: usize) -> f64 {
    let support = (m[class][0] + m[class][1]) as f64;
    if support > 0.0 {
        m[class][class] as f64 / support
    } else {
        0.0
    }
}

fn class_f1(m: &[[u64; 2]; 2], class: usize) -> f64 {
    let p = class_precision(m, class);
    let r = class_recall(m, class);
    if p + r > 0.0 {
        2.0 * p * r / (p + r)
    } else {
        0.0
    }
}

/// Class-weighted precision across {0, 1}.
#[must_use]
pub fn precision_weighted(y_true: &[u8], y_pred: &[u8]) -> f64 {
    per_class_weighted(y_true, y_pred, class_precision)
}

/// Class-weighted recall across {0, 1}.
#[must_use]
pub fn recall_weighted(y_true: &[u8], y_pred: &[u8]) -> f64 {
    per_class_weighted(y_true, y_pred, class_recall)
}

/// Class-weighted F1 across {0, 1}.
#[must_use]
pub fn f1_weighted(y_true: &[u8], y_pred: &[u8]) -> f64 {
    per_class_weighted(y_true, y_pred, class_f1)
}

#[cfg(test)]
#[allow(clippy::float_cmp, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors_perfect_scores() {
        let y = vec![0.0, 1.0, 2.0, 5.0, 10.0];
        assert_eq!(rmse(&y, &y), 0.0);
        assert_eq!(mae(&y, &y), 0.0);
        assert_eq!(median_absolute_error(&y, &y), 0.0);
        assert_eq!(r_squared(&y, &y), 1.0);
        assert!((pearson(&y, &y) - 1.0).abs() < 1e-12);
        assert!((spearman(&y, &y) - 1.0).abs() < 1e-12);
        assert_eq!(wasserstein_1d(&y, &y), 0.0);
    }

    #[test]
    fn test_zero_variance_is_nan_not_panic() {
        let flat = vec![3.0, 3.0, 3.0];
        let other = vec![1.0, 2.0, 3.0];
        assert!(pearson(&flat, &other).is_nan());
        assert!(spearman(&flat, &other).is_nan());
        assert!(r_squared(&flat, &other).is_nan());
    }

    #[test]
    fn test_length_mismatch_is_nan() {
        assert!(mse(&[1.0, 2.0], &[1.0]).is_nan());
        assert!(mae(&[], &[]).is_nan());
    }

    #[test]
    fn test_mse_known_value() {
        let y_true = vec![1.0, 2.0, 3.0];
        let y_pred = vec![2.0, 2.0, 2.0];
        assert!((mse(&y_true, &y_pred) - 2.0 / 3.0).abs() < 1e-12);
        assert!((rmse(&y_true, &y_pred) - (2.0_f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_median_ae_even_length() {
        let y_true = vec![0.0, 0.0, 0.0, 0.0];
        let y_pred = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(median_absolute_error(&y_true, &y_pred), 2.5);
    }

    #[test]
    fn test_median_ae_single_pair() {
        assert_eq!(median_absolute_error(&[5.0], &[3.0]), 2.0);
    }

    #[test]
    fn test_pearson_perfect_negative() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![3.0, 2.0, 1.0];
        assert!((pearson(&a, &b) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_spearman_monotone_nonlinear() {
        // Monotone but nonlinear: rank correlation is exactly 1
        let a = vec![1.0, 2.0, 3.0, 4.0];
        let b = vec![1.0, 10.0, 100.0, 1000.0];
        assert!((spearman(&a, &b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_average_ranks_with_ties() {
        let ranks = average_ranks(&[1.0, 2.0, 2.0, 3.0]);
        assert_eq!(ranks, vec![1.0, 2.5, 2.5, 4.0]);
    }

    #[test]
    fn test_wasserstein_shift() {
        // Shifting a distribution by c moves it by exactly c
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![4.0, 2.0, 3.0]; // sorted: 2,3,4 = a + 1
        assert!((wasserstein_1d(&a, &b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_confusion_matrix_layout() {
        let y_true = vec![0, 0, 1, 1, 1];
        let y_pred = vec![0, 1, 1, 1, 0];
        let m = confusion_matrix(&y_true, &y_pred);
        assert_eq!(m[0][0], 1); // true 0, predicted 0
        assert_eq!(m[0][1], 1); // true 0, predicted 1
        assert_eq!(m[1][0], 1); // true 1, predicted 0
        assert_eq!(m[1][1], 2); // true 1, predicted 1
    }

    #[test]
    fn test_identical_binary_vectors_diagonal_confusion() {
        let y = vec![0, 1, 1, 0, 1];
        let m = confusion_matrix(&y, &y);
        assert_eq!(m[0][1], 0);
        assert_eq!(m[1][0], 0);
        assert_eq!(accuracy(&y, &y), 1.0);
        assert_eq!(f1_weighted(&y, &y), 1.0);
    }

    #[test]
    fn test_weighted_precision_recall_known() {
        // true: 0,0,1,1,1  pred: 0,1,1,1,0
        // class 0: precision 1/2, recall 1/2; class 1: precision 2/3, recall 2/3
        // weights: 2/5 and 3/5
        let y_true = vec![0, 0, 1, 1, 1];
        let y_pred = vec![0, 1, 1, 1, 0];
        let expected = 0.5 * 0.4 + (2.0 / 3.0) * 0.6;
        assert!((precision_weighted(&y_true, &y_pred) - expected).abs() < 1e-12);
        assert!((recall_weighted(&y_true, &y_pred) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_regression_report_names_and_directions() {
        let report = regression_report("baseline", &[1.0, 2.0], &[1.0, 2.0]);
        assert_eq!(report.strategy, "baseline");
        assert_eq!(report.get("rmse"), Some(0.0));
        let rmse_metric = report.metrics.iter().find(|m| m.name == "rmse").unwrap();
        assert_eq!(rmse_metric.direction, RankDirection::LowerIsBetter);
        let r2_metric = report.metrics.iter().find(|m| m.name == "r2").unwrap();
        assert_eq!(r2_metric.direction, RankDirection::HigherIsBetter);
    }

    #[test]
    fn test_classification_report_has_confusion() {
        let report = classification_report("gate", &[0, 1, 1], &[0, 1, 0]);
        let m = report.confusion.unwrap();
        assert_eq!(m[1][0], 1);
        assert!(report.get("accuracy").unwrap() > 0.6);
    }
}
