//! Evaluation harness: runs every candidate strategy against one immutable
//! train/test split and ranks them under the shared metric suite.
//!
//! Strategies are independent; a failure in one is logged and recorded,
//! never allowed to abort the rest of the evaluation. What is NOT allowed
//! is silently substituting a default prediction for a failed strategy -
//! that would bias the comparison invisibly, so failed strategies are
//! simply absent from the report.

use crate::config::HarnessConfig;
use crate::dataset::{Dataset, DatasetError};
use crate::hurdle::{HurdleError, HurdleModel};
use crate::linear::{LinearRegressor, LogisticClassifier};
use crate::metrics::{
    classification_report, regression_report, MetricReport, RankDirection,
};
use crate::predictor::{PredictorError, Regressor};
use crate::transform::{self, TransformError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The five candidate strategies, in stable rank-tie-break order.
pub const STRATEGIES: [&str; 5] = [
    "baseline",
    "winsorized",
    "log1p",
    "hurdle",
    "hurdle_corrected",
];

/// Errors from a single strategy run
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error(transparent)]
    Predictor(#[from] PredictorError),

    #[error(transparent)]
    Hurdle(#[from] HurdleError),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// A strategy that failed during evaluation, preserved for the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyFailure {
    /// Strategy name
    pub strategy: String,
    /// Rendered error
    pub error: String,
}

/// Average-rank entry for one strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankEntry {
    /// Strategy name
    pub strategy: String,
    /// Mean rank across metrics (lower is better)
    pub average_rank: f64,
}

/// Overall ranking, best first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ranking {
    /// Entries sorted by ascending average rank
    pub entries: Vec<RankEntry>,
}

/// Everything one harness run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalOutcome {
    /// Per-strategy regression metric reports, in strategy order
    pub reports: Vec<MetricReport>,
    /// Strategies that failed, with their errors
    pub failures: Vec<StrategyFailure>,
    /// Aggregate average-rank table
    pub ranking: Ranking,
    /// Classification diagnostics for the hurdle gate (purchase indicator
    /// vs. observed purchase), when a hurdle strategy ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate_diagnostics: Option<MetricReport>,
}

struct StrategyRun {
    predictions: Vec<f64>,
    indicators: Option<Vec<u8>>,
}

/// Runs the five strategies over a dataset and scores them.
pub struct EvaluationHarness {
    config: HarnessConfig,
}

impl Default for EvaluationHarness {
    fn default() -> Self {
        Self::new(HarnessConfig::default())
    }
}

impl EvaluationHarness {
    /// Harness with the given configuration.
    #[must_use]
    pub const fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Split the dataset once and evaluate every strategy against the same
    /// held-out test outcome.
    ///
    /// # Errors
    ///
    /// Returns an error only if the split itself fails; individual strategy
    /// failures are captured in the outcome instead.
    pub fn evaluate(&self, data: &Dataset) -> Result<EvalOutcome, DatasetError> {
        let (train, test) = data.split(self.config.test_fraction, self.config.random_seed)?;
        tracing::info!(
            train_rows = train.len(),
            test_rows = test.len(),
            seed = self.config.random_seed,
            "split dataset"
        );

        let mut reports = Vec::new();
        let mut failures = Vec::new();
        let mut gate_diagnostics = None;

        for name in STRATEGIES {
            match self.run_strategy(name, &train, &test) {
                Ok(run) => {
                    reports.push(regression_report(name, test.outcome(), &run.predictions));

                    if gate_diagnostics.is_none() {
                        if let Some(indicators) = run.indicators {
                            let truth: Vec<u8> =
                                test.outcome().iter().map(|&y| u8::from(y > 0.0)).collect();
                            gate_diagnostics =
                                Some(classification_report("hurdle_gate", &truth, &indicators));
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!(strategy = name, %error, "strategy failed; continuing");
                    failures.push(StrategyFailure {
                        strategy: name.to_string(),
                        error: error.to_string(),
                    });
                }
            }
        }

        let ranking = rank_strategies(&reports);
        Ok(EvalOutcome {
            reports,
            failures,
            ranking,
            gate_diagnostics,
        })
    }

    fn run_strategy(
        &self,
        name: &str,
        train: &Dataset,
        test: &Dataset,
    ) -> Result<StrategyRun, StrategyError> {
        match name {
            "baseline" => {
                let mut model = LinearRegressor::new();
                model.fit(train, train.outcome())?;
                Ok(StrategyRun {
                    predictions: model.predict(test)?,
                    indicators: None,
                })
            }
            "winsorized" => {
                // cap from the training outcome only; scoring stays against
                // the uncapped test outcome
                let cap = transform::quantile(train.outcome(), self.config.outlier_percentile)?;
                let capped = transform::winsorize_all(train.outcome(), cap);
                let mut model = LinearRegressor::new();
                model.fit(train, &capped)?;
                Ok(StrategyRun {
                    predictions: model.predict(test)?,
                    indicators: None,
                })
            }
            "log1p" => {
                let response = transform::log1p_all(train.outcome())?;
                let mut model = LinearRegressor::new();
                model.fit(train, &response)?;
                let predictions = model
                    .predict(test)?
                    .into_iter()
                    .map(transform::expm1)
                    .collect();
                Ok(StrategyRun {
                    predictions,
                    indicators: None,
                })
            }
            "hurdle" | "hurdle_corrected" => {
                let mut model = HurdleModel::new(
                    LogisticClassifier::new(self.config.classification_threshold),
                    LinearRegressor::new(),
                );
                model.fit(train)?;
                if name == "hurdle_corrected" {
                    let factor = model.correct(train)?;
                    tracing::debug!(factor, "applied smearing correction");
                }
                Ok(StrategyRun {
                    predictions: model.predict(test)?,
                    indicators: Some(model.predict_indicator(test)?),
                })
            }
            other => unreachable!("unknown strategy: {other}"),
        }
    }
}

/// Rank strategies per metric, then average ranks per strategy.
///
/// Each metric ranks in its own direction (errors ascending, correlations
/// descending). NaN metric values are skipped for that metric; ties keep
/// the stable strategy insertion order.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn rank_strategies(reports: &[MetricReport]) -> Ranking {
    let Some(first) = reports.first() else {
        return Ranking { entries: Vec::new() };
    };

    let mut rank_sum = vec![0.0; reports.len()];
    let mut rank_count = vec![0_usize; reports.len()];

    for metric in &first.metrics {
        let mut contenders: Vec<(usize, f64)> = reports
            .iter()
            .enumerate()
            .filter_map(|(i, r)| {
                r.metrics
                    .iter()
                    .find(|m| m.name == metric.name)
                    .filter(|m| !m.value.is_nan())
                    .map(|m| (i, m.value))
            })
            .collect();

        // stable sort keeps insertion order for exact ties
        match metric.direction {
            RankDirection::LowerIsBetter => contenders.sort_by(|a, b| {
                a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal)
            }),
            RankDirection::HigherIsBetter => contenders.sort_by(|a, b| {
                b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal)
            }),
        }

        for (rank, (strategy_idx, _)) in contenders.iter().enumerate() {
            rank_sum[*strategy_idx] += (rank + 1) as f64;
            rank_count[*strategy_idx] += 1;
        }
    }

    let mut entries: Vec<RankEntry> = reports
        .iter()
        .enumerate()
        .map(|(i, r)| RankEntry {
            strategy: r.strategy.clone(),
            average_rank: if rank_count[i] > 0 {
                rank_sum[i] / rank_count[i] as f64
            } else {
                f64::NAN
            },
        })
        .collect();

    entries.sort_by(|a, b| {
        a.average_rank
            .partial_cmp(&b.average_rank)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ranking { entries }
}
