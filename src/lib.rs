//! # Hurdle Eval
//!
//! Expected-spend estimation for zero-inflated, heavy-tailed customer
//! outcomes, built around a two-stage hurdle model with Duan's smearing
//! correction, plus an evaluation harness that pits it against naive
//! alternatives under one shared metric suite.
//!
//! ## Why a hurdle
//!
//! Most customers never return (excess mass at zero) and a few spend
//! disproportionately (heavy right tail). A single regression fit on the
//! raw outcome serves neither regime. The hurdle splits the problem:
//! a binary "will they spend" classifier gates a magnitude regression fit
//! on the log of positive outcomes only, and the re-transformation bias
//! from exponentiating log-scale predictions is corrected by the smearing
//! factor - the mean of exponentiated in-sample residuals.
//!
//! ## Architecture
//!
//! ```text
//! Customer table (features + spend)
//!        ↓
//! Deterministic train/test split (seeded)
//!        ↓
//! Strategies: baseline | winsorized | log1p | hurdle | hurdle_corrected
//!        ↓
//! Metric suite (RMSE, MAE, R², Spearman, Wasserstein, ...)
//!        ↓
//! Average-rank aggregation
//!        ↓
//! Report (JSON | markdown | text)
//! ```
//!
//! Predictors are pluggable: the hurdle stages accept anything satisfying
//! the [`predictor::Classifier`] / [`predictor::Regressor`] contracts.

pub mod config;
pub mod dataset;
pub mod harness;
pub mod hurdle;
pub mod linear;
pub mod metrics;
pub mod predictor;
pub mod report;
pub mod smearing;
pub mod synthetic;
pub mod transform;

pub use config::{ConfigError, HarnessConfig};
pub use dataset::{Dataset, DatasetError, Observation};
pub use harness::{
    rank_strategies, EvalOutcome, EvaluationHarness, RankEntry, Ranking, StrategyFailure,
    StrategyError, STRATEGIES,
};
pub use hurdle::{HurdleError, HurdleModel, HurdleState};
pub use linear::{LinearRegressor, LogisticClassifier};
pub use metrics::{
    classification_report, regression_report, Metric, MetricReport, RankDirection,
};
pub use predictor::{Classifier, PredictorError, Regressor};
pub use report::{EvalReport, ReportMetadata};
pub use smearing::{smearing_factor, SmearingError};
pub use synthetic::{generate, SyntheticConfig, SyntheticError};
pub use transform::TransformError;
