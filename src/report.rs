//! Report rendering for harness outcomes.
//!
//! Wraps an [`EvalOutcome`] with run metadata and renders it as JSON,
//! markdown, or a plain text table.

use crate::config::HarnessConfig;
use crate::harness::EvalOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as FmtWrite;
use tabled::{Table, Tabled};

/// A harness outcome plus the metadata needed to reproduce it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    /// Run metadata
    pub metadata: ReportMetadata,
    /// The harness outcome itself
    pub outcome: EvalOutcome,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Report title
    pub title: String,
    /// Generation timestamp
    pub generated_at: DateTime<Utc>,
    /// Crate version that produced the report
    pub version: String,
    /// Configuration the harness ran with
    pub config: HarnessConfig,
}

/// Table row for the per-strategy metric table
#[derive(Tabled)]
struct StrategyRow {
    #[tabled(rename = "Strategy")]
    strategy: String,
    #[tabled(rename = "MAE")]
    mae: String,
    #[tabled(rename = "RMSE")]
    rmse: String,
    #[tabled(rename = "R²")]
    r2: String,
    #[tabled(rename = "Spearman")]
    spearman: String,
    #[tabled(rename = "Wasserstein")]
    wasserstein: String,
}

/// Table row for the ranking table
#[derive(Tabled)]
struct RankRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Strategy")]
    strategy: String,
    #[tabled(rename = "Avg Rank")]
    average_rank: String,
}

fn fmt_metric(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| {
        if v.is_nan() {
            "NaN".to_string()
        } else {
            format!("{v:.4}")
        }
    })
}

impl EvalReport {
    /// Wrap an outcome with fresh metadata.
    #[must_use]
    pub fn new(title: &str, config: HarnessConfig, outcome: EvalOutcome) -> Self {
        Self {
            metadata: ReportMetadata {
                title: title.to_string(),
                generated_at: Utc::now(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                config,
            },
            outcome,
        }
    }

    /// Render as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a report back from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not match the report shape.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn strategy_rows(&self) -> Vec<StrategyRow> {
        self.outcome
            .reports
            .iter()
            .map(|r| StrategyRow {
                strategy: r.strategy.clone(),
                mae: fmt_metric(r.get("mae")),
                rmse: fmt_metric(r.get("rmse")),
                r2: fmt_metric(r.get("r2")),
                spearman: fmt_metric(r.get("spearman")),
                wasserstein: fmt_metric(r.get("wasserstein")),
            })
            .collect()
    }

    fn rank_rows(&self) -> Vec<RankRow> {
        self.outcome
            .ranking
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| RankRow {
                position: i + 1,
                strategy: e.strategy.clone(),
                average_rank: fmt_metric(Some(e.average_rank)),
            })
            .collect()
    }

    /// Render as markdown.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        writeln!(output, "# {}", self.metadata.title).ok();
        writeln!(output).ok();
        writeln!(
            output,
            "**Generated:** {}",
            self.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
        .ok();
        writeln!(output, "**Version:** {}", self.metadata.version).ok();
        writeln!(output).ok();

        writeln!(output, "## Ranking").ok();
        writeln!(output).ok();
        writeln!(output, "| # | Strategy | Avg Rank |").ok();
        writeln!(output, "|---|----------|----------|").ok();
        for row in self.rank_rows() {
            writeln!(
                output,
                "| {} | {} | {} |",
                row.position, row.strategy, row.average_rank
            )
            .ok();
        }
        writeln!(output).ok();

        writeln!(output, "## Strategy Metrics").ok();
        writeln!(output).ok();
        writeln!(output, "| Strategy | MAE | RMSE | R² | Spearman | Wasserstein |").ok();
        writeln!(output, "|----------|-----|------|----|----------|-------------|").ok();
        for row in self.strategy_rows() {
            writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} |",
                row.strategy, row.mae, row.rmse, row.r2, row.spearman, row.wasserstein
            )
            .ok();
        }
        writeln!(output).ok();

        if let Some(gate) = &self.outcome.gate_diagnostics {
            writeln!(output, "## Hurdle Gate").ok();
            writeln!(output).ok();
            for metric in &gate.metrics {
                writeln!(output, "- {}: {:.4}", metric.name, metric.value).ok();
            }
            if let Some(m) = gate.confusion {
                writeln!(output).ok();
                writeln!(output, "Confusion matrix (rows = true, cols = predicted):").ok();
                writeln!(output).ok();
                writeln!(output, "|   | 0 | 1 |").ok();
                writeln!(output, "|---|---|---|").ok();
                writeln!(output, "| 0 | {} | {} |", m[0][0], m[0][1]).ok();
                writeln!(output, "| 1 | {} | {} |", m[1][0], m[1][1]).ok();
            }
            writeln!(output).ok();
        }

        if !self.outcome.failures.is_empty() {
            writeln!(output, "## Failed Strategies").ok();
            writeln!(output).ok();
            for failure in &self.outcome.failures {
                writeln!(output, "- **{}**: {}", failure.strategy, failure.error).ok();
            }
            writeln!(output).ok();
        }

        writeln!(output, "## Configuration").ok();
        writeln!(output).ok();
        writeln!(
            output,
            "- outlier_percentile: {}",
            self.metadata.config.outlier_percentile
        )
        .ok();
        writeln!(output, "- test_fraction: {}", self.metadata.config.test_fraction).ok();
        writeln!(output, "- random_seed: {}", self.metadata.config.random_seed).ok();
        writeln!(
            output,
            "- classification_threshold: {}",
            self.metadata.config.classification_threshold
        )
        .ok();

        output
    }

    /// Render as a plain text table.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        writeln!(output, "{}", self.metadata.title).ok();
        writeln!(output).ok();

        writeln!(output, "RANKING (lower average rank is better)").ok();
        writeln!(output, "{}", Table::new(self.rank_rows())).ok();
        writeln!(output).ok();

        writeln!(output, "STRATEGY METRICS").ok();
        writeln!(output, "{}", Table::new(self.strategy_rows())).ok();

        if !self.outcome.failures.is_empty() {
            writeln!(output).ok();
            writeln!(output, "FAILED STRATEGIES").ok();
            for failure in &self.outcome.failures {
                writeln!(output, "  {}: {}", failure.strategy, failure.error).ok();
            }
        }

        output
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::harness::EvaluationHarness;
    use crate::synthetic::{generate, SyntheticConfig};

    fn sample_report() -> EvalReport {
        let data = generate(&SyntheticConfig {
            rows: 200,
            ..SyntheticConfig::default()
        })
        .unwrap();
        let harness = EvaluationHarness::default();
        let outcome = harness.evaluate(&data).unwrap();
        EvalReport::new("Spend Evaluation", harness.config().clone(), outcome)
    }

    #[test]
    fn test_json_round_trip() {
        let report = sample_report();
        let json = report.to_json().unwrap();
        let back = EvalReport::from_json(&json).unwrap();
        assert_eq!(back.metadata.title, "Spend Evaluation");
        assert_eq!(back.outcome.reports.len(), report.outcome.reports.len());
        assert_eq!(
            back.outcome.ranking.entries[0].strategy,
            report.outcome.ranking.entries[0].strategy
        );
    }

    #[test]
    fn test_markdown_contains_sections() {
        let md = sample_report().to_markdown();
        assert!(md.contains("# Spend Evaluation"));
        assert!(md.contains("## Ranking"));
        assert!(md.contains("## Strategy Metrics"));
        assert!(md.contains("## Configuration"));
        assert!(md.contains("hurdle_corrected"));
    }

    #[test]
    fn test_text_contains_tables() {
        let text = sample_report().to_text();
        assert!(text.contains("RANKING"));
        assert!(text.contains("STRATEGY METRICS"));
        assert!(text.contains("baseline"));
    }

    #[test]
    fn test_nan_formats_as_nan() {
        assert_eq!(fmt_metric(Some(f64::NAN)), "NaN");
        assert_eq!(fmt_metric(None), "-");
        assert_eq!(fmt_metric(Some(1.5)), "1.5000");
    }
}
