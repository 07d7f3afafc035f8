//! Hurdle Eval CLI
//!
//! Evaluates spend-prediction strategies over a customer table.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use hurdle_eval::synthetic::{generate, SyntheticConfig};
use hurdle_eval::{Dataset, EvalReport, EvaluationHarness, HarnessConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hurdle-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate all strategies on a CSV dataset
    Evaluate {
        /// Path to a headered CSV file
        #[arg(long)]
        data: PathBuf,

        /// Name of the non-negative outcome column
        #[arg(long)]
        outcome: String,

        /// Optional name of a customer-key column
        #[arg(long)]
        key: Option<String>,

        /// Optional YAML harness configuration
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the full JSON report here
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Evaluate all strategies on seeded synthetic data
    Demo {
        /// Number of synthetic customers
        #[arg(long, default_value = "1000")]
        rows: usize,

        /// Fraction of customers with zero spend
        #[arg(long, default_value = "0.5")]
        zero_fraction: f64,

        /// Generator and split seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Re-render a saved JSON report
    Report {
        /// Path to a JSON report produced by `evaluate`
        #[arg(long)]
        input: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Md,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Evaluate {
            data,
            outcome,
            key,
            config,
            output,
        } => {
            let harness_config = match config {
                Some(path) => HarnessConfig::from_yaml_file(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => HarnessConfig::default(),
            };

            let dataset = Dataset::from_csv(&data, &outcome, key.as_deref())
                .with_context(|| format!("loading dataset {}", data.display()))?;
            tracing::info!(rows = dataset.len(), outcome = %outcome, "loaded dataset");

            let harness = EvaluationHarness::new(harness_config.clone());
            let eval = harness.evaluate(&dataset).context("evaluation failed")?;
            let report = EvalReport::new(
                &format!("Spend Evaluation: {}", data.display()),
                harness_config,
                eval,
            );

            println!("{}", report.to_text());

            if let Some(path) = output {
                let json = report.to_json().context("serializing report")?;
                std::fs::write(&path, json)
                    .with_context(|| format!("writing report {}", path.display()))?;
                tracing::info!(path = %path.display(), "wrote JSON report");
            }
        }

        Commands::Demo {
            rows,
            zero_fraction,
            seed,
        } => {
            let data = generate(&SyntheticConfig {
                rows,
                zero_fraction,
                seed,
                ..SyntheticConfig::default()
            })
            .context("generating synthetic data")?;

            let config = HarnessConfig {
                random_seed: seed,
                ..HarnessConfig::default()
            };
            let harness = EvaluationHarness::new(config.clone());
            let eval = harness.evaluate(&data).context("evaluation failed")?;
            let report = EvalReport::new("Synthetic Spend Evaluation", config, eval);
            println!("{}", report.to_text());
        }

        Commands::Report { input, format } => {
            let json = std::fs::read_to_string(&input)
                .with_context(|| format!("reading report {}", input.display()))?;
            let report = EvalReport::from_json(&json).context("parsing report")?;
            match format {
                Format::Text => println!("{}", report.to_text()),
                Format::Md => println!("{}", report.to_markdown()),
            }
        }
    }

    Ok(())
}
