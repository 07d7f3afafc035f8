//! Harness configuration with per-field defaults and YAML loading.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{name} must be strictly between 0 and 1, got {value}")]
    InvalidFraction { name: &'static str, value: f64 },

    #[error("classification_threshold must be in [0, 1], got {0}")]
    InvalidThreshold(f64),
}

/// Configuration for the evaluation harness
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarnessConfig {
    /// Training-outcome quantile used as the winsorize cap
    #[serde(default = "default_outlier_percentile")]
    pub outlier_percentile: f64,
    /// Fraction of rows held out as the test set
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    /// Seed fixing the train/test split
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,
    /// Probability threshold for the hurdle classification stage
    #[serde(default = "default_classification_threshold")]
    pub classification_threshold: f64,
    /// Passed through to the underlying predictor, not interpreted here
    #[serde(default)]
    pub excluded_model_families: Vec<String>,
}

const fn default_outlier_percentile() -> f64 {
    0.99
}
const fn default_test_fraction() -> f64 {
    0.2
}
const fn default_random_seed() -> u64 {
    42
}
const fn default_classification_threshold() -> f64 {
    0.5
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            outlier_percentile: default_outlier_percentile(),
            test_fraction: default_test_fraction(),
            random_seed: default_random_seed(),
            classification_threshold: default_classification_threshold(),
            excluded_model_families: Vec::new(),
        }
    }
}

impl HarnessConfig {
    /// Load and validate a configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a field
    /// fails validation.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field ranges.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.outlier_percentile > 0.0 && self.outlier_percentile < 1.0) {
            return Err(ConfigError::InvalidFraction {
                name: "outlier_percentile",
                value: self.outlier_percentile,
            });
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(ConfigError::InvalidFraction {
                name: "test_fraction",
                value: self.test_fraction,
            });
        }
        if !(0.0..=1.0).contains(&self.classification_threshold) {
            return Err(ConfigError::InvalidThreshold(self.classification_threshold));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = HarnessConfig::default();
        assert_eq!(config.outlier_percentile, 0.99);
        assert_eq!(config.test_fraction, 0.2);
        assert_eq!(config.random_seed, 42);
        assert_eq!(config.classification_threshold, 0.5);
        assert!(config.excluded_model_families.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: HarnessConfig = serde_yaml::from_str("test_fraction: 0.3\n").unwrap();
        assert_eq!(config.test_fraction, 0.3);
        assert_eq!(config.outlier_percentile, 0.99);
        assert_eq!(config.random_seed, 42);
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harness.yaml");
        std::fs::write(
            &path,
            "outlier_percentile: 0.95\nrandom_seed: 7\nexcluded_model_families:\n  - deep_nets\n",
        )
        .unwrap();

        let config = HarnessConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.outlier_percentile, 0.95);
        assert_eq!(config.random_seed, 7);
        assert_eq!(config.excluded_model_families, vec!["deep_nets".to_string()]);
    }

    #[test]
    fn test_validate_rejects_bad_fractions() {
        let mut config = HarnessConfig::default();
        config.test_fraction = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidFraction { name: "test_fraction", .. })
        ));

        let mut config = HarnessConfig::default();
        config.outlier_percentile = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut config = HarnessConfig::default();
        config.classification_threshold = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = HarnessConfig {
            outlier_percentile: 0.9,
            test_fraction: 0.25,
            random_seed: 99,
            classification_threshold: 0.6,
            excluded_model_families: vec!["svm".to_string()],
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back: HarnessConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, config);
    }
}
