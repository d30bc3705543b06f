//! Configuration system for galton experiments.
//!
//! Supports YAML configuration files with sensible defaults.

use crate::error::{check_confidence, check_lambda, Error, Result};
use crate::experiment::{lambda_sweep, Experiment};
use crate::lineage::CapCheck;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub trials: TrialConfig,
    #[serde(default)]
    pub statistics: StatisticsConfig,
    #[serde(default)]
    pub parallel: ParallelConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// λ grid, inclusive on both ends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    pub lambda_start: f64,
    pub lambda_end: f64,
    pub lambda_step: f64,
}

/// Per-λ trial settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialConfig {
    /// Independent lineages simulated per λ
    pub repetitions: usize,
    /// Population at which a lineage counts as surviving
    pub population_cap: u64,
    /// When the cap is compared against a growing generation
    #[serde(default)]
    pub cap_check: CapCheck,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsConfig {
    /// Two-sided confidence level, strictly between 0 and 1
    pub confidence_level: f64,
}

/// Worker pool and randomness
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// Worker threads; unset means one per hardware thread
    pub workers: Option<usize>,
    /// Base seed; unset draws a fresh one per run
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            lambda_start: 1.0,
            lambda_end: 1.6,
            lambda_step: 0.1,
        }
    }
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            repetitions: 1000,
            population_cap: 1000,
            cap_check: CapCheck::Incremental,
        }
    }
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        check_lambda(self.sweep.lambda_start)?;
        if !(self.sweep.lambda_end >= self.sweep.lambda_start) {
            return Err(Error::invalid("lambda_end", "must be >= lambda_start"));
        }
        if !(self.sweep.lambda_step > 0.0) {
            return Err(Error::invalid("lambda_step", "must be > 0"));
        }
        if self.trials.repetitions == 0 {
            return Err(Error::invalid("repetitions", "must be > 0"));
        }
        if self.trials.population_cap == 0 {
            return Err(Error::invalid("population_cap", "must be > 0"));
        }
        check_confidence(self.statistics.confidence_level)?;
        if self.parallel.workers == Some(0) {
            return Err(Error::invalid("workers", "must be > 0"));
        }
        Ok(())
    }

    /// Expand the sweep into the λ grid
    pub fn lambdas(&self) -> Result<Vec<f64>> {
        lambda_sweep(
            self.sweep.lambda_start,
            self.sweep.lambda_end,
            self.sweep.lambda_step,
        )
    }

    /// Build a validated experiment from this configuration
    pub fn experiment(&self) -> Result<Experiment> {
        self.validate()?;
        let mut experiment = Experiment::new(
            self.lambdas()?,
            self.trials.repetitions,
            self.trials.population_cap,
        )?
        .with_workers(self.parallel.workers)
        .with_cap_check(self.trials.cap_check);

        if let Some(seed) = self.parallel.seed {
            experiment = experiment.with_seed(seed);
        }
        Ok(experiment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.lambdas().unwrap().len(), 7);
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.trials.cap_check = CapCheck::Batch;
        config.parallel.seed = Some(7);

        let yaml = serde_yaml::to_string(&config).unwrap();
        let loaded: Config = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(loaded.trials.repetitions, config.trials.repetitions);
        assert_eq!(loaded.trials.cap_check, CapCheck::Batch);
        assert_eq!(loaded.parallel.seed, Some(7));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "trials:\n  repetitions: 50\n  population_cap: 200\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.trials.repetitions, 50);
        assert_eq!(config.trials.cap_check, CapCheck::Incremental);
        assert_eq!(config.statistics.confidence_level, 0.95);
        assert_eq!(config.sweep.lambda_start, 1.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.statistics.confidence_level = 1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sweep.lambda_start = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.trials.population_cap = 0;
        assert!(config.experiment().is_err());

        let mut config = Config::default();
        config.parallel.workers = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_experiment_from_config() {
        let mut config = Config::default();
        config.trials.repetitions = 10;
        config.parallel.seed = Some(42);

        let experiment = config.experiment().unwrap();
        assert_eq!(experiment.seed(), 42);
        assert_eq!(experiment.trial_count(), 70);
    }
}
