//! # galton
//!
//! Monte Carlo estimation of lineage survival in Galton-Watson branching
//! processes with Poisson(λ) offspring.
//!
//! ## Features
//!
//! - **Parallel**: trials spread over all CPU cores via Rayon
//! - **Reproducible**: one seed drives every trial, independent of worker count
//! - **Configurable**: YAML configuration files
//! - **Statistical**: Wilson confidence intervals and conditional extinction times
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use galton::{aggregate, Experiment};
//!
//! let lambdas = vec![1.0, 1.2, 1.4, 1.6];
//! let experiment = Experiment::new(lambdas, 1000, 1000)?.with_seed(42);
//!
//! let results = experiment.run()?;
//! for stat in aggregate(&results, 0.95)? {
//!     println!("{}", stat.summary());
//! }
//! # Ok::<(), galton::Error>(())
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use galton::Config;
//!
//! let mut config = Config::default();
//! config.trials.repetitions = 200;
//! config.statistics.confidence_level = 0.99;
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod error;
pub mod experiment;
pub mod lineage;
pub mod offspring;
pub mod report;
pub mod stats;

// Re-export main types
pub use config::Config;
pub use error::{Error, Result};
pub use experiment::{lambda_sweep, run_experiment, Experiment, TrialSpec};
pub use lineage::{run_lineage, CapCheck, LineageRun, LineageState, Outcome, TrialResult};
pub use offspring::{OffspringSource, PoissonOffspring};
pub use stats::{aggregate, theoretical_survival, AggregateStatistic};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Time a single-λ experiment
pub fn benchmark(lambda: f64, repetitions: usize, population_cap: u64) -> Result<BenchmarkResult> {
    use std::time::Instant;

    let experiment = Experiment::new(vec![lambda], repetitions, population_cap)?;

    let start = Instant::now();
    let results = experiment.run()?;
    let elapsed = start.elapsed();

    let survivors = results.iter().filter(|r| r.survived()).count();

    Ok(BenchmarkResult {
        lambda,
        trials: results.len(),
        survivors,
        elapsed_secs: elapsed.as_secs_f64(),
        trials_per_second: results.len() as f64 / elapsed.as_secs_f64(),
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub lambda: f64,
    pub trials: usize,
    pub survivors: usize,
    pub elapsed_secs: f64,
    pub trials_per_second: f64,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Lambda: {}", self.lambda)?;
        writeln!(f, "Trials: {} ({} survived)", self.trials, self.survivors)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} trials/s", self.trials_per_second)?;
        Ok(())
    }
}
