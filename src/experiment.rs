//! Parallel trial orchestration over a (λ, repetition) grid.
//!
//! Every grid point runs exactly one independent lineage. Trials share no
//! mutable state: each one owns a ChaCha8 generator keyed by the experiment
//! seed and the trial's position in the grid, so results do not depend on the
//! number of workers or on scheduling order.

use crate::error::{check_confidence, check_lambda, Error, Result};
use crate::lineage::{CapCheck, LineageRun, TrialResult};
use crate::stats::{aggregate, AggregateStatistic};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::time::Instant;

/// One point of the experiment grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialSpec {
    /// Position in the flattened grid; also selects the RNG stream.
    pub index: usize,
    /// Position of `lambda` in the experiment's λ list.
    pub lambda_index: usize,
    pub lambda: f64,
    pub repetition: usize,
}

/// A sweep of independent lineage trials.
#[derive(Debug, Clone)]
pub struct Experiment {
    lambdas: Vec<f64>,
    repetitions: usize,
    population_cap: u64,
    cap_check: CapCheck,
    workers: Option<usize>,
    seed: u64,
}

impl Experiment {
    /// Create an experiment with a random seed and default parallelism.
    pub fn new(lambdas: Vec<f64>, repetitions: usize, population_cap: u64) -> Result<Self> {
        let experiment = Self {
            lambdas,
            repetitions,
            population_cap,
            cap_check: CapCheck::default(),
            workers: None,
            seed: rand::thread_rng().gen(),
        };
        experiment.validate()?;
        Ok(experiment)
    }

    /// Fix the base seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Worker pool size. `None` uses the available hardware parallelism.
    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_cap_check(mut self, cap_check: CapCheck) -> Self {
        self.cap_check = cap_check;
        self
    }

    pub fn lambdas(&self) -> &[f64] {
        &self.lambdas
    }

    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    pub fn population_cap(&self) -> u64 {
        self.population_cap
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn trial_count(&self) -> usize {
        self.lambdas.len() * self.repetitions
    }

    /// Check every parameter before any work is scheduled.
    pub fn validate(&self) -> Result<()> {
        if self.lambdas.is_empty() {
            return Err(Error::invalid("lambdas", "at least one value is required"));
        }
        for &lambda in &self.lambdas {
            check_lambda(lambda)?;
        }
        if self.repetitions == 0 {
            return Err(Error::invalid("repetitions", "must be at least 1"));
        }
        if self.population_cap == 0 {
            return Err(Error::invalid("population_cap", "must be at least 1"));
        }
        if self.workers == Some(0) {
            return Err(Error::invalid("workers", "must be at least 1"));
        }
        Ok(())
    }

    /// The full λ × repetition grid, λ-major.
    pub fn grid(&self) -> Vec<TrialSpec> {
        self.lambdas
            .iter()
            .enumerate()
            .flat_map(|(lambda_index, &lambda)| {
                (0..self.repetitions).map(move |repetition| (lambda_index, lambda, repetition))
            })
            .enumerate()
            .map(|(index, (lambda_index, lambda, repetition))| TrialSpec {
                index,
                lambda_index,
                lambda,
                repetition,
            })
            .collect()
    }

    /// Generator for one trial: shared seed, per-trial stream.
    pub fn trial_rng(&self, spec: &TrialSpec) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(spec.index as u64);
        rng
    }

    /// Run one lineage per grid point.
    pub fn run(&self) -> Result<Vec<TrialResult>> {
        self.validate()?;

        let runs = self
            .lambdas
            .iter()
            .map(|&lambda| {
                LineageRun::new(lambda, self.population_cap)
                    .map(|run| run.with_cap_check(self.cap_check))
            })
            .collect::<Result<Vec<_>>>()?;

        self.run_trials(|spec, rng| {
            let run = &runs[spec.lambda_index];
            let state = run.run(rng);
            debug_assert!(state.is_terminal());
            Ok(TrialResult::from_state(run.lambda(), spec.repetition, &state))
        })
    }

    /// Run every trial and summarise them per λ.
    ///
    /// The confidence level is checked together with the other parameters,
    /// before any trial is scheduled.
    pub fn estimate(&self, confidence: f64) -> Result<Vec<AggregateStatistic>> {
        check_confidence(confidence)?;
        self.validate()?;

        let results = self.run()?;
        aggregate(&results, confidence)
    }

    /// Execute `trial` for every grid point on the worker pool.
    ///
    /// The first failing trial aborts the experiment; no partial results are
    /// returned.
    pub fn run_trials<F>(&self, trial: F) -> Result<Vec<TrialResult>>
    where
        F: Fn(&TrialSpec, &mut ChaCha8Rng) -> Result<TrialResult> + Sync,
    {
        self.validate()?;

        let grid = self.grid();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers.unwrap_or(0))
            .build()?;

        log::info!(
            "Starting experiment: lambdas={}, repetitions={}, cap={}, trials={}, workers={}, seed={}",
            self.lambdas.len(),
            self.repetitions,
            self.population_cap,
            grid.len(),
            pool.current_num_threads(),
            self.seed
        );

        let start = Instant::now();
        let results: Result<Vec<TrialResult>> = pool.install(|| {
            grid.par_iter()
                .map(|spec| {
                    let mut rng = self.trial_rng(spec);
                    trial(spec, &mut rng).map_err(|e| trial_failure(spec, e))
                })
                .collect()
        });

        match &results {
            Ok(trials) => log::info!(
                "Experiment complete: {} trials in {:.3}s",
                trials.len(),
                start.elapsed().as_secs_f64()
            ),
            Err(e) => log::error!("Experiment aborted: {}", e),
        }

        results
    }
}

fn trial_failure(spec: &TrialSpec, error: Error) -> Error {
    match error {
        e @ Error::TrialExecution { .. } => e,
        other => Error::TrialExecution {
            lambda: spec.lambda,
            repetition: spec.repetition,
            reason: other.to_string(),
        },
    }
}

/// Run `repetitions` trials for every λ with default settings.
pub fn run_experiment(lambdas: &[f64], repetitions: usize, population_cap: u64) -> Result<Vec<TrialResult>> {
    Experiment::new(lambdas.to_vec(), repetitions, population_cap)?.run()
}

/// Inclusive λ grid `start, start + step, ..., end`.
///
/// Values are built by multiplication rather than repeated addition and
/// rounded to 12 decimals so that 1.0..=1.6 step 0.1 yields exactly seven
/// points with tidy values.
pub fn lambda_sweep(start: f64, end: f64, step: f64) -> Result<Vec<f64>> {
    check_lambda(start)?;
    if !end.is_finite() || end < start {
        return Err(Error::invalid(
            "lambda_end",
            format!("must be >= lambda_start ({}), got {}", start, end),
        ));
    }
    if !step.is_finite() || step <= 0.0 {
        return Err(Error::invalid(
            "lambda_step",
            format!("must be positive, got {}", step),
        ));
    }

    let points = ((end - start) / step + 1e-9).floor() as usize + 1;
    Ok((0..points)
        .map(|i| ((start + i as f64 * step) * 1e12).round() / 1e12)
        .collect())
}
