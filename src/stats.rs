//! Aggregate statistics over completed trials.
//!
//! Trials are grouped by λ. For each group the survival probability is the
//! share of lineages that reached the population cap, bracketed by a Wilson
//! score interval, and the expected extinction time is the mean generation
//! count over the lineages that died out.

use crate::error::{check_confidence, check_lambda, Error, Result};
use crate::lineage::{Outcome, TrialResult};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt;

/// Survival statistics for one λ.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregateStatistic {
    pub lambda: f64,
    /// Number of trials at this λ
    pub trials: usize,
    /// Trials that reached the population cap
    pub survivors: usize,
    /// Trials whose population reached zero
    pub extinctions: usize,
    pub survival_probability: f64,
    pub confidence_low: f64,
    pub confidence_high: f64,
    /// Mean generations to extinction; `None` when nothing went extinct
    pub expected_extinction_time: Option<f64>,
}

impl AggregateStatistic {
    /// Compute statistics for a group of trials that share one λ.
    fn from_group(lambda: f64, group: &[&TrialResult], z: f64) -> Self {
        let trials = group.len();
        let survivors = group.iter().filter(|r| r.outcome == Outcome::CapBreached).count();

        let extinct_generations: Vec<u32> = group
            .iter()
            .filter(|r| r.outcome == Outcome::Extinct)
            .map(|r| r.generation)
            .collect();
        let extinctions = extinct_generations.len();

        let expected_extinction_time = if extinctions > 0 {
            let total: u64 = extinct_generations.iter().map(|&g| g as u64).sum();
            Some(total as f64 / extinctions as f64)
        } else {
            None
        };

        let (confidence_low, confidence_high) = wilson_bounds(survivors, trials, z);

        Self {
            lambda,
            trials,
            survivors,
            extinctions,
            survival_probability: survivors as f64 / trials as f64,
            confidence_low,
            confidence_high,
            expected_extinction_time,
        }
    }

    /// Half the width of the confidence interval.
    pub fn margin(&self) -> f64 {
        (self.confidence_high - self.confidence_low) / 2.0
    }

    pub fn extinction_time(&self) -> ExtinctionTime {
        ExtinctionTime(self.expected_extinction_time)
    }

    /// Format as a one-line summary
    pub fn summary(&self) -> String {
        format!(
            "λ:{:.2} | Trials:{:5} | Survival:{:.4} ±{:.4} [{:.4}, {:.4}] | Extinction time:{}",
            self.lambda,
            self.trials,
            self.survival_probability,
            self.margin(),
            self.confidence_low,
            self.confidence_high,
            self.extinction_time(),
        )
    }
}

/// Expected extinction time that renders a missing value as `undefined`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtinctionTime(pub Option<f64>);

impl fmt::Display for ExtinctionTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self.0 {
            Some(t) => format!("{:.*}", f.precision().unwrap_or(3), t),
            None => "undefined".to_string(),
        };
        match f.width() {
            Some(width) => write!(f, "{:>width$}", text, width = width),
            None => f.write_str(&text),
        }
    }
}

/// Two-sided standard normal quantile for `confidence`.
pub fn z_score(confidence: f64) -> Result<f64> {
    check_confidence(confidence)?;
    let normal = Normal::new(0.0, 1.0).map_err(|e| Error::invalid("confidence_level", e.to_string()))?;
    Ok(normal.inverse_cdf(1.0 - (1.0 - confidence) / 2.0))
}

/// Wilson score interval for `successes` out of `trials` Bernoulli draws.
pub fn wilson_interval(successes: usize, trials: usize, confidence: f64) -> Result<(f64, f64)> {
    let z = z_score(confidence)?;
    Ok(wilson_bounds(successes, trials, z))
}

fn wilson_bounds(successes: usize, trials: usize, z: f64) -> (f64, f64) {
    if trials == 0 {
        return (0.0, 1.0);
    }

    let n = trials as f64;
    let p = successes as f64 / n;
    let z2 = z * z;

    let denom = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denom;
    let half = z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / denom;

    // clamp to [0, 1] and keep the point estimate inside despite rounding
    let low = (center - half).max(0.0).min(p);
    let high = (center + half).min(1.0).max(p);
    (low, high)
}

/// Group trials by λ and compute statistics, ordered by ascending λ.
pub fn aggregate(results: &[TrialResult], confidence: f64) -> Result<Vec<AggregateStatistic>> {
    let z = z_score(confidence)?;
    for r in results {
        check_lambda(r.lambda)?;
    }

    let mut sorted: Vec<&TrialResult> = results.iter().collect();
    sorted.sort_by(|a, b| a.lambda.total_cmp(&b.lambda));

    let mut stats = Vec::new();
    let mut start = 0;
    while start < sorted.len() {
        let lambda = sorted[start].lambda;
        let end = start
            + sorted[start..]
                .iter()
                .take_while(|r| r.lambda == lambda)
                .count();

        let stat = AggregateStatistic::from_group(lambda, &sorted[start..end], z);
        log::debug!("{}", stat.summary());
        if stat.expected_extinction_time.is_none() {
            log::warn!(
                "No extinctions at lambda={} over {} trials; expected extinction time undefined",
                lambda,
                stat.trials
            );
        }

        stats.push(stat);
        start = end;
    }

    Ok(stats)
}

/// Survival probability of a Poisson(λ) Galton-Watson process.
///
/// Returns 1 - q, where q is the smallest fixed point of q = e^(λ(q - 1)).
/// Subcritical and critical processes die out with certainty.
pub fn theoretical_survival(lambda: f64) -> f64 {
    if !(lambda > 1.0) {
        return 0.0;
    }

    let mut q = 0.0f64;
    for _ in 0..100_000 {
        let next = (lambda * (q - 1.0)).exp();
        if (next - q).abs() < 1e-13 {
            q = next;
            break;
        }
        q = next;
    }
    1.0 - q
}
