//! Poisson offspring sampling.
//!
//! Each individual produces a Poisson(λ) number of descendants. Sampling uses
//! Knuth's multiplicative method, which is exact and fast for the small means
//! a branching sweep works with.

use crate::error::{check_lambda, Result};
use rand::Rng;

/// Poisson offspring law with mean `lambda`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoissonOffspring {
    lambda: f64,
    /// e^(-λ), the stopping threshold for the running product.
    threshold: f64,
}

impl PoissonOffspring {
    /// Create a sampler. Fails for λ <= 0 or non-finite λ.
    pub fn new(lambda: f64) -> Result<Self> {
        check_lambda(lambda)?;
        Ok(Self {
            lambda,
            threshold: (-lambda).exp(),
        })
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Draw one offspring count.
    #[inline]
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        let mut product = 1.0f64;
        let mut k = 0u64;
        loop {
            // gen::<f64>() is in [0, 1); flip it to (0, 1]
            let u = 1.0 - rng.gen::<f64>();
            product *= u;
            k += 1;
            if product <= self.threshold {
                return k - 1;
            }
        }
    }
}

/// A stream of offspring counts, one value per individual.
pub trait OffspringSource {
    fn next_count(&mut self) -> u64;
}

/// Poisson sampler bound to a random number generator.
pub struct PoissonSource<'a, R: Rng + ?Sized> {
    law: PoissonOffspring,
    rng: &'a mut R,
}

impl<'a, R: Rng + ?Sized> PoissonSource<'a, R> {
    pub fn new(law: PoissonOffspring, rng: &'a mut R) -> Self {
        Self { law, rng }
    }
}

impl<R: Rng + ?Sized> OffspringSource for PoissonSource<'_, R> {
    #[inline]
    fn next_count(&mut self) -> u64 {
        self.law.sample(self.rng)
    }
}

/// Replays a fixed sequence of offspring counts, then yields zeros.
#[derive(Debug, Clone)]
pub struct ScriptedOffspring {
    counts: Vec<u64>,
    cursor: usize,
}

impl ScriptedOffspring {
    pub fn new(counts: Vec<u64>) -> Self {
        Self { counts, cursor: 0 }
    }

    /// Number of counts consumed so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl OffspringSource for ScriptedOffspring {
    fn next_count(&mut self) -> u64 {
        let value = self.counts.get(self.cursor).copied().unwrap_or(0);
        self.cursor += 1;
        value
    }
}
