//! Single-lineage evolution.
//!
//! A lineage starts from one seed individual and is advanced one generation
//! at a time until it either dies out or its population reaches the cap.
//! Only the population count is tracked: every individual shares the same
//! offspring law, so identity carries no information.

use crate::error::{Error, Result};
use crate::offspring::{OffspringSource, PoissonOffspring, PoissonSource};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Terminal (or pending) state of a lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Population reached zero.
    Extinct,
    /// Population reached the cap; counted as survival.
    CapBreached,
    /// Still evolving.
    Undetermined,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::Undetermined)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Extinct => "extinct",
            Outcome::CapBreached => "cap_breached",
            Outcome::Undetermined => "undetermined",
        }
    }
}

/// When the population cap is compared against the generation being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapCheck {
    /// Check the running sum after every individual's draw and stop at the
    /// first individual that pushes it to the cap.
    #[default]
    Incremental,
    /// Sum the whole generation first, then compare. The reported population
    /// may overshoot the cap by up to one individual's offspring and more.
    Batch,
}

/// Immutable snapshot of a lineage after some number of generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineageState {
    pub population: u64,
    pub generation: u32,
    pub outcome: Outcome,
}

impl LineageState {
    /// One seed individual at generation zero.
    pub fn seed() -> Self {
        Self {
            population: 1,
            generation: 0,
            outcome: Outcome::Undetermined,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_terminal()
    }
}

/// Advance a lineage by one generation.
///
/// Terminal states are returned unchanged. A breach or an extinction is
/// attributed to the generation being assembled.
pub fn step<S>(state: LineageState, cap: u64, cap_check: CapCheck, source: &mut S) -> LineageState
where
    S: OffspringSource + ?Sized,
{
    if state.is_terminal() {
        return state;
    }

    let generation = state.generation + 1;
    let mut next = 0u64;

    for _ in 0..state.population {
        next = next.saturating_add(source.next_count());
        if cap_check == CapCheck::Incremental && next >= cap {
            return LineageState {
                population: next,
                generation,
                outcome: Outcome::CapBreached,
            };
        }
    }

    let outcome = if next == 0 {
        Outcome::Extinct
    } else if next >= cap {
        Outcome::CapBreached
    } else {
        Outcome::Undetermined
    };

    LineageState {
        population: next,
        generation,
        outcome,
    }
}

/// Configuration of a single lineage run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineageRun {
    law: PoissonOffspring,
    cap: u64,
    cap_check: CapCheck,
}

impl LineageRun {
    /// Create a run for mean offspring `lambda` and population cap `cap`.
    pub fn new(lambda: f64, cap: u64) -> Result<Self> {
        if cap == 0 {
            return Err(Error::invalid("population_cap", "must be at least 1"));
        }
        Ok(Self {
            law: PoissonOffspring::new(lambda)?,
            cap,
            cap_check: CapCheck::default(),
        })
    }

    pub fn with_cap_check(mut self, cap_check: CapCheck) -> Self {
        self.cap_check = cap_check;
        self
    }

    pub fn lambda(&self) -> f64 {
        self.law.lambda()
    }

    pub fn cap(&self) -> u64 {
        self.cap
    }

    /// Run to a terminal state drawing Poisson offspring from `rng`.
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> LineageState {
        let mut source = PoissonSource::new(self.law, rng);
        self.run_with(&mut source)
    }

    /// Run to a terminal state using an arbitrary offspring stream.
    pub fn run_with<S: OffspringSource + ?Sized>(&self, source: &mut S) -> LineageState {
        let mut state = LineageState::seed();
        while !state.is_terminal() {
            state = step(state, self.cap, self.cap_check, source);
        }
        state
    }

    /// Every state from the seed to the terminal one, inclusive.
    pub fn trajectory<S: OffspringSource + ?Sized>(&self, source: &mut S) -> Vec<LineageState> {
        let mut state = LineageState::seed();
        let mut states = vec![state];
        while !state.is_terminal() {
            state = step(state, self.cap, self.cap_check, source);
            states.push(state);
        }
        states
    }
}

/// Outcome of one completed trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub lambda: f64,
    /// Repetition index within the λ group.
    pub repetition: usize,
    pub outcome: Outcome,
    /// Generations elapsed when the terminal state was reached.
    pub generation: u32,
}

impl TrialResult {
    pub fn from_state(lambda: f64, repetition: usize, state: &LineageState) -> Self {
        Self {
            lambda,
            repetition,
            outcome: state.outcome,
            generation: state.generation,
        }
    }

    pub fn survived(&self) -> bool {
        self.outcome == Outcome::CapBreached
    }
}

/// Run one lineage with mean `lambda` and cap `cap`.
pub fn run_lineage<R: Rng + ?Sized>(lambda: f64, cap: u64, rng: &mut R) -> Result<TrialResult> {
    let run = LineageRun::new(lambda, cap)?;
    let state = run.run(rng);
    Ok(TrialResult::from_state(lambda, 0, &state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offspring::ScriptedOffspring;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_seed_state() {
        let seed = LineageState::seed();
        assert_eq!(seed.population, 1);
        assert_eq!(seed.generation, 0);
        assert_eq!(seed.outcome, Outcome::Undetermined);
    }

    #[test]
    fn test_rejects_zero_cap() {
        assert!(LineageRun::new(1.2, 0).is_err());
        assert!(LineageRun::new(0.0, 10).is_err());
    }

    #[test]
    fn test_run_parameters() {
        let run = LineageRun::new(1.3, 250).unwrap().with_cap_check(CapCheck::Batch);
        assert_eq!(run.lambda(), 1.3);
        assert_eq!(run.cap(), 250);
    }

    #[test]
    fn test_extinction_generation() {
        // 1 -> 2 -> 1 -> 0
        let run = LineageRun::new(1.0, 100).unwrap();
        let mut source = ScriptedOffspring::new(vec![2, 1, 0, 0]);
        let end = run.run_with(&mut source);

        assert_eq!(end.outcome, Outcome::Extinct);
        assert_eq!(end.population, 0);
        assert_eq!(end.generation, 3);
    }

    #[test]
    fn test_incremental_cap_stops_early() {
        let run = LineageRun::new(1.5, 5).unwrap();
        // generation 1: seed has 3 children; generation 2: 2 + 3 reaches the cap
        let mut source = ScriptedOffspring::new(vec![3, 2, 3, 4]);
        let end = run.run_with(&mut source);

        assert_eq!(end.outcome, Outcome::CapBreached);
        assert_eq!(end.generation, 2);
        assert_eq!(end.population, 5);
        // third individual of generation 1 never drew
        assert_eq!(source.consumed(), 3);
    }

    #[test]
    fn test_batch_cap_sums_whole_generation() {
        let run = LineageRun::new(1.5, 5)
            .unwrap()
            .with_cap_check(CapCheck::Batch);
        let mut source = ScriptedOffspring::new(vec![3, 2, 3, 4]);
        let end = run.run_with(&mut source);

        assert_eq!(end.outcome, Outcome::CapBreached);
        assert_eq!(end.generation, 2);
        assert_eq!(end.population, 9);
        assert_eq!(source.consumed(), 4);
    }

    #[test]
    fn test_unit_cap_terminates_in_one_step() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for cap_check in [CapCheck::Incremental, CapCheck::Batch] {
            let run = LineageRun::new(1.3, 1).unwrap().with_cap_check(cap_check);
            for _ in 0..1000 {
                let end = run.run(&mut rng);
                assert!(end.is_terminal());
                assert_eq!(end.generation, 1);
            }
        }
    }

    #[test]
    fn test_vanishing_lambda_goes_extinct_at_first_generation() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let run = LineageRun::new(1e-12, 1000).unwrap();
        for _ in 0..1000 {
            let end = run.run(&mut rng);
            assert_eq!(end.outcome, Outcome::Extinct);
            assert_eq!(end.generation, 1);
        }
    }

    #[test]
    fn test_replay_is_deterministic() {
        let run = LineageRun::new(1.4, 50).unwrap();
        let script = vec![2, 3, 0, 1, 2, 2, 0, 4, 1, 3, 2, 2, 5, 1, 0, 3, 2, 4, 1, 2];

        let first = run.trajectory(&mut ScriptedOffspring::new(script.clone()));
        let second = run.trajectory(&mut ScriptedOffspring::new(script));

        assert_eq!(first, second);
        assert!(first.last().unwrap().is_terminal());
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let run = LineageRun::new(1.2, 1000).unwrap();
        let a = run.trajectory(&mut PoissonSource::new(
            PoissonOffspring::new(1.2).unwrap(),
            &mut ChaCha8Rng::seed_from_u64(99),
        ));
        let b = run.trajectory(&mut PoissonSource::new(
            PoissonOffspring::new(1.2).unwrap(),
            &mut ChaCha8Rng::seed_from_u64(99),
        ));
        assert_eq!(a, b);
    }

    #[test]
    fn test_intermediate_states_respect_invariant() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let run = LineageRun::new(1.5, 200).unwrap();
        let mut source = PoissonSource::new(PoissonOffspring::new(1.5).unwrap(), &mut rng);
        let states = run.trajectory(&mut source);

        for state in &states[1..] {
            let live = state.population > 0 && state.population < 200;
            assert_eq!(state.outcome == Outcome::Undetermined, live);
        }
        for pair in states.windows(2) {
            assert_eq!(pair[1].generation, pair[0].generation + 1);
        }
    }

    #[test]
    fn test_step_leaves_terminal_state_alone() {
        let done = LineageState {
            population: 0,
            generation: 4,
            outcome: Outcome::Extinct,
        };
        let mut source = ScriptedOffspring::new(vec![10]);
        assert_eq!(step(done, 10, CapCheck::Incremental, &mut source), done);
        assert_eq!(source.consumed(), 0);
    }

    #[test]
    fn test_run_lineage_reports_lambda() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let result = run_lineage(1.1, 100, &mut rng).unwrap();
        assert_eq!(result.lambda, 1.1);
        assert!(result.outcome.is_terminal());
        assert!(run_lineage(-1.0, 100, &mut rng).is_err());
    }
}
