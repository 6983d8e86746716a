use crate::card::Card;
use crate::rng::{random_seed, GameRng, RandomSource};
use crate::simulation::conditions::{ConditionError, ConditionSet};
use crate::simulation::mulligan::resolve_mulligans;
use crate::simulation::report::{ResultTable, SimulationReport, Tally};
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

pub const DEFAULT_HAND_SIZE: usize = 7;
pub const DEFAULT_MULLIGANS: usize = 1;
pub const DEFAULT_TRIALS: usize = 100_000;
pub const DEFAULT_TRACKED_EXTRA: usize = 3;
/// Widest bucket window a report may ask for
pub const MAX_TRACKED_EXTRA: usize = 1024;

/// Trials handed to a worker at a time
const CHUNK_SIZE: usize = 1024;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Trial count must be positive")]
    InvalidTrialCount,
    #[error("Starting hand size must be at least 1")]
    InvalidHandSize,
    #[error("{max_mulligans} mulligans would shrink a {start_hand_size} card hand to nothing")]
    MulliganBudgetTooLarge {
        start_hand_size: usize,
        max_mulligans: usize,
    },
    #[error("Cannot report {tracked_extra} hand sizes past {start_hand_size} (at most {max})", max = MAX_TRACKED_EXTRA)]
    InvalidTrackedWindow {
        start_hand_size: usize,
        tracked_extra: usize,
    },
    #[error("Invalid condition: {0}")]
    InvalidCondition(#[from] ConditionError),
    #[error("Deck has {deck_size} cards but hands of {required} cards are drawn")]
    InsufficientDeck { deck_size: usize, required: usize },
    #[error("Simulation cancelled")]
    Cancelled,
}

/// Knobs for a simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Cards in the first hand; each mulligan draws one fewer
    pub start_hand_size: usize,
    pub max_mulligans: usize,
    pub trials: usize,
    /// Buckets reported past the starting hand size
    pub tracked_extra: usize,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            start_hand_size: DEFAULT_HAND_SIZE,
            max_mulligans: DEFAULT_MULLIGANS,
            trials: DEFAULT_TRIALS,
            tracked_extra: DEFAULT_TRACKED_EXTRA,
        }
    }
}

impl SimulationParams {
    /// Hand sizes reported in the result table
    pub fn buckets(&self) -> RangeInclusive<usize> {
        self.start_hand_size..=self.start_hand_size.saturating_add(self.tracked_extra)
    }

    /// Check the parameters, the conditions and the deck before any trial runs
    pub fn validate(&self, deck: &[Card], conditions: &ConditionSet) -> Result<(), SimulationError> {
        if self.trials == 0 {
            return Err(SimulationError::InvalidTrialCount);
        }
        if self.start_hand_size == 0 {
            return Err(SimulationError::InvalidHandSize);
        }
        if self.max_mulligans >= self.start_hand_size {
            return Err(SimulationError::MulliganBudgetTooLarge {
                start_hand_size: self.start_hand_size,
                max_mulligans: self.max_mulligans,
            });
        }
        if self.tracked_extra > MAX_TRACKED_EXTRA
            || self.start_hand_size.checked_add(self.tracked_extra).is_none()
        {
            return Err(SimulationError::InvalidTrackedWindow {
                start_hand_size: self.start_hand_size,
                tracked_extra: self.tracked_extra,
            });
        }
        conditions.validate()?;
        if deck.len() < self.start_hand_size {
            return Err(SimulationError::InsufficientDeck {
                deck_size: deck.len(),
                required: self.start_hand_size,
            });
        }
        Ok(())
    }
}

/// Run every trial sequentially on one random source.
///
/// The deck is never modified; trials shuffle a working copy that is reset
/// before each trial.
pub fn simulate<R: RandomSource>(
    deck: &[Card],
    conditions: &ConditionSet,
    params: &SimulationParams,
    rng: &mut R,
) -> Result<ResultTable, SimulationError> {
    params.validate(deck, conditions)?;

    let pristine: Vec<&Card> = deck.iter().collect();
    let mut library = pristine.clone();
    let mut tally = Tally::new(params);

    for _ in 0..params.trials {
        library.copy_from_slice(&pristine);
        tally.record(resolve_mulligans(
            &mut library,
            conditions,
            params.start_hand_size,
            params.max_mulligans,
            rng,
        ));
    }

    Ok(tally.result_table(params))
}

/// Parallel simulation across the rayon thread pool.
///
/// Trial `i` draws from its own `GameRng` seeded with `seed + i`, so a seeded
/// run gives the same report however the trials are scheduled.
pub struct Simulator<'a> {
    deck: &'a [Card],
    conditions: &'a ConditionSet,
    params: SimulationParams,
    seed: Option<u64>,
    cancel: Option<Arc<AtomicBool>>,
    progress: Option<ProgressBar>,
}

impl<'a> Simulator<'a> {
    pub fn new(deck: &'a [Card], conditions: &'a ConditionSet, params: SimulationParams) -> Self {
        Simulator {
            deck,
            conditions,
            params,
            seed: None,
            cancel: None,
            progress: None,
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Abort between trials once the flag is set
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Advance the bar as chunks of trials finish
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn run(&self) -> Result<SimulationReport, SimulationError> {
        self.params.validate(self.deck, self.conditions)?;

        let seed = self.seed.unwrap_or_else(random_seed);
        let chunks = self.params.trials.div_ceil(CHUNK_SIZE);
        log::debug!(
            "running {} trials in {} chunks (seed {}, deck {} cards, conditions {})",
            self.params.trials,
            chunks,
            seed,
            self.deck.len(),
            self.conditions
        );

        let start = Instant::now();
        let tally = (0..chunks)
            .into_par_iter()
            .map(|chunk| self.run_chunk(chunk, seed))
            .try_reduce(|| Tally::new(&self.params), |a, b| Ok(a.merge(b)))?;
        let elapsed = start.elapsed();

        let report = SimulationReport {
            params: self.params,
            conditions: self.conditions.clone(),
            deck_size: self.deck.len(),
            seed,
            results: tally.result_table(&self.params),
            outcomes: tally.outcomes(),
            never_satisfied: tally.never_satisfied(),
            elapsed_secs: elapsed.as_secs_f64(),
            generated_at: chrono::Utc::now(),
        };
        match report.trials_per_sec() {
            Some(rate) => log::info!(
                "{} trials in {:.2?} ({:.0} trials/sec)",
                self.params.trials,
                elapsed,
                rate
            ),
            None => log::info!("{} trials in {:.2?}", self.params.trials, elapsed),
        }
        Ok(report)
    }

    fn run_chunk(&self, chunk: usize, seed: u64) -> Result<Tally, SimulationError> {
        let first = chunk * CHUNK_SIZE;
        let last = (first + CHUNK_SIZE).min(self.params.trials);

        let pristine: Vec<&Card> = self.deck.iter().collect();
        let mut library = pristine.clone();
        let mut tally = Tally::new(&self.params);

        for trial in first..last {
            if self.is_cancelled() {
                return Err(SimulationError::Cancelled);
            }
            library.copy_from_slice(&pristine);
            let mut rng = GameRng::new(Some(seed.wrapping_add(trial as u64)));
            tally.record(resolve_mulligans(
                &mut library,
                self.conditions,
                self.params.start_hand_size,
                self.params.max_mulligans,
                &mut rng,
            ));
        }

        if let Some(progress) = &self.progress {
            progress.inc((last - first) as u64);
        }
        Ok(tally)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::conditions::Condition;

    fn lands_and_spells(lands: usize, spells: usize) -> Vec<Card> {
        let mut deck = vec![Card::new("Forest", &["Land"]); lands];
        deck.extend(vec![Card::new("Opt", &["Spell"]); spells]);
        deck
    }

    fn params(trials: usize, max_mulligans: usize) -> SimulationParams {
        SimulationParams {
            trials,
            max_mulligans,
            ..SimulationParams::default()
        }
    }

    #[test]
    fn test_default_params() {
        let params = SimulationParams::default();
        assert_eq!(params.start_hand_size, 7);
        assert_eq!(params.buckets(), 7..=10);
    }

    #[test]
    fn test_rejects_zero_trials() {
        let deck = lands_and_spells(10, 10);
        let result = simulate(&deck, &ConditionSet::new(), &params(0, 0), &mut GameRng::new(Some(1)));
        assert!(matches!(result, Err(SimulationError::InvalidTrialCount)));
    }

    #[test]
    fn test_rejects_zero_hand_size() {
        let deck = lands_and_spells(10, 10);
        let params = SimulationParams {
            start_hand_size: 0,
            max_mulligans: 0,
            ..SimulationParams::default()
        };
        let result = params.validate(&deck, &ConditionSet::new());
        assert!(matches!(result, Err(SimulationError::InvalidHandSize)));
    }

    #[test]
    fn test_rejects_mulligan_to_zero() {
        let deck = lands_and_spells(10, 10);
        let result = params(10, 7).validate(&deck, &ConditionSet::new());
        assert!(matches!(
            result,
            Err(SimulationError::MulliganBudgetTooLarge { start_hand_size: 7, max_mulligans: 7 })
        ));
        assert!(params(10, 6).validate(&deck, &ConditionSet::new()).is_ok());
    }

    #[test]
    fn test_rejects_oversized_tracked_window() {
        let deck = lands_and_spells(10, 10);
        let overflowing = SimulationParams {
            tracked_extra: usize::MAX,
            ..params(10, 0)
        };
        let result = simulate(&deck, &ConditionSet::new(), &overflowing, &mut GameRng::new(Some(1)));
        assert!(matches!(
            result,
            Err(SimulationError::InvalidTrackedWindow { start_hand_size: 7, tracked_extra: usize::MAX })
        ));

        let huge = SimulationParams {
            tracked_extra: 10_000_000_000,
            ..params(10, 0)
        };
        let result = Simulator::new(&deck, &ConditionSet::new(), huge).run();
        assert!(matches!(result, Err(SimulationError::InvalidTrackedWindow { .. })));

        let widest = SimulationParams {
            tracked_extra: MAX_TRACKED_EXTRA,
            ..params(10, 0)
        };
        let table = simulate(&deck, &ConditionSet::new(), &widest, &mut GameRng::new(Some(1)))
            .expect("widest window is allowed");
        assert_eq!(table.len(), MAX_TRACKED_EXTRA + 1);
        assert_eq!(widest.buckets(), 7..=7 + MAX_TRACKED_EXTRA);
    }

    #[test]
    fn test_rejects_inverted_condition() {
        let deck = lands_and_spells(10, 10);
        let conditions = ConditionSet::new().with("Land", Condition::between(4, 2));
        let result = Simulator::new(&deck, &conditions, params(10, 0)).run();
        assert!(matches!(result, Err(SimulationError::InvalidCondition(_))));
    }

    #[test]
    fn test_rejects_short_deck() {
        let deck = lands_and_spells(3, 3);
        let result = Simulator::new(&deck, &ConditionSet::new(), params(10, 0)).run();
        match result {
            Err(SimulationError::InsufficientDeck { deck_size, required }) => {
                assert_eq!(deck_size, 6);
                assert_eq!(required, 7);
            }
            other => panic!("expected InsufficientDeck, got {:?}", other.map(|r| r.results)),
        }
        let empty: Vec<Card> = Vec::new();
        let result = simulate(&empty, &ConditionSet::new(), &params(10, 0), &mut GameRng::new(None));
        assert!(matches!(result, Err(SimulationError::InsufficientDeck { deck_size: 0, .. })));
    }

    #[test]
    fn test_deck_exactly_hand_size() {
        let deck = lands_and_spells(3, 4);
        let conditions = ConditionSet::new().with("Land", Condition::exactly(3));
        let table = simulate(&deck, &conditions, &params(100, 0), &mut GameRng::new(Some(3)))
            .expect("valid configuration");
        assert_eq!(table.get(7), Some(1.0));
    }

    #[test]
    fn test_sequential_empty_conditions() {
        let deck = lands_and_spells(10, 10);
        let table = simulate(&deck, &ConditionSet::new(), &params(1000, 2), &mut GameRng::new(Some(5)))
            .expect("valid configuration");
        assert_eq!(table.len(), 4);
        for (_, p) in table.iter() {
            assert_eq!(p, 1.0);
        }
    }

    #[test]
    fn test_deck_not_mutated() {
        let deck = lands_and_spells(10, 10);
        let before = deck.clone();
        let conditions = ConditionSet::new().with("Land", Condition::between(2, 4));
        simulate(&deck, &conditions, &params(500, 1), &mut GameRng::new(Some(8))).expect("valid");
        Simulator::new(&deck, &conditions, params(500, 1))
            .with_seed(Some(8))
            .run()
            .expect("valid");
        assert_eq!(deck, before);
    }

    #[test]
    fn test_seeded_run_is_reproducible() {
        let deck = lands_and_spells(17, 23);
        let conditions = ConditionSet::new().with("Land", Condition::between(2, 4));

        let a = Simulator::new(&deck, &conditions, params(5000, 2)).with_seed(Some(99)).run().unwrap();
        let b = Simulator::new(&deck, &conditions, params(5000, 2)).with_seed(Some(99)).run().unwrap();
        assert_eq!(a.results, b.results);
        assert_eq!(a.outcomes, b.outcomes);
        assert_eq!(a.seed, 99);
    }

    #[test]
    fn test_cancelled_run() {
        let deck = lands_and_spells(10, 10);
        let conditions = ConditionSet::new();
        let cancel = Arc::new(AtomicBool::new(true));
        let result = Simulator::new(&deck, &conditions, params(10_000, 0))
            .with_cancel_flag(cancel)
            .run();
        assert!(matches!(result, Err(SimulationError::Cancelled)));
    }

    #[test]
    fn test_progress_counts_every_trial() {
        let deck = lands_and_spells(10, 10);
        let conditions = ConditionSet::new();
        let progress = ProgressBar::hidden();
        Simulator::new(&deck, &conditions, params(3000, 0))
            .with_seed(Some(1))
            .with_progress(progress.clone())
            .run()
            .expect("valid configuration");
        assert_eq!(progress.position(), 3000);
    }

    #[test]
    fn test_outcomes_sum_to_trials() {
        let deck = lands_and_spells(12, 28);
        let conditions = ConditionSet::new().with("Land", Condition::between(3, 3));
        let report = Simulator::new(&deck, &conditions, params(4321, 3))
            .with_seed(Some(17))
            .run()
            .unwrap();
        let kept: usize = report.outcomes.values().sum();
        assert_eq!(kept + report.never_satisfied, 4321);
        assert!(report.outcomes.keys().all(|size| (4..=7).contains(size)));
    }
}
