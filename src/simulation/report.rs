use crate::simulation::conditions::ConditionSet;
use crate::simulation::engine::SimulationParams;
use crate::simulation::mulligan::TrialOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Success counts gathered while running trials. Tallies from separate
/// workers combine with [`Tally::merge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    /// Indexed by the hand size that first met the conditions
    satisfied_at: Vec<usize>,
    never_satisfied: usize,
}

impl Tally {
    pub fn new(params: &SimulationParams) -> Self {
        Tally {
            satisfied_at: vec![0; params.start_hand_size + 1],
            never_satisfied: 0,
        }
    }

    #[inline]
    pub fn record(&mut self, outcome: TrialOutcome) {
        match outcome {
            TrialOutcome::Satisfied { hand_size } => self.satisfied_at[hand_size] += 1,
            TrialOutcome::NeverSatisfied => self.never_satisfied += 1,
        }
    }

    pub fn merge(mut self, other: Tally) -> Tally {
        if other.satisfied_at.len() > self.satisfied_at.len() {
            self.satisfied_at.resize(other.satisfied_at.len(), 0);
        }
        for (count, extra) in self.satisfied_at.iter_mut().zip(other.satisfied_at) {
            *count += extra;
        }
        self.never_satisfied += other.never_satisfied;
        self
    }

    pub fn trials(&self) -> usize {
        self.satisfied_at.iter().sum::<usize>() + self.never_satisfied
    }

    pub fn never_satisfied(&self) -> usize {
        self.never_satisfied
    }

    /// Trials that succeeded, keyed by the hand size they kept
    pub fn outcomes(&self) -> BTreeMap<usize, usize> {
        self.satisfied_at
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(size, count)| (size, *count))
            .collect()
    }

    /// Normalize into cumulative success probabilities per tracked bucket.
    /// A trial that succeeded with `h` cards counts toward every bucket `>= h`.
    pub fn result_table(&self, params: &SimulationParams) -> ResultTable {
        let trials = params.trials as f64;
        let probabilities = params
            .buckets()
            .map(|bucket| {
                let successes: usize = self
                    .satisfied_at
                    .iter()
                    .take(bucket + 1)
                    .sum();
                (bucket, successes as f64 / trials)
            })
            .collect();
        ResultTable { probabilities }
    }
}

/// Probability that the conditions were met by the time `bucket` cards were seen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultTable {
    probabilities: BTreeMap<usize, f64>,
}

impl ResultTable {
    pub fn get(&self, bucket: usize) -> Option<f64> {
        self.probabilities.get(&bucket).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.probabilities.iter().map(|(k, v)| (*k, *v))
    }

    pub fn buckets(&self) -> impl Iterator<Item = usize> + '_ {
        self.probabilities.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    /// Probability at the largest tracked bucket
    pub fn final_probability(&self) -> Option<f64> {
        self.probabilities.values().next_back().copied()
    }
}

impl fmt::Display for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (bucket, p) in self.iter() {
            let pct = p * 100.0;
            let bar = "█".repeat((pct / 2.0) as usize);
            writeln!(f, "  After {:2} cards: {:6.2}% {}", bucket, pct, bar)?;
        }
        Ok(())
    }
}

/// Everything one simulation run produced, ready to print or save
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub params: SimulationParams,
    pub conditions: ConditionSet,
    pub deck_size: usize,
    pub seed: u64,
    pub results: ResultTable,
    /// Successful trials keyed by the hand size they kept
    pub outcomes: BTreeMap<usize, usize>,
    pub never_satisfied: usize,
    pub elapsed_secs: f64,
    pub generated_at: DateTime<Utc>,
}

impl SimulationReport {
    pub fn trials(&self) -> usize {
        self.params.trials
    }

    /// Fraction of trials that needed exactly `mulligans` mulligans to succeed
    pub fn mulligan_rate(&self, mulligans: usize) -> f64 {
        let Some(hand_size) = self.params.start_hand_size.checked_sub(mulligans) else {
            return 0.0;
        };
        let count = self.outcomes.get(&hand_size).copied().unwrap_or(0);
        count as f64 / self.trials() as f64
    }

    /// Throughput of the run; `None` when it finished below timer resolution
    pub fn trials_per_sec(&self) -> Option<f64> {
        (self.elapsed_secs > 0.0).then(|| self.trials() as f64 / self.elapsed_secs)
    }

    pub fn save_to_file(&self, path: &str) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn from_json_file(path: &str) -> Result<Self, ReportError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Conditions: {}", self.conditions)?;
        writeln!(
            f,
            "Hand size: {}, mulligans allowed: {}, trials: {}",
            self.params.start_hand_size, self.params.max_mulligans, self.params.trials
        )?;
        writeln!(f)?;
        writeln!(f, "Success rate:")?;
        write!(f, "{}", self.results)?;
        writeln!(f)?;
        writeln!(f, "Kept hands:")?;
        for (hand_size, count) in self.outcomes.iter().rev() {
            let pct = *count as f64 / self.trials() as f64 * 100.0;
            writeln!(f, "  {} cards: {:6.2}% ({})", hand_size, pct, count)?;
        }
        let pct = self.never_satisfied as f64 / self.trials() as f64 * 100.0;
        writeln!(f, "  Never:   {:6.2}% ({})", pct, self.never_satisfied)
    }
}
