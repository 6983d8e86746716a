use crate::card::Card;
use crate::rng::RandomSource;
use crate::simulation::conditions::ConditionSet;
use crate::simulation::hand::{draw, evaluate};
use std::borrow::Borrow;

/// What happened in a single trial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialOutcome {
    /// Conditions were met with a hand of this many cards
    Satisfied { hand_size: usize },
    /// Every attempt within the mulligan budget failed
    NeverSatisfied,
}

impl TrialOutcome {
    pub fn hand_size(&self) -> Option<usize> {
        match self {
            TrialOutcome::Satisfied { hand_size } => Some(*hand_size),
            TrialOutcome::NeverSatisfied => None,
        }
    }

    pub fn is_satisfied(&self) -> bool {
        matches!(self, TrialOutcome::Satisfied { .. })
    }
}

/// Draw an opening hand and mulligan until the conditions hold or the budget runs out.
///
/// Attempt `m` reshuffles the whole library and looks at the top
/// `start_hand_size - m` cards. Cards from a failed hand are not kept out of
/// the next draw. Callers must ensure `max_mulligans < start_hand_size` and
/// that the library holds at least `start_hand_size` cards.
pub fn resolve_mulligans<C: Borrow<Card>, R: RandomSource>(
    library: &mut [C],
    conditions: &ConditionSet,
    start_hand_size: usize,
    max_mulligans: usize,
    rng: &mut R,
) -> TrialOutcome {
    for mulligan_count in 0..=max_mulligans {
        let hand_size = start_hand_size - mulligan_count;
        rng.shuffle(library);
        if evaluate(draw(library, hand_size), conditions) {
            return TrialOutcome::Satisfied { hand_size };
        }
    }
    TrialOutcome::NeverSatisfied
}
