pub mod conditions;
pub mod deck;
pub mod engine;
pub mod hand;
pub mod mulligan;
pub mod report;

pub use conditions::{parse_condition_arg, Condition, ConditionError, ConditionSet};
pub use deck::{deck_summary, parse_deck, parse_deck_file, DeckError};
pub use engine::{simulate, SimulationError, SimulationParams, Simulator};
pub use hand::evaluate;
pub use mulligan::{resolve_mulligans, TrialOutcome};
pub use report::{ReportError, ResultTable, SimulationReport};
