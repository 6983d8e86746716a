pub mod card;
pub mod rng;
pub mod simulation;
