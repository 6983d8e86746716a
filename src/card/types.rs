use serde::{Deserialize, Serialize};

/// A card as far as hand composition is concerned: a name and its type tags.
///
/// Two cards with the same name and tags are interchangeable; a deck holds one
/// `Card` per physical copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

impl Card {
    pub fn new<S: Into<String>>(name: S, types: &[&str]) -> Self {
        Card {
            name: name.into(),
            types: types.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }

    /// How many of the card's tags equal `tag` (exact, case-sensitive).
    /// A tag listed twice counts twice.
    pub fn type_count(&self, tag: &str) -> u32 {
        self.types.iter().filter(|t| *t == tag).count() as u32
    }
}
