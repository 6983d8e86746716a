use crate::card::Card;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid deck format at line {line}: {reason}")]
    InvalidFormat { line: usize, reason: String },
}

/// Parse a deck list and return expanded list of cards
/// Format: "COUNT,NAME,TYPE TYPE ..." per line, supports comments with # or //
pub fn parse_deck(content: &str) -> Result<Vec<Card>, DeckError> {
    let mut deck = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        // Skip empty lines and comments
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
            continue;
        }

        let mut parts = trimmed.splitn(3, ',');
        let count_str = parts.next().unwrap_or_default().trim();
        let card_name = match parts.next() {
            Some(name) if !name.trim().is_empty() => name.trim(),
            _ => {
                return Err(DeckError::InvalidFormat {
                    line: line_num + 1,
                    reason: "Expected format: 'COUNT,CARD_NAME,TYPES'".to_string(),
                })
            }
        };

        let count: usize = count_str.parse().map_err(|_| DeckError::InvalidFormat {
            line: line_num + 1,
            reason: format!("'{}' is not a valid number", count_str),
        })?;

        // Stray commas among the tags count as separators
        let types: Vec<String> = parts
            .next()
            .unwrap_or_default()
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        let card = Card {
            name: card_name.to_string(),
            types,
        };

        // Add card 'count' times
        for _ in 0..count {
            deck.push(card.clone());
        }
    }

    Ok(deck)
}

/// Read and parse a deck list file
pub fn parse_deck_file(path: &str) -> Result<Vec<Card>, DeckError> {
    let content = std::fs::read_to_string(path)?;
    parse_deck(&content)
}

/// Number of cards in the deck carrying each type tag
pub fn deck_summary(deck: &[Card]) -> BTreeMap<String, usize> {
    let mut summary = BTreeMap::new();
    for card in deck {
        for tag in card.types() {
            *summary.entry(tag.clone()).or_insert(0) += 1;
        }
    }
    summary
}
