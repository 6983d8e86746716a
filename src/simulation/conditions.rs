use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConditionError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Condition on '{tag}' has min {min} greater than max {max}")]
    InvalidRange { tag: String, min: u32, max: u32 },
    #[error("Invalid condition '{0}': expected TYPE:MIN-MAX, TYPE:MIN+ or TYPE:N")]
    InvalidSyntax(String),
}

/// Inclusive count range a type tag must fall in. `max: None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub min: u32,
    #[serde(default)]
    pub max: Option<u32>,
}

impl Condition {
    pub fn between(min: u32, max: u32) -> Self {
        Condition { min, max: Some(max) }
    }

    pub fn at_least(min: u32) -> Self {
        Condition { min, max: None }
    }

    pub fn exactly(n: u32) -> Self {
        Condition::between(n, n)
    }

    #[inline]
    pub fn accepts(&self, count: u32) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{}", max),
            Some(max) => write!(f, "{}-{}", self.min, max),
            None => write!(f, "{}+", self.min),
        }
    }
}

impl FromStr for Condition {
    type Err = ConditionError;

    /// Parses "2-4", "3+" or "1"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let number = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| ConditionError::InvalidSyntax(s.to_string()))
        };

        if let Some(min) = s.strip_suffix('+') {
            Ok(Condition::at_least(number(min)?))
        } else if let Some((min, max)) = s.split_once('-') {
            Ok(Condition::between(number(min)?, number(max)?))
        } else {
            Ok(Condition::exactly(number(s)?))
        }
    }
}

/// Per-type count requirements a hand must meet, keyed by type tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionSet {
    conditions: BTreeMap<String, Condition>,
}

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the condition on a type tag
    pub fn insert<S: Into<String>>(&mut self, tag: S, condition: Condition) -> Option<Condition> {
        self.conditions.insert(tag.into(), condition)
    }

    pub fn with<S: Into<String>>(mut self, tag: S, condition: Condition) -> Self {
        self.insert(tag, condition);
        self
    }

    pub fn get(&self, tag: &str) -> Option<&Condition> {
        self.conditions.get(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.conditions.iter().map(|(tag, c)| (tag.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Reject ranges whose minimum exceeds their maximum
    pub fn validate(&self) -> Result<(), ConditionError> {
        for (tag, condition) in self.iter() {
            if let Some(max) = condition.max {
                if condition.min > max {
                    return Err(ConditionError::InvalidRange {
                        tag: tag.to_string(),
                        min: condition.min,
                        max,
                    });
                }
            }
        }
        Ok(())
    }

    /// Load a condition set saved as a JSON object of tag -> {min, max}
    pub fn from_json_file(path: &str) -> Result<Self, ConditionError> {
        let content = std::fs::read_to_string(path)?;
        let set: ConditionSet = serde_json::from_str(&content)?;
        set.validate()?;
        Ok(set)
    }

    pub fn save_to_file(&self, path: &str) -> Result<(), ConditionError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl fmt::Display for ConditionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(none)");
        }
        let items: Vec<String> = self
            .iter()
            .map(|(tag, condition)| format!("{}: {}", tag, condition))
            .collect();
        write!(f, "{}", items.join(", "))
    }
}

/// Parse a command-line condition of the form "TYPE:RANGE"
pub fn parse_condition_arg(arg: &str) -> Result<(String, Condition), ConditionError> {
    let (tag, range) = arg
        .rsplit_once(':')
        .ok_or_else(|| ConditionError::InvalidSyntax(arg.to_string()))?;
    let tag = tag.trim();
    if tag.is_empty() {
        return Err(ConditionError::InvalidSyntax(arg.to_string()));
    }
    let condition: Condition = range.parse()?;
    Ok((tag.to_string(), condition))
}
