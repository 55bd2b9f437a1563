//! Favorite currency pairs and their storage abstraction

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Fixed key under which the favorites list is persisted.
pub const FAVORITES_KEY: &str = "swiftConvertFavorites";

/// An ordered (FROM, TO) currency pair, written as `FROM-TO`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FavoritePair {
    pub from: String,
    pub to: String,
}

impl FavoritePair {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Builds a pair whose `FROM-TO` form parses back to the same pair.
    pub fn try_new(from: &str, to: &str) -> Result<Self> {
        let valid = |code: &str| !code.is_empty() && !code.contains('-');
        if !valid(from) || !valid(to) {
            return Err(anyhow!("Invalid currency pair: {}-{}", from, to));
        }
        Ok(Self::new(from, to))
    }
}

impl Display for FavoritePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

impl FromStr for FavoritePair {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_once('-')
            .and_then(|(from, to)| Self::try_new(from, to).ok())
            .ok_or_else(|| anyhow!("Invalid currency pair: {}", s))
    }
}

impl TryFrom<String> for FavoritePair {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FavoritePair> for String {
    fn from(pair: FavoritePair) -> Self {
        pair.to_string()
    }
}

/// Removes repeated pairs, keeping the first occurrence of each.
pub fn dedupe_pairs(pairs: &[FavoritePair]) -> Vec<FavoritePair> {
    let mut unique: Vec<FavoritePair> = Vec::with_capacity(pairs.len());
    for pair in pairs {
        if !unique.contains(pair) {
            unique.push(pair.clone());
        }
    }
    unique
}

/// Durable storage for the favorites list.
///
/// Implementations keep set semantics: `save` never writes a pair twice and
/// `load` never returns one twice, while preserving insertion order.
pub trait FavoritesStore: Send + Sync {
    /// Returns the stored pairs, or an empty list when nothing was saved yet.
    fn load(&self) -> Result<Vec<FavoritePair>>;

    /// Replaces the stored list.
    fn save(&self, pairs: &[FavoritePair]) -> Result<()>;
}
