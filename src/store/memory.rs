use crate::core::favorites::{FavoritePair, FavoritesStore, dedupe_pairs};
use anyhow::Result;
use std::sync::RwLock;
use tracing::debug;

/// In-memory favorites store, lost when the process exits.
#[derive(Default)]
pub struct MemoryFavoritesStore {
    pairs: RwLock<Option<Vec<FavoritePair>>>,
}

impl MemoryFavoritesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `pairs`.
    pub fn with_pairs(pairs: Vec<FavoritePair>) -> Self {
        Self {
            pairs: RwLock::new(Some(pairs)),
        }
    }
}

impl FavoritesStore for MemoryFavoritesStore {
    fn load(&self) -> Result<Vec<FavoritePair>> {
        let pairs = self
            .pairs
            .read()
            .map_err(|e| anyhow::anyhow!("Favorites lock poisoned: {}", e))?;
        match pairs.as_ref() {
            Some(pairs) => Ok(dedupe_pairs(pairs)),
            None => {
                debug!("No favorites stored");
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, pairs: &[FavoritePair]) -> Result<()> {
        let mut stored = self
            .pairs
            .write()
            .map_err(|e| anyhow::anyhow!("Favorites lock poisoned: {}", e))?;
        let unique = dedupe_pairs(pairs);
        debug!(count = unique.len(), "Favorites SAVE");
        *stored = Some(unique);
        Ok(())
    }
}
