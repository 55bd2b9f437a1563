use crate::core::favorites::{FAVORITES_KEY, FavoritePair, FavoritesStore, dedupe_pairs};
use anyhow::{Context, Result};
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::{debug, warn};

const PARTITION_NAME: &str = "favorites";

/// Favorites persisted in a fjall keyspace as a JSON array of `FROM-TO` strings.
pub struct DiskFavoritesStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskFavoritesStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;

        let keyspace = Config::new(path)
            .open()
            .with_context(|| format!("Failed to open favorites store at {}", path.display()))?;
        let partition = keyspace.open_partition(PARTITION_NAME, PartitionCreateOptions::default())?;
        debug!("Opened favorites store at {}", path.display());

        Ok(Self {
            keyspace,
            partition,
        })
    }
}

impl FavoritesStore for DiskFavoritesStore {
    fn load(&self) -> Result<Vec<FavoritePair>> {
        match self.partition.get(FAVORITES_KEY)? {
            Some(value) => {
                let entries: Vec<String> = serde_json::from_slice(&value)
                    .context("Malformed favorites entry in store")?;
                let pairs: Vec<FavoritePair> = entries
                    .iter()
                    .filter_map(|entry| match entry.parse() {
                        Ok(pair) => Some(pair),
                        Err(e) => {
                            warn!(error = %e, "Skipping unreadable favorite");
                            None
                        }
                    })
                    .collect();
                let unique = dedupe_pairs(&pairs);
                debug!(count = unique.len(), "Favorites HIT");
                Ok(unique)
            }
            None => {
                debug!("Favorites MISS");
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, pairs: &[FavoritePair]) -> Result<()> {
        let unique = dedupe_pairs(pairs);
        self.partition
            .insert(FAVORITES_KEY.as_bytes(), serde_json::to_vec(&unique)?)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!(count = unique.len(), "Favorites SAVE");
        Ok(())
    }
}
