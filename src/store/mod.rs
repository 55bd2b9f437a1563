pub mod disk;
pub mod memory;

use crate::core::favorites::FavoritesStore;
use disk::DiskFavoritesStore;
use memory::MemoryFavoritesStore;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Opens the persistent favorites store under `data_path`.
///
/// Falls back to an in-memory store when the keyspace cannot be opened, so the
/// converter stays usable on a read-only or missing data directory.
pub fn open_favorites_store(data_path: &Path) -> Arc<dyn FavoritesStore> {
    match DiskFavoritesStore::open(&data_path.join("favorites")) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(error = %e, "Favorites will not persist across sessions");
            Arc::new(MemoryFavoritesStore::new())
        }
    }
}
