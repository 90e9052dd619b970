use std::collections::HashSet;

use tracing::info;

use crate::catalog::Catalog;
use crate::LibraryError;

/// Deletes every row whose path already appeared on a lower-id row.
pub fn prune_duplicates(catalog: &Catalog) -> Result<usize, LibraryError> {
    let mut seen = HashSet::new();
    let duplicates: Vec<u64> = catalog
        .list()?
        .into_iter()
        .filter(|track| !seen.insert(track.filepath.clone()))
        .map(|track| track.id)
        .collect();

    let removed = catalog.delete_many(&duplicates)?;
    if removed > 0 {
        info!("Pruned {} duplicate catalog rows", removed);
    }
    Ok(removed)
}
