use std::fs;
use std::path::Path;

use common::{join_relpath, COVERS_DIR};
use tracing::debug;

use crate::LibraryError;

/// Cover location for an audio file, relative to the media root.
/// Files sharing a stem share one cover file.
pub fn cover_relpath(source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "cover".to_string());
    format!("{}/{}.jpg", COVERS_DIR, stem)
}

/// Writes `bytes` verbatim, replacing whatever was there. The `.jpg`
/// suffix is kept regardless of the actual image format.
pub fn persist_cover(root: &Path, source: &Path, bytes: &[u8]) -> Result<String, LibraryError> {
    fs::create_dir_all(root.join(COVERS_DIR))?;
    let relpath = cover_relpath(source);
    fs::write(join_relpath(root, &relpath), bytes)?;
    debug!("Wrote cover {} ({} bytes)", relpath, bytes.len());
    Ok(relpath)
}
