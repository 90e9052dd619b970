use std::path::Path;

use common::{Track, TrackDraft, TrackPath};
use tracing::debug;

use crate::catalog::Catalog;
use crate::extract::{extract_file, TrackMetadata};
use crate::LibraryError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Change {
    Inserted(u64),
    Backfilled(u64),
    Unchanged(u64),
}

impl Change {
    pub fn id(&self) -> u64 {
        match self {
            Change::Inserted(id) | Change::Backfilled(id) | Change::Unchanged(id) => *id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileOutcome {
    pub path: TrackPath,
    pub change: Change,
    /// Set when the file's metadata could not be read.
    pub skipped: Option<String>,
}

/// Brings the catalog row for `path` in line with the file's metadata.
///
/// A missing row is inserted. An existing row only gains a cover or genre
/// it lacks; every other field is left alone, including manual edits.
pub fn reconcile_file(
    catalog: &Catalog,
    root: &Path,
    path: &Path,
) -> Result<FileOutcome, LibraryError> {
    let relpath = TrackPath::from_root(root, path)
        .ok_or_else(|| LibraryError::OutsideRoot(path.to_path_buf()))?;
    let (metadata, skipped) = extract_file(root, path)?.into_parts();

    let change = match catalog.find_by_path(&relpath)? {
        Some(mut track) => {
            if backfill(&mut track, &metadata) {
                catalog.update(&track)?;
                Change::Backfilled(track.id)
            } else {
                Change::Unchanged(track.id)
            }
        }
        None => {
            let track = catalog.insert(new_draft(relpath.clone(), metadata))?;
            Change::Inserted(track.id)
        }
    };

    debug!("Reconciled {}: {:?}", relpath, change);
    Ok(FileOutcome {
        path: relpath,
        change,
        skipped,
    })
}

/// Fills an empty cover or genre from fresh metadata. Returns whether the
/// row changed.
pub fn backfill(track: &mut Track, metadata: &TrackMetadata) -> bool {
    let mut changed = false;
    if track.cover_path.is_empty() {
        if let Some(cover) = metadata.cover_path.as_ref().filter(|c| !c.is_empty()) {
            track.cover_path = cover.clone();
            changed = true;
        }
    }
    if track.genre.is_empty() {
        if let Some(genre) = metadata.genre.as_ref().filter(|g| !g.is_empty()) {
            track.genre = genre.clone();
            changed = true;
        }
    }
    changed
}

pub fn new_draft(filepath: TrackPath, metadata: TrackMetadata) -> TrackDraft {
    let mut draft = TrackDraft::defaults_for(filepath);
    if let Some(title) = metadata.title {
        draft.title = title;
    }
    if let Some(artist) = metadata.artist {
        draft.artist = artist;
    }
    draft.album = metadata.album.unwrap_or_default();
    draft.genre = metadata.genre.unwrap_or_default();
    draft.duration = metadata.duration.unwrap_or(0);
    draft.bitrate = metadata.bitrate.unwrap_or(0);
    draft.cover_path = metadata.cover_path.unwrap_or_default();
    draft
}
