use std::path::Path;

use metadata::read_tags;
use tracing::warn;

use crate::covers::persist_cover;
use crate::LibraryError;

/// Metadata found in a file, with the cover already written to disk.
/// `None` means the file did not carry the field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub duration: Option<u32>,
    pub bitrate: Option<u32>,
    pub cover_path: Option<String>,
}

#[derive(Debug)]
pub enum Extraction {
    Parsed(TrackMetadata),
    /// The file could not be parsed; it is still cataloged with defaults.
    Skipped { reason: String },
}

impl Extraction {
    pub fn into_parts(self) -> (TrackMetadata, Option<String>) {
        match self {
            Extraction::Parsed(metadata) => (metadata, None),
            Extraction::Skipped { reason } => (TrackMetadata::default(), Some(reason)),
        }
    }
}

/// Parse failures become `Extraction::Skipped`. A cover that cannot be
/// written is an error.
pub fn extract_file(root: &Path, path: &Path) -> Result<Extraction, LibraryError> {
    let record = match read_tags(path) {
        Ok(record) => record,
        Err(err) => {
            warn!("Failed to read tags from {:?}: {}", path, err);
            return Ok(Extraction::Skipped {
                reason: err.to_string(),
            });
        }
    };

    let cover_path = match record.cover.as_deref() {
        Some(bytes) => Some(persist_cover(root, path, bytes)?),
        None => None,
    };

    Ok(Extraction::Parsed(TrackMetadata {
        title: record.title,
        artist: record.artist,
        album: record.album,
        genre: record.genre,
        duration: record.duration_secs,
        bitrate: record.bitrate_kbps,
        cover_path,
    }))
}
