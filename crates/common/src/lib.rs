use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const COVERS_DIR: &str = "covers";

/// Path of a track relative to the media root, always `/`-separated.
///
/// This is the catalog identity of a track. No case folding or Unicode
/// normalization is applied, so `Song.mp3` and `song.mp3` are distinct.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackPath(String);

impl TrackPath {
    pub fn from_root(root: &Path, path: &Path) -> Option<Self> {
        let rel = path.strip_prefix(root).ok()?;
        let mut parts = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().to_string()),
                Component::CurDir => continue,
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        if parts.is_empty() {
            None
        } else {
            Some(Self(parts.join("/")))
        }
    }

    /// Accepts either separator so values written on another platform
    /// resolve to the same identity.
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = Vec::new();
        for part in value.split(['/', '\\']) {
            match part {
                "" | "." => continue,
                ".." => return None,
                _ => parts.push(part),
            }
        }
        if parts.is_empty() {
            None
        } else {
            Some(Self(parts.join("/")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Same rules as `Path::file_stem`: a leading dot is part of the stem.
    pub fn file_stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(idx) if idx > 0 => &name[..idx],
            _ => name,
        }
    }

    /// Extension without the dot, case preserved. Empty when there is none.
    pub fn extension(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(idx) if idx > 0 => &name[idx + 1..],
            _ => "",
        }
    }

    pub fn to_path(&self, root: &Path) -> PathBuf {
        join_relpath(root, &self.0)
    }
}

impl fmt::Display for TrackPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: u64,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub tags: String,
    pub filepath: TrackPath,
    pub duration: u32,
    pub bitrate: u32,
    pub extension: String,
    #[serde(rename = "cover")]
    pub cover_path: String,
}

/// A track that has not been stored yet and so has no row id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackDraft {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub tags: String,
    pub filepath: TrackPath,
    pub duration: u32,
    pub bitrate: u32,
    pub extension: String,
    pub cover_path: String,
}

impl TrackDraft {
    /// Record used when a file carries no usable metadata at all.
    pub fn defaults_for(filepath: TrackPath) -> Self {
        Self {
            title: filepath.file_stem().to_string(),
            artist: UNKNOWN_ARTIST.to_string(),
            album: String::new(),
            genre: String::new(),
            tags: String::new(),
            extension: filepath.extension().to_string(),
            filepath,
            duration: 0,
            bitrate: 0,
            cover_path: String::new(),
        }
    }

    pub fn into_track(self, id: u64) -> Track {
        Track {
            id,
            title: self.title,
            artist: self.artist,
            album: self.album,
            genre: self.genre,
            tags: self.tags,
            filepath: self.filepath,
            duration: self.duration,
            bitrate: self.bitrate,
            extension: self.extension,
            cover_path: self.cover_path,
        }
    }
}

pub fn join_relpath(root: &Path, relpath: &str) -> PathBuf {
    let mut out = PathBuf::from(root);
    for part in relpath.split('/') {
        if part.is_empty() {
            continue;
        }
        out.push(part);
    }
    out
}
