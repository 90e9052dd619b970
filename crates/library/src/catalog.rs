use std::fs;
use std::path::Path;
use std::sync::Arc;

use common::{Track, TrackDraft, TrackPath};
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::LibraryError;

const CATALOG_VERSION: u32 = 1;
const KEY_SEP: char = '\x1f';

const META_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");
const TRACKS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("tracks");
// `{relpath}\x1f{id:020}` -> id. Several ids may share one path.
const TRACK_PATHS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("track_paths");

const META_VERSION_KEY: &str = "version";

/// Persistent track catalog. Row ids are assigned in insertion order and
/// never reused while higher ids exist.
#[derive(Clone)]
pub struct Catalog {
    db: Arc<Database>,
}

impl Catalog {
    pub fn open(path: &Path) -> Result<Self, LibraryError> {
        let db = open_or_create_db(path)?;
        let catalog = Self::with_db(Arc::new(db))?;
        info!("Opened catalog at {:?}", path);
        Ok(catalog)
    }

    pub fn with_db(db: Arc<Database>) -> Result<Self, LibraryError> {
        let catalog = Self { db };
        catalog.init_tables()?;
        Ok(catalog)
    }

    fn init_tables(&self) -> Result<(), LibraryError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut meta_table = write_txn.open_table(META_TABLE)?;
            let stored: Option<u32> = match meta_table.get(META_VERSION_KEY)? {
                Some(value) => Some(decode_value(value.value())?),
                None => None,
            };
            match stored {
                Some(version) if version == CATALOG_VERSION => {}
                Some(version) => return Err(LibraryError::VersionMismatch(version)),
                None => {
                    let version_bytes = encode_value(&CATALOG_VERSION)?;
                    meta_table.insert(META_VERSION_KEY, version_bytes.as_slice())?;
                }
            }
            write_txn.open_table(TRACKS_TABLE)?;
            write_txn.open_table(TRACK_PATHS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Stores a new row. Does not check for an existing row with the same
    /// path; callers look up first.
    pub fn insert(&self, draft: TrackDraft) -> Result<Track, LibraryError> {
        let write_txn = self.db.begin_write()?;
        let track = {
            let mut track_table = write_txn.open_table(TRACKS_TABLE)?;
            let mut path_table = write_txn.open_table(TRACK_PATHS_TABLE)?;

            let id = match track_table.iter()?.next_back() {
                Some(entry) => entry?.0.value() + 1,
                None => 1,
            };
            let track = draft.into_track(id);
            let bytes = encode_value(&track)?;
            track_table.insert(id, bytes.as_slice())?;
            path_table.insert(path_key(&track.filepath, id).as_str(), id)?;
            track
        };
        write_txn.commit()?;
        debug!("Inserted track {} for {}", track.id, track.filepath);
        Ok(track)
    }

    pub fn get(&self, id: u64) -> Result<Option<Track>, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let track_table = read_txn.open_table(TRACKS_TABLE)?;
        let result = match track_table.get(id)? {
            Some(value) => Ok(Some(decode_value(value.value())?)),
            None => Ok(None),
        };
        result
    }

    /// Returns the lowest-id row for `path` when duplicates exist.
    pub fn find_by_path(&self, path: &TrackPath) -> Result<Option<Track>, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let path_table = read_txn.open_table(TRACK_PATHS_TABLE)?;
        let track_table = read_txn.open_table(TRACKS_TABLE)?;

        let prefix = prefix_key(path.as_str());
        let mut end = prefix.clone();
        end.push('\u{10ffff}');

        for entry in path_table.range(prefix.as_str()..end.as_str())? {
            let entry = entry?;
            let id = entry.1.value();
            if let Some(value) = track_table.get(id)? {
                let track: Track = decode_value(value.value())?;
                // A name containing KEY_SEP can sort inside this prefix range.
                if track.filepath == *path {
                    return Ok(Some(track));
                }
            }
        }
        Ok(None)
    }

    /// Rewrites an existing row in place, keeping the path index in step.
    pub fn update(&self, track: &Track) -> Result<(), LibraryError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut track_table = write_txn.open_table(TRACKS_TABLE)?;
            let mut path_table = write_txn.open_table(TRACK_PATHS_TABLE)?;

            let previous: Option<Track> = match track_table.get(track.id)? {
                Some(value) => Some(decode_value(value.value())?),
                None => None,
            };
            if let Some(previous) = previous {
                if previous.filepath != track.filepath {
                    path_table.remove(path_key(&previous.filepath, track.id).as_str())?;
                }
            }
            let bytes = encode_value(track)?;
            track_table.insert(track.id, bytes.as_slice())?;
            path_table.insert(path_key(&track.filepath, track.id).as_str(), track.id)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Removes the given rows in one transaction. Unknown ids are ignored.
    pub fn delete_many(&self, ids: &[u64]) -> Result<usize, LibraryError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let write_txn = self.db.begin_write()?;
        let mut removed = 0usize;
        {
            let mut track_table = write_txn.open_table(TRACKS_TABLE)?;
            let mut path_table = write_txn.open_table(TRACK_PATHS_TABLE)?;
            for id in ids {
                let track: Option<Track> = match track_table.remove(*id)? {
                    Some(value) => Some(decode_value(value.value())?),
                    None => None,
                };
                if let Some(track) = track {
                    path_table.remove(path_key(&track.filepath, track.id).as_str())?;
                    removed += 1;
                }
            }
        }
        write_txn.commit()?;
        Ok(removed)
    }

    /// All rows in id order.
    pub fn list(&self) -> Result<Vec<Track>, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let track_table = read_txn.open_table(TRACKS_TABLE)?;
        let mut tracks = Vec::new();
        for entry in track_table.iter()? {
            let entry = entry?;
            let track: Track = decode_value(entry.1.value())?;
            tracks.push(track);
        }
        Ok(tracks)
    }

    /// All rows ordered by artist, then title. Plain code point comparison.
    pub fn list_by_artist(&self) -> Result<Vec<Track>, LibraryError> {
        let mut tracks = self.list()?;
        tracks.sort_by(|a, b| {
            a.artist
                .cmp(&b.artist)
                .then_with(|| a.title.cmp(&b.title))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(tracks)
    }

    pub fn count(&self) -> Result<u64, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let track_table = read_txn.open_table(TRACKS_TABLE)?;
        Ok(track_table.len()?)
    }
}

fn open_or_create_db(path: &Path) -> Result<Database, LibraryError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    if path.exists() {
        Ok(Database::open(path)?)
    } else {
        Ok(Database::create(path)?)
    }
}

fn encode_value<T: Serialize>(value: &T) -> Result<Vec<u8>, LibraryError> {
    Ok(bincode::serialize(value)?)
}

fn decode_value<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, LibraryError> {
    Ok(bincode::deserialize(bytes)?)
}

fn prefix_key(prefix: &str) -> String {
    let mut out = String::new();
    out.push_str(prefix);
    out.push(KEY_SEP);
    out
}

fn path_key(path: &TrackPath, id: u64) -> String {
    let mut out = prefix_key(path.as_str());
    out.push_str(&format!("{:020}", id));
    out
}
