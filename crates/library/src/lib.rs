use std::path::{Path, PathBuf};

use common::Track;
use metadata::MetadataError;
use redb::{CommitError, DatabaseError, StorageError, TableError, TransactionError};

pub mod catalog;
pub mod covers;
pub mod extract;
pub mod prune;
pub mod reconcile;
pub mod scan;

pub use catalog::Catalog;
pub use covers::{cover_relpath, persist_cover};
pub use extract::{extract_file, Extraction, TrackMetadata};
pub use prune::prune_duplicates;
pub use reconcile::{backfill, new_draft, reconcile_file, Change, FileOutcome};
pub use scan::{scan_library, ScanReport, SkippedFile};

pub const DEFAULT_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a"];

/// Which files under the media root the scanner hands to the reconciler.
#[derive(Clone, Debug)]
pub struct ScanSettings {
    allowed_extensions: Vec<String>,
}

impl ScanSettings {
    /// Extensions are matched without the dot and case-insensitively.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allowed_extensions: Vec<String> = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        allowed_extensions.sort();
        allowed_extensions.dedup();
        Self { allowed_extensions }
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// Looks at the text after the last dot of the file name, so a bare
    /// `.mp3` counts as an mp3.
    pub fn is_allowed(&self, path: &Path) -> bool {
        let name = match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => name,
            None => return false,
        };
        match name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => {
                let ext = ext.to_ascii_lowercase();
                self.allowed_extensions.iter().any(|allowed| *allowed == ext)
            }
            _ => false,
        }
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

/// A media root bound to its catalog.
#[derive(Clone)]
pub struct Library {
    root: PathBuf,
    catalog: Catalog,
    settings: ScanSettings,
}

impl Library {
    pub fn open(
        root: PathBuf,
        index_path: &Path,
        settings: ScanSettings,
    ) -> Result<Self, LibraryError> {
        let catalog = Catalog::open(index_path)?;
        Ok(Self::with_catalog(root, catalog, settings))
    }

    pub fn with_catalog(root: PathBuf, catalog: Catalog, settings: ScanSettings) -> Self {
        Self {
            root,
            catalog,
            settings,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    pub fn is_allowed(&self, file_name: &str) -> bool {
        self.settings.is_allowed(Path::new(file_name))
    }

    pub fn scan(&self) -> Result<ScanReport, LibraryError> {
        scan_library(&self.catalog, &self.root, &self.settings)
    }

    /// Reconciles one file that is already inside the media root.
    pub fn reconcile(&self, path: &Path) -> Result<FileOutcome, LibraryError> {
        reconcile_file(&self.catalog, &self.root, path)
    }

    pub fn list_tracks(&self) -> Result<Vec<Track>, LibraryError> {
        self.catalog.list()
    }

    pub fn list_tracks_by_artist(&self) -> Result<Vec<Track>, LibraryError> {
        self.catalog.list_by_artist()
    }

    pub fn get_track(&self, id: u64) -> Result<Option<Track>, LibraryError> {
        self.catalog.get(id)
    }
}

#[derive(Debug)]
pub enum LibraryError {
    Io(std::io::Error),
    Metadata(MetadataError),
    Redb(redb::Error),
    Bincode(Box<bincode::ErrorKind>),
    VersionMismatch(u32),
    OutsideRoot(PathBuf),
}

impl std::fmt::Display for LibraryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LibraryError::Io(err) => write!(f, "io error: {}", err),
            LibraryError::Metadata(err) => write!(f, "metadata error: {}", err),
            LibraryError::Redb(err) => write!(f, "db error: {}", err),
            LibraryError::Bincode(err) => write!(f, "bincode error: {}", err),
            LibraryError::VersionMismatch(version) => {
                write!(f, "catalog version mismatch: {}", version)
            }
            LibraryError::OutsideRoot(path) => {
                write!(f, "path is outside the media root: {}", path.display())
            }
        }
    }
}

impl std::error::Error for LibraryError {}

impl From<std::io::Error> for LibraryError {
    fn from(err: std::io::Error) -> Self {
        LibraryError::Io(err)
    }
}

impl From<MetadataError> for LibraryError {
    fn from(err: MetadataError) -> Self {
        LibraryError::Metadata(err)
    }
}

impl From<redb::Error> for LibraryError {
    fn from(err: redb::Error) -> Self {
        LibraryError::Redb(err)
    }
}

impl From<DatabaseError> for LibraryError {
    fn from(err: DatabaseError) -> Self {
        LibraryError::Redb(err.into())
    }
}

impl From<TableError> for LibraryError {
    fn from(err: TableError) -> Self {
        LibraryError::Redb(err.into())
    }
}

impl From<TransactionError> for LibraryError {
    fn from(err: TransactionError) -> Self {
        LibraryError::Redb(err.into())
    }
}

impl From<StorageError> for LibraryError {
    fn from(err: StorageError) -> Self {
        LibraryError::Redb(err.into())
    }
}

impl From<CommitError> for LibraryError {
    fn from(err: CommitError) -> Self {
        LibraryError::Redb(err.into())
    }
}

impl From<Box<bincode::ErrorKind>> for LibraryError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        LibraryError::Bincode(err)
    }
}
