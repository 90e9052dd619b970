use std::fmt;
use std::path::Path;

use lofty::error::LoftyError;
use lofty::file::TaggedFile;
use lofty::prelude::{AudioFile, ItemKey, TaggedFileExt};
use lofty::tag::{Tag, TagType};

/// Normalized view of one audio file's embedded metadata.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub duration_secs: Option<u32>,
    pub bitrate_kbps: Option<u32>,
    /// Raw bytes of the first embedded picture, format unchecked.
    pub cover: Option<Vec<u8>>,
}

#[derive(Debug)]
pub enum MetadataError {
    Io(std::io::Error),
    Lofty(LoftyError),
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataError::Io(err) => write!(f, "io error: {}", err),
            MetadataError::Lofty(err) => write!(f, "tag error: {}", err),
        }
    }
}

impl std::error::Error for MetadataError {}

impl From<std::io::Error> for MetadataError {
    fn from(err: std::io::Error) -> Self {
        MetadataError::Io(err)
    }
}

impl From<LoftyError> for MetadataError {
    fn from(err: LoftyError) -> Self {
        MetadataError::Lofty(err)
    }
}

struct FieldProbe {
    key: ItemKey,
    frames: &'static [&'static str],
}

const TITLE: FieldProbe = FieldProbe {
    key: ItemKey::TrackTitle,
    frames: &["TIT2", "TITLE"],
};
const ARTIST: FieldProbe = FieldProbe {
    key: ItemKey::TrackArtist,
    frames: &["TPE1", "ARTIST"],
};
const ALBUM: FieldProbe = FieldProbe {
    key: ItemKey::AlbumTitle,
    frames: &["TALB", "ALBUM"],
};
const GENRE: FieldProbe = FieldProbe {
    key: ItemKey::Genre,
    frames: &["TCON", "GENRE"],
};

// APIC frames, then the MP4 `covr` atom, then METADATA_BLOCK_PICTURE.
const COVER_SOURCES: [TagType; 3] = [TagType::Id3v2, TagType::Mp4Ilst, TagType::VorbisComments];

pub fn read_tags(path: &Path) -> Result<TagRecord, MetadataError> {
    let tagged_file = lofty::read_from_path(path)?;
    let properties = tagged_file.properties();

    let mut record = TagRecord::default();

    let secs = properties.duration().as_secs();
    record.duration_secs = Some(secs.min(u64::from(u32::MAX)) as u32);
    record.bitrate_kbps = properties
        .audio_bitrate()
        .or(properties.overall_bitrate());

    let tags = ordered_tags(&tagged_file);
    record.title = probe_field(&tags, &TITLE);
    record.artist = probe_field(&tags, &ARTIST);
    record.album = probe_field(&tags, &ALBUM);
    record.genre = probe_field(&tags, &GENRE);
    record.cover = probe_cover(&tags);

    Ok(record)
}

fn ordered_tags(tagged_file: &TaggedFile) -> Vec<&Tag> {
    let primary = tagged_file.primary_tag_type();
    let mut tags: Vec<&Tag> = tagged_file.tags().iter().collect();
    tags.sort_by_key(|tag| tag.tag_type() != primary);
    tags
}

fn probe_field(tags: &[&Tag], probe: &FieldProbe) -> Option<String> {
    for tag in tags {
        if let Some(value) = tag.get_string(&probe.key).and_then(first_value) {
            return Some(value);
        }
    }
    for frame in probe.frames {
        let key = ItemKey::Unknown((*frame).to_string());
        for tag in tags {
            if let Some(value) = tag.get_string(&key).and_then(first_value) {
                return Some(value);
            }
        }
    }
    None
}

fn probe_cover(tags: &[&Tag]) -> Option<Vec<u8>> {
    for source in COVER_SOURCES {
        for tag in tags.iter().filter(|tag| tag.tag_type() == source) {
            if let Some(picture) = tag.pictures().iter().find(|p| !p.data().is_empty()) {
                return Some(picture.data().to_vec());
            }
        }
    }
    None
}

fn first_value(text: &str) -> Option<String> {
    let head = text.split('\0').next().unwrap_or(text).trim();
    if head.is_empty() {
        None
    } else {
        Some(head.to_string())
    }
}
