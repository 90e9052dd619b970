use std::fs;
use std::path::Path;

use common::{TrackDraft, TrackPath, UNKNOWN_ARTIST};
use library::{Catalog, Library, ScanSettings};
use lofty::config::WriteOptions;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::prelude::{Accessor, TagExt};
use lofty::tag::{Tag, TagType};
use tempfile::{tempdir, TempDir};

const COVER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

// MPEG-1 Layer III, 128 kbps, 44.1 kHz: 417 bytes per frame.
fn write_mpeg(path: &Path) {
    let mut data = Vec::new();
    for _ in 0..40 {
        data.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x64]);
        data.extend(std::iter::repeat(0u8).take(413));
    }
    fs::write(path, data).unwrap();
}

fn tag_file(path: &Path, genre: Option<&str>) {
    let mut tag = Tag::new(TagType::Id3v2);
    tag.set_title("Test".to_string());
    tag.set_artist("Artist A".to_string());
    if let Some(genre) = genre {
        tag.set_genre(genre.to_string());
    }
    tag.push_picture(Picture::new_unchecked(
        PictureType::CoverFront,
        Some(MimeType::Jpeg),
        None,
        COVER.to_vec(),
    ));
    tag.save_to_path(path, WriteOptions::default()).unwrap();
}

struct Fixture {
    _dir: TempDir,
    root: std::path::PathBuf,
    library: Library,
}

fn fixture() -> Fixture {
    let dir = tempdir().unwrap();
    let root = dir.path().join("media");
    fs::create_dir_all(&root).unwrap();
    let library = Library::open(
        root.clone(),
        &dir.path().join("music.redb"),
        ScanSettings::default(),
    )
    .unwrap();
    Fixture {
        _dir: dir,
        root,
        library,
    }
}

#[test]
fn tagged_file_gets_metadata_and_cover() {
    let fx = fixture();
    let song = fx.root.join("song.mp3");
    write_mpeg(&song);
    tag_file(&song, None);

    let report = fx.library.scan().unwrap();
    assert_eq!(report.files, 1);
    assert_eq!(report.inserted, 1);
    assert!(report.skipped.is_empty());

    let tracks = fx.library.list_tracks().unwrap();
    assert_eq!(tracks.len(), 1);
    let track = &tracks[0];
    assert_eq!(track.title, "Test");
    assert_eq!(track.artist, "Artist A");
    assert_eq!(track.genre, "");
    assert_eq!(track.extension, "mp3");
    assert_eq!(track.filepath.as_str(), "song.mp3");
    assert_eq!(track.cover_path, "covers/song.jpg");
    assert_eq!(fs::read(fx.root.join("covers/song.jpg")).unwrap(), COVER);
}

#[test]
fn genre_is_backfilled_once() {
    let fx = fixture();
    let song = fx.root.join("song.mp3");
    write_mpeg(&song);
    tag_file(&song, None);
    fx.library.scan().unwrap();

    tag_file(&song, Some("Rock"));
    let report = fx.library.scan().unwrap();
    assert_eq!(report.backfilled, 1);

    tag_file(&song, Some("Jazz"));
    let report = fx.library.scan().unwrap();
    assert_eq!(report.unchanged, 1);

    let tracks = fx.library.list_tracks().unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].genre, "Rock");
    assert_eq!(tracks[0].cover_path, "covers/song.jpg");
}

#[test]
fn rescan_keeps_edited_fields() {
    let fx = fixture();
    let song = fx.root.join("song.mp3");
    write_mpeg(&song);
    tag_file(&song, Some("Rock"));
    fx.library.scan().unwrap();

    let mut track = fx.library.list_tracks().unwrap().remove(0);
    track.title = "My Title".to_string();
    fx.library.catalog().update(&track).unwrap();

    fx.library.scan().unwrap();
    let again = fx.library.get_track(track.id).unwrap().unwrap();
    assert_eq!(again.title, "My Title");
    assert_eq!(again.artist, "Artist A");
}

#[test]
fn cover_is_rewritten_on_every_scan() {
    let fx = fixture();
    let song = fx.root.join("song.mp3");
    write_mpeg(&song);
    tag_file(&song, None);
    fx.library.scan().unwrap();

    let cover = fx.root.join("covers/song.jpg");
    fs::write(&cover, b"stale").unwrap();
    fx.library.scan().unwrap();
    assert_eq!(fs::read(&cover).unwrap(), COVER);
}

#[test]
fn empty_file_gets_default_record() {
    let fx = fixture();
    fs::write(fx.root.join("empty.mp3"), b"").unwrap();

    let report = fx.library.scan().unwrap();
    assert_eq!(report.files, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].file, "empty.mp3");

    let tracks = fx.library.list_tracks().unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].title, "empty");
    assert_eq!(tracks[0].artist, UNKNOWN_ARTIST);
    assert_eq!(tracks[0].album, "");
    assert_eq!(tracks[0].cover_path, "");
    assert_eq!(tracks[0].duration, 0);
    assert_eq!(tracks[0].bitrate, 0);
}

#[test]
fn unreadable_file_is_reported_as_skipped() {
    let fx = fixture();
    fs::create_dir_all(fx.root.join("live")).unwrap();
    fs::write(fx.root.join("live/noise.wav"), b"this is not riff data").unwrap();

    let report = fx.library.scan().unwrap();
    assert_eq!(report.inserted, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].file, "live/noise.wav");

    let track = fx
        .library
        .catalog()
        .find_by_path(&TrackPath::parse("live/noise.wav").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(track.title, "noise");
    assert_eq!(track.extension, "wav");
}

#[test]
fn duplicate_rows_collapse_to_one() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("media");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("song.mp3"), b"").unwrap();

    let catalog = Catalog::open(&dir.path().join("music.redb")).unwrap();
    let path = TrackPath::parse("song.mp3").unwrap();
    let first = catalog.insert(TrackDraft::defaults_for(path.clone())).unwrap();
    catalog.insert(TrackDraft::defaults_for(path)).unwrap();

    let library = Library::with_catalog(root, catalog, ScanSettings::default());
    let report = library.scan().unwrap();
    assert_eq!(report.pruned, 1);
    assert_eq!(report.unchanged, 1);

    let tracks = library.list_tracks().unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id, first.id);
}

#[test]
fn extension_filter_ignores_case_and_other_files() {
    let fx = fixture();
    fs::write(fx.root.join("LOUD.MP3"), b"").unwrap();
    fs::write(fx.root.join("notes.txt"), b"hello").unwrap();
    fs::write(fx.root.join(".mp3"), b"").unwrap();
    let song = fx.root.join("song.mp3");
    write_mpeg(&song);
    tag_file(&song, None);

    fx.library.scan().unwrap();
    fx.library.scan().unwrap();

    let mut paths: Vec<String> = fx
        .library
        .list_tracks()
        .unwrap()
        .into_iter()
        .map(|t| t.filepath.to_string())
        .collect();
    paths.sort();
    assert_eq!(paths, vec![".mp3", "LOUD.MP3", "song.mp3"]);

    let hidden = fx
        .library
        .catalog()
        .find_by_path(&TrackPath::parse(".mp3").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(hidden.title, ".mp3");
    assert_eq!(hidden.extension, "");
    assert!(fx.root.join("covers/song.jpg").exists());
}

#[test]
fn custom_allow_set_limits_the_scan() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("media");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("a.mp3"), b"").unwrap();
    fs::write(root.join("b.flac"), b"").unwrap();

    let library = Library::open(
        root,
        &dir.path().join("music.redb"),
        ScanSettings::new(["FLAC"]),
    )
    .unwrap();
    library.scan().unwrap();

    let tracks = library.list_tracks().unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].filepath.as_str(), "b.flac");
}

#[test]
fn reconcile_rejects_paths_outside_the_root() {
    let fx = fixture();
    let outside = fx.root.parent().unwrap().join("elsewhere.mp3");
    fs::write(&outside, b"").unwrap();
    assert!(fx.library.reconcile(&outside).is_err());
    assert_eq!(fx.library.catalog().count().unwrap(), 0);
}
