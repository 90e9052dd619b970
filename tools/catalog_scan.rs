use std::env;
use std::path::PathBuf;

use library::{Library, ScanSettings};
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = env::args().skip(1);
    let media_root = args
        .next()
        .or_else(|| env::var("TUNECAT_MEDIA_ROOT").ok())
        .ok_or("TUNECAT_MEDIA_ROOT not set and no path argument")?;
    let index_path = args
        .next()
        .or_else(|| env::var("TUNECAT_INDEX_PATH").ok())
        .unwrap_or_else(|| "music.redb".to_string());

    let library = Library::open(
        PathBuf::from(&media_root),
        &PathBuf::from(&index_path),
        ScanSettings::default(),
    )?;
    let report = library.scan()?;

    for skipped in &report.skipped {
        warn!("Skipped {}: {}", skipped.file, skipped.reason);
    }
    println!(
        "Scanned {} files: {} new, {} backfilled, {} unchanged, {} skipped, {} duplicates pruned",
        report.files,
        report.inserted,
        report.backfilled,
        report.unchanged,
        report.skipped.len(),
        report.pruned
    );
    println!("Catalog holds {} tracks", library.catalog().count()?);
    Ok(())
}
