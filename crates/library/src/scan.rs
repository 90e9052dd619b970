use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::catalog::Catalog;
use crate::prune::prune_duplicates;
use crate::reconcile::{reconcile_file, Change, FileOutcome};
use crate::{LibraryError, ScanSettings};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub files: usize,
    pub pruned: usize,
    pub inserted: usize,
    pub backfilled: usize,
    pub unchanged: usize,
    pub skipped: Vec<SkippedFile>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub file: String,
    pub reason: String,
}

impl ScanReport {
    fn record(&mut self, outcome: FileOutcome) {
        self.files += 1;
        match outcome.change {
            Change::Inserted(_) => self.inserted += 1,
            Change::Backfilled(_) => self.backfilled += 1,
            Change::Unchanged(_) => self.unchanged += 1,
        }
        if let Some(reason) = outcome.skipped {
            self.skipped.push(SkippedFile {
                file: outcome.path.to_string(),
                reason,
            });
        }
    }
}

/// Prunes duplicate rows, then reconciles every allowed file under `root`.
/// Symlinks are not followed and unreadable entries are passed over.
pub fn scan_library(
    catalog: &Catalog,
    root: &Path,
    settings: &ScanSettings,
) -> Result<ScanReport, LibraryError> {
    info!("Scanning {:?}", root);
    let mut report = ScanReport {
        pruned: prune_duplicates(catalog)?,
        ..ScanReport::default()
    };

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!("Skipping unreadable entry: {}", err);
                continue;
            }
        };
        if !entry.file_type().is_file() || !settings.is_allowed(entry.path()) {
            continue;
        }
        let outcome = reconcile_file(catalog, root, entry.path())?;
        report.record(outcome);
    }

    info!(
        "Scan complete: {} files ({} new, {} backfilled, {} unchanged, {} skipped, {} pruned)",
        report.files,
        report.inserted,
        report.backfilled,
        report.unchanged,
        report.skipped.len(),
        report.pruned
    );
    Ok(report)
}
