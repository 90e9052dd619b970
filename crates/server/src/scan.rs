use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use axum::body::Bytes;
use library::{FileOutcome, ScanReport};
use tracing::{info, warn};

use crate::state::{AppState, ScanStatus};

/// Runs a full scan on the blocking pool behind the scan lock and records
/// the result in the shared status.
pub async fn run_scan(state: AppState) -> Result<ScanReport, String> {
    let library = state.library.clone();
    let lock = Arc::clone(&state.scan_lock);
    let status = Arc::clone(&state.scan_status);
    let result = tokio::task::spawn_blocking(move || {
        let _guard = lock.lock();
        *status.write() = ScanStatus::Scanning {
            started: SystemTime::now(),
        };
        library.scan()
    })
    .await;

    match result {
        Ok(Ok(report)) => {
            *state.scan_status.write() = ScanStatus::Ready(report.clone());
            Ok(report)
        }
        Ok(Err(err)) => {
            let message = err.to_string();
            *state.scan_status.write() = ScanStatus::Error(message.clone());
            warn!("Library scan failed: {}", message);
            Err(message)
        }
        Err(err) => {
            let message = err.to_string();
            *state.scan_status.write() = ScanStatus::Error(message.clone());
            warn!("Library scan join error: {}", message);
            Err(message)
        }
    }
}

pub fn start_startup_scan(state: AppState) {
    tokio::spawn(async move {
        if let Ok(report) = run_scan(state).await {
            info!(
                "Startup scan finished: {} files, {} new",
                report.files, report.inserted
            );
        }
    });
}

/// Writes an uploaded file into the media root and reconciles it, both
/// under the scan lock so a running scan never sees a partial file.
pub async fn store_upload(
    state: &AppState,
    dst: PathBuf,
    bytes: Bytes,
) -> Result<FileOutcome, String> {
    let library = state.library.clone();
    let lock = Arc::clone(&state.scan_lock);
    let result = tokio::task::spawn_blocking(move || {
        let _guard = lock.lock();
        std::fs::write(&dst, &bytes).map_err(|err| format!("write failed: {}", err))?;
        library.reconcile(&dst).map_err(|err| err.to_string())
    })
    .await;

    match result {
        Ok(outcome) => outcome,
        Err(err) => Err(format!("upload join error: {}", err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use library::{Change, Library, ScanSettings};
    use tempfile::tempdir;

    fn state_in(dir: &std::path::Path) -> AppState {
        let root = dir.join("media");
        std::fs::create_dir_all(&root).unwrap();
        let library =
            Library::open(root, &dir.join("music.redb"), ScanSettings::default()).unwrap();
        AppState::new(ServerConfig::default(), library, dir.join("static"))
    }

    #[tokio::test]
    async fn scan_updates_status_with_report() {
        let dir = tempdir().unwrap();
        let state = state_in(dir.path());
        std::fs::write(state.library.root().join("a.mp3"), b"").unwrap();

        let report = run_scan(state.clone()).await.unwrap();
        assert_eq!(report.files, 1);
        match &*state.scan_status.read() {
            ScanStatus::Ready(stored) => assert_eq!(stored, &report),
            other => panic!("unexpected status {:?}", other),
        };
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn waiting_scan_does_not_report_scanning() {
        let dir = tempdir().unwrap();
        let state = state_in(dir.path());
        std::fs::write(state.library.root().join("a.mp3"), b"").unwrap();

        let guard = state.scan_lock.lock();
        let handle = tokio::spawn(run_scan(state.clone()));
        std::thread::sleep(std::time::Duration::from_millis(100));
        assert!(matches!(&*state.scan_status.read(), ScanStatus::Idle));
        drop(guard);

        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.files, 1);
        assert!(matches!(&*state.scan_status.read(), ScanStatus::Ready(_)));
    }

    #[tokio::test]
    async fn repeated_upload_updates_the_same_row() {
        let dir = tempdir().unwrap();
        let state = state_in(dir.path());
        let dst = state.library.root().join("clip.wav");

        let first = store_upload(&state, dst.clone(), Bytes::from_static(b"junk"))
            .await
            .unwrap();
        let second = store_upload(&state, dst, Bytes::from_static(b"junk again"))
            .await
            .unwrap();

        assert!(matches!(first.change, Change::Inserted(_)));
        assert_eq!(second.change, Change::Unchanged(first.change.id()));
        assert_eq!(state.library.catalog().count().unwrap(), 1);
    }
}
