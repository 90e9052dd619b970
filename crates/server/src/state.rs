use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use axum::http::StatusCode;
use axum::Json;
use library::{Library, ScanReport};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub library: Library,
    pub static_dir: PathBuf,
    pub scan_status: Arc<RwLock<ScanStatus>>,
    /// Held for the whole of any scan or upload reconcile.
    pub scan_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: ServerConfig, library: Library, static_dir: PathBuf) -> Self {
        Self {
            config: Arc::new(config),
            library,
            static_dir,
            scan_status: Arc::new(RwLock::new(ScanStatus::Idle)),
            scan_lock: Arc::new(Mutex::new(())),
        }
    }
}

#[derive(Clone, Debug)]
pub enum ScanStatus {
    Idle,
    Scanning { started: SystemTime },
    Ready(ScanReport),
    Error(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct ScanResponse {
    pub status: &'static str,
    pub report: ScanReport,
}

#[derive(Serialize)]
pub struct ScanStatusResponse {
    pub status: String,
    pub message: Option<String>,
    pub report: Option<ScanReport>,
}

pub type JsonResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;
