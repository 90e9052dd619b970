pub mod library;
pub mod scan;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::services::ServeDir;

use crate::state::{AppState, HealthResponse};

pub fn app_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_mb.saturating_mul(1024 * 1024);
    let media = ServeDir::new(state.library.root());
    let assets = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get(library::index))
        .route("/api/tracks", get(library::api_tracks))
        .route(
            "/upload",
            post(upload::upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/scan", post(scan::scan_now))
        .route("/scan/status", get(scan::scan_status))
        .route("/health", get(health))
        .nest_service("/media", media)
        .nest_service("/static", assets)
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}
