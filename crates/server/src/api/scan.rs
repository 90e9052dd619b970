use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::scan::run_scan;
use crate::state::{AppState, ScanResponse, ScanStatus, ScanStatusResponse};
use crate::utils::{is_form_post, json_error_response, redirect_to, wants_json};

/// Browser form posts go back to the index; API callers get the report.
pub async fn scan_now(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match run_scan(state).await {
        Ok(report) => {
            if wants_json(&headers) || !is_form_post(&headers) {
                Json(ScanResponse {
                    status: "scan complete",
                    report,
                })
                .into_response()
            } else {
                redirect_to("/")
            }
        }
        Err(message) => json_error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("scan failed: {}", message),
        ),
    }
}

pub async fn scan_status(State(state): State<AppState>) -> Json<ScanStatusResponse> {
    let status = state.scan_status.read().clone();
    let response = match status {
        ScanStatus::Idle => ScanStatusResponse {
            status: "idle".to_string(),
            message: None,
            report: None,
        },
        ScanStatus::Scanning { started } => ScanStatusResponse {
            status: "scanning".to_string(),
            message: started
                .elapsed()
                .ok()
                .map(|elapsed| format!("scan in progress ({}s)", elapsed.as_secs())),
            report: None,
        },
        ScanStatus::Ready(report) => ScanStatusResponse {
            status: "ready".to_string(),
            message: None,
            report: Some(report),
        },
        ScanStatus::Error(message) => ScanStatusResponse {
            status: "error".to_string(),
            message: Some(message),
            report: None,
        },
    };
    Json(response)
}
