use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Response,
};
use tracing::{debug, info};

use crate::scan::store_upload;
use crate::state::AppState;
use crate::utils::{json_error_response, redirect_to};

/// Accepts repeated `file` parts, stores each allowed one directly under the
/// media root and catalogs it. Other parts are ignored.
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                return json_error_response(
                    StatusCode::BAD_REQUEST,
                    format!("invalid upload: {}", err),
                )
            }
        };
        if field.name() != Some("file") {
            continue;
        }
        let file_name = match field.file_name().and_then(sanitize_filename) {
            Some(name) => name,
            None => continue,
        };
        if !state.library.is_allowed(&file_name) {
            debug!("Ignoring upload {:?}: extension not allowed", file_name);
            continue;
        }
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => {
                return json_error_response(
                    StatusCode::BAD_REQUEST,
                    format!("invalid upload: {}", err),
                )
            }
        };

        let dst = state.library.root().join(&file_name);
        match store_upload(&state, dst, bytes).await {
            Ok(outcome) => info!("Uploaded {}: {:?}", outcome.path, outcome.change),
            Err(message) => {
                return json_error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("upload failed: {}", message),
                )
            }
        }
    }
    redirect_to("/")
}

/// Reduces a client-supplied name to a safe single path component.
///
/// Non-ASCII is dropped, separators and whitespace runs become `_`, and only
/// ASCII letters, digits, `_`, `.` and `-` survive. Leading and trailing
/// `.`/`_` are stripped.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let spaced: String = name
        .chars()
        .filter(|c| c.is_ascii())
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_plain_names() {
        assert_eq!(sanitize_filename("song.mp3").as_deref(), Some("song.mp3"));
        assert_eq!(
            sanitize_filename("My Song (Live).MP3").as_deref(),
            Some("My_Song_Live.MP3")
        );
    }

    #[test]
    fn strips_directories_and_traversal() {
        assert_eq!(
            sanitize_filename("../../etc/passwd").as_deref(),
            Some("etc_passwd")
        );
        assert_eq!(
            sanitize_filename("C:\\music\\track.wav").as_deref(),
            Some("C_music_track.wav")
        );
    }

    #[test]
    fn drops_non_ascii_and_rejects_empty_results() {
        assert_eq!(sanitize_filename("café.m4a").as_deref(), Some("caf.m4a"));
        assert_eq!(sanitize_filename("日本語"), None);
        assert_eq!(sanitize_filename(" ._. "), None);
        assert_eq!(sanitize_filename(".mp3").as_deref(), Some("mp3"));
    }
}
