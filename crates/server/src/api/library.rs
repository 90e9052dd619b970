use axum::{extract::State, http::StatusCode, response::Response, Json};
use common::Track;

use crate::state::{AppState, JsonResult};
use crate::utils::{
    apply_template, escape_html, format_duration, html_response, json_error, url_escape_path,
};

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");
const ROW_TEMPLATE: &str = include_str!("../../templates/track_row.html");

/// Catalog in row id order.
pub async fn api_tracks(State(state): State<AppState>) -> JsonResult<Vec<Track>> {
    match state.library.list_tracks() {
        Ok(tracks) => Ok(Json(tracks)),
        Err(err) => Err(json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("library error: {}", err),
        )),
    }
}

pub async fn index(State(state): State<AppState>) -> Response {
    let tracks = match state.library.list_tracks_by_artist() {
        Ok(tracks) => tracks,
        Err(err) => {
            return html_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("<p>library error: {}</p>", escape_html(&err.to_string())),
            )
        }
    };
    html_response(StatusCode::OK, render_index(&tracks))
}

fn render_index(tracks: &[Track]) -> String {
    let rows: String = tracks.iter().map(render_row).collect();
    let empty = if tracks.is_empty() {
        "<p class=\"empty\">No tracks yet. Upload some files or run a scan.</p>".to_string()
    } else {
        String::new()
    };
    apply_template(
        INDEX_TEMPLATE.to_string(),
        &[
            ("count", tracks.len().to_string()),
            ("rows", rows),
            ("empty", empty),
        ],
    )
}

fn render_row(track: &Track) -> String {
    let cover = if track.cover_path.is_empty() {
        "<div class=\"cover placeholder\"></div>".to_string()
    } else {
        format!(
            "<img class=\"cover\" src=\"/media/{}\" alt=\"\" loading=\"lazy\" />",
            escape_html(&url_escape_path(&track.cover_path))
        )
    };
    apply_template(
        ROW_TEMPLATE.to_string(),
        &[
            ("id", track.id.to_string()),
            ("cover", cover),
            ("title", escape_html(&track.title)),
            ("artist", escape_html(&track.artist)),
            ("album", escape_html(&track.album)),
            ("genre", escape_html(&track.genre)),
            ("duration", format_duration(track.duration)),
            ("bitrate", bitrate_label(track.bitrate)),
            (
                "src",
                escape_html(&url_escape_path(track.filepath.as_str())),
            ),
        ],
    )
}

fn bitrate_label(kbps: u32) -> String {
    if kbps == 0 {
        "-".to_string()
    } else {
        format!("{} kbps", kbps)
    }
}
