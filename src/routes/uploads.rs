//! Media upload and listing routes.
//!
//! Uploads are multipart forms with a `file` part and an `annotationRoomCode`
//! text part. Every failure answers `{ "success": false, "error": ... }` with
//! a 4xx for client mistakes and 500 for storage failures.

#[cfg(test)]
#[path = "uploads_test.rs"]
mod uploads_test;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use protocol::MediaKind;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ErrorCode;
use crate::services::media::{self, MediaError, MediaListing};
use crate::state::AppState;

const FIELD_FILE: &str = "file";
const FIELD_ROOM: &str = "annotationRoomCode";

// =============================================================================
// ERRORS
// =============================================================================

impl MediaError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for MediaError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(code = self.error_code(), error = %self, "media request failed");
        } else {
            info!(code = self.error_code(), error = %self, "media request rejected");
        }
        let body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
            "code": self.error_code(),
        });
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// UPLOAD
// =============================================================================

/// File part of an upload form.
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Parsed upload form. Either part may be missing.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    pub room: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
    pub urls: Vec<String>,
    pub filename: String,
    pub saved_filename: String,
    pub size: u64,
    pub room_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
    /// Seconds of video. Outer `None` omits the key for non-video kinds;
    /// `Some(None)` is a video whose length was not read, sent as `null`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<Option<f64>>,
}

/// `POST /api/upload/{kind}`
///
/// # Errors
///
/// See [`store_upload`]; malformed multipart bodies map to
/// [`MediaError::Multipart`].
pub async fn upload(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, MediaError> {
    let kind = kind.parse::<MediaKind>().map_err(|_| MediaError::UnknownKind(kind))?;
    let form = read_form(multipart).await?;
    store_upload(&state, kind, form).await.map(Json)
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, MediaError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| MediaError::Multipart(e.to_string()))?
    {
        match field.name() {
            Some(FIELD_FILE) => {
                let filename = field.file_name().unwrap_or_default().to_owned();
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.map_err(|e| MediaError::Multipart(e.to_string()))?;
                form.file = Some(UploadedFile { filename, content_type, bytes: bytes.to_vec() });
            }
            Some(FIELD_ROOM) => {
                form.room = Some(field.text().await.map_err(|e| MediaError::Multipart(e.to_string()))?);
            }
            _ => {}
        }
    }
    Ok(form)
}

/// Validate a parsed form and hand the file to the media store.
///
/// # Errors
///
/// Checks run in order: missing file, missing or unsafe room code, content
/// type not matching `kind`. Storage failures surface as [`MediaError::Io`].
pub async fn store_upload(state: &AppState, kind: MediaKind, form: UploadForm) -> Result<UploadResponse, MediaError> {
    let file = form.file.ok_or(MediaError::MissingFile)?;
    let room = media::check_room(form.room.as_deref().unwrap_or_default())?;
    media::check_content_type(kind, file.content_type.as_deref())?;

    let (page_count, duration) = match kind {
        MediaKind::Pdf => (media::pdf_page_count(&file.bytes), None),
        MediaKind::Image => (None, None),
        MediaKind::Video => (None, Some(None)),
    };
    let stored = state.media.store(room, kind, &file.filename, &file.bytes).await?;

    Ok(UploadResponse {
        success: true,
        kind,
        urls: vec![stored.url.clone()],
        url: stored.url,
        filename: stored.filename,
        saved_filename: stored.saved_filename,
        size: stored.size,
        room_code: room.to_owned(),
        page_count,
        duration,
    })
}

// =============================================================================
// LIST
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub session_code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub success: bool,
    pub session_code: String,
    pub files: MediaListing,
    pub total_files: usize,
}

/// `GET /api/uploads?sessionCode=`
///
/// # Errors
///
/// Returns [`MediaError::MissingRoom`] without a session code.
pub async fn list_uploads(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, MediaError> {
    let room = media::check_room(query.session_code.as_deref().unwrap_or_default())?;
    let files = state.media.list(room).await?;
    Ok(Json(ListResponse {
        success: true,
        session_code: room.to_owned(),
        total_files: files.total(),
        files,
    }))
}
