//! Multipart upload endpoints.

use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{HeaderMap, StatusCode, Uri},
    Json,
};
use axum_extra::extract::CookieJar;
use serde_json::{json, Value};

use crate::admin::auth::current_session;
use crate::http::error::ApiError;
use crate::http::middleware::enforce;
use crate::http::server::AppState;
use crate::media::{MediaError, PendingUpload, UploadKind};
use crate::observability::{metrics, RequestContext, SecurityEventKind};
use crate::security::{ClientIp, ThrottleScope};

/// Form field holding the file.
pub const FILE_FIELD: &str = "file";

/// `POST /api/upload`
pub async fn upload_file(
    State(state): State<AppState>,
    client: ClientIp,
    headers: HeaderMap,
    uri: Uri,
    jar: CookieJar,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let context = RequestContext::new(&client, &headers, uri.path());
    receive(&state, UploadKind::File, &context, &jar, multipart).await
}

/// `POST /api/upload-video`
pub async fn upload_video(
    State(state): State<AppState>,
    client: ClientIp,
    headers: HeaderMap,
    uri: Uri,
    jar: CookieJar,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let context = RequestContext::new(&client, &headers, uri.path());
    receive(&state, UploadKind::Video, &context, &jar, multipart).await
}

async fn receive(
    state: &AppState,
    kind: UploadKind,
    context: &RequestContext,
    jar: &CookieJar,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    enforce(state, ThrottleScope::Upload, context)?;

    if state.config.uploads.require_session && current_session(state, jar).is_none() {
        state.monitor.record(
            SecurityEventKind::UnauthorizedAccess,
            "Upload without admin session",
            json!({ "kind": kind.as_str() }),
            context,
        );
        return Err(ApiError::Unauthorized);
    }

    let mut multipart =
        multipart.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let mut stored = None;
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let mut pending = state
            .media
            .begin(kind, &file_name, &content_type)
            .await
            .map_err(|e| media_error(kind, e))?;
        if let Err(err) = copy_field(kind, &mut field, &mut pending).await {
            pending.discard().await;
            return Err(err);
        }
        stored = Some(pending.finish().await.map_err(|e| media_error(kind, e))?);
        break;
    }

    let stored = stored.ok_or_else(|| media_error(kind, MediaError::MissingFile))?;

    metrics::record_upload(kind.as_str(), stored.size);
    state.monitor.record(
        SecurityEventKind::FileUpload,
        format!("{} uploaded", kind.as_str()),
        json!({
            "name": stored.name,
            "url": stored.url,
            "size": stored.size,
            "type": stored.content_type,
        }),
        context,
    );

    Ok(Json(json!({ "success": true, "file": stored })))
}

/// Stream the field body to disk as it arrives.
async fn copy_field(
    kind: UploadKind,
    field: &mut Field<'_>,
    pending: &mut PendingUpload,
) -> Result<(), ApiError> {
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        pending
            .write_chunk(&chunk)
            .await
            .map_err(|e| media_error(kind, e))?;
    }
    Ok(())
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

fn media_error(kind: UploadKind, err: MediaError) -> ApiError {
    match err {
        MediaError::TooLarge { .. } => ApiError::PayloadTooLarge(err.to_string()),
        MediaError::MissingFile | MediaError::TypeNotAllowed(_) | MediaError::NotAVideo => {
            ApiError::BadRequest(err.to_string())
        }
        MediaError::Io(e) => match kind {
            UploadKind::File => ApiError::internal("Failed to upload file", e),
            UploadKind::Video => ApiError::internal("Failed to upload video", e),
        },
    }
}
