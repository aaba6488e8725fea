//! Media library listing and YouTube thumbnail lookup.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::media::youtube::{extract_video_id, Thumbnails};

/// `GET /api/media`
pub async fn list_media(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let files = state
        .media
        .list()
        .await
        .map_err(|e| ApiError::internal("Failed to fetch media files", e))?;

    Ok(Json(json!({ "success": true, "files": files })))
}

#[derive(Debug, Deserialize)]
pub struct ThumbnailRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// `POST /api/youtube-thumbnail`
pub async fn youtube_thumbnail(
    payload: Result<Json<ThumbnailRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let url = request
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("No URL provided".into()))?;

    let video_id =
        extract_video_id(&url).ok_or_else(|| ApiError::BadRequest("Invalid YouTube URL".into()))?;

    Ok(Json(json!({
        "success": true,
        "thumbnails": Thumbnails::for_video(&video_id),
        "videoId": video_id,
        "videoUrl": url,
    })))
}
