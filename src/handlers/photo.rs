//! Current photo handler

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};

use crate::{AppError, AppResult, AppState};
use crate::logic::storage::CURRENT_PHOTO_SLOT;

/// Raw bytes of the current photo. Query parameters (cache busters) are ignored.
pub async fn current(State(state): State<AppState>) -> AppResult<Response> {
    let photo = state
        .photos
        .read(CURRENT_PHOTO_SLOT)
        .await?
        .ok_or_else(|| AppError::NotFound("No photos found".to_string()))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&photo.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    if let Ok(etag) = HeaderValue::from_str(&format!("\"{}\"", photo.digest)) {
        headers.insert(header::ETAG, etag);
    }

    Ok((headers, photo.bytes.clone()).into_response())
}
