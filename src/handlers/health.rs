//! Health check handler

use axum::{extract::State, Json};

use crate::{AppResult, AppState};
use crate::logic::storage::CURRENT_PHOTO_SLOT;
use crate::models::{PhotoStatus, StatusResponse};

pub async fn check(State(state): State<AppState>) -> AppResult<Json<StatusResponse>> {
    let photo = state.photos.read(CURRENT_PHOTO_SLOT).await?;

    Ok(Json(StatusResponse {
        status: "healthy",
        service: "photo-match",
        version: env!("CARGO_PKG_VERSION"),
        match_threshold: state.thresholds.get(),
        photo: PhotoStatus::from(photo.as_deref()),
        timestamp: chrono::Utc::now().timestamp(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::handlers::testing::{get, json_body, test_app, upload_png};
    use crate::logic::test_support::png;

    #[tokio::test]
    async fn test_status_without_photo() {
        let t = test_app(1.0);

        let response = get(&t.app, "/status").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "photo-match");
        assert_eq!(body["match_threshold"], 0.9);
        assert_eq!(body["photo"]["present"], false);
    }

    #[tokio::test]
    async fn test_health_alias_reports_photo() {
        let t = test_app(1.0);
        let upload = upload_png(&t.app, "a.png", &png([1, 2, 3])).await;
        assert_eq!(upload.status(), StatusCode::OK);

        let body = json_body(get(&t.app, "/health").await).await;
        assert_eq!(body["photo"]["present"], true);
        assert_eq!(body["photo"]["filename"], "a.png");
        assert_eq!(body["photo"]["size_bytes"], png([1, 2, 3]).len());
    }
}
