//! Upload handler

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::{AppError, AppResult, AppState};
use crate::logic::admission::CandidatePhoto;
use crate::models::UploadResponse;

const FILE_FIELD: &str = "file";

/// Run an uploaded photo through admission.
///
/// Both accepted and rejected uploads are `200 OK`; the `outcome` field
/// tells them apart.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let candidate = read_file_field(&mut multipart)
        .await?
        .ok_or_else(|| AppError::BadRequest("Missing file field in multipart body".to_string()))?;

    tracing::debug!(
        filename = candidate.filename.as_deref().unwrap_or("-"),
        content_type = candidate.content_type.as_deref().unwrap_or("-"),
        size_bytes = candidate.bytes.len(),
        "Upload received"
    );

    let result = state.engine.evaluate(candidate).await?;
    Ok(Json(result.into()))
}

/// First part named `file`, or failing that the first part carrying a file name
async fn read_file_field(multipart: &mut Multipart) -> Result<Option<CandidatePhoto>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        let is_file = field.name() == Some(FILE_FIELD) || field.file_name().is_some();
        if !is_file {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;

        return Ok(Some(CandidatePhoto {
            bytes: bytes.to_vec(),
            filename,
            content_type,
        }));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use std::sync::Arc;

    use crate::handlers::testing::{
        json_body, multipart_upload, test_app, test_app_with_store, upload_png,
    };
    use crate::logic::admission::types::{ACCEPTED_MESSAGE, REJECTED_MESSAGE, SEEDED_MESSAGE};
    use crate::logic::storage::StoredPhoto;
    use crate::logic::test_support::{png, FailingBlobStore};

    #[tokio::test]
    async fn test_first_upload_is_accepted() {
        let t = test_app(0.0);

        let response = upload_png(&t.app, "first.png", &png([5, 5, 5])).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["outcome"], "accepted");
        assert_eq!(body["accepted"], true);
        assert_eq!(body["filename"], "first.png");
        assert_eq!(body["result"], SEEDED_MESSAGE);
        assert_eq!(body["score"], 1.0);
    }

    #[tokio::test]
    async fn test_accept_then_reject() {
        let t = test_app(0.95);
        upload_png(&t.app, "a.png", &png([1, 1, 1])).await;

        let accepted = json_body(
            upload_png(&t.app, "b.png", &png([2, 2, 2])).await,
        )
        .await;
        assert_eq!(accepted["outcome"], "accepted");
        assert_eq!(accepted["result"], ACCEPTED_MESSAGE);
        assert_eq!(accepted["score"], 0.95);
        assert_eq!(accepted["threshold"], 0.9);

        t.scorer.set(0.70);
        let response = upload_png(&t.app, "c.png", &png([3, 3, 3])).await;
        assert_eq!(response.status(), StatusCode::OK);

        let rejected = json_body(response).await;
        assert_eq!(rejected["outcome"], "rejected");
        assert_eq!(rejected["accepted"], false);
        assert_eq!(rejected["result"], REJECTED_MESSAGE);
        assert!(rejected.get("filename").is_none());
    }

    #[tokio::test]
    async fn test_invalid_image_is_400() {
        let t = test_app(1.0);

        let response = upload_png(&t.app, "notes.png", b"hello").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["outcome"], "error");
        assert!(body["detail"].as_str().unwrap().starts_with("Unrecognized"));
    }

    #[tokio::test]
    async fn test_non_image_content_type_is_400() {
        let t = test_app(1.0);

        let bytes = png([1, 1, 1]);
        let response =
            multipart_upload(&t.app, "file", Some("a.png"), Some("text/plain"), &bytes).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["detail"], "File must be an image");
    }

    #[tokio::test]
    async fn test_missing_file_field_is_400() {
        let t = test_app(1.0);

        let response = multipart_upload(&t.app, "comment", None, None, b"just text").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["detail"]
            .as_str()
            .unwrap()
            .contains("Missing file field"));
    }

    #[tokio::test]
    async fn test_out_of_range_score_is_503() {
        let t = test_app(1.0);
        upload_png(&t.app, "a.png", &png([1, 1, 1])).await;

        t.scorer.set(1.7);
        let response = upload_png(&t.app, "b.png", &png([2, 2, 2])).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["outcome"], "error");
    }

    #[tokio::test]
    async fn test_field_without_filename_uses_generated_label() {
        let t = test_app(1.0);

        let response = multipart_upload(&t.app, "file", None, None, &png([4, 4, 4])).await;
        let body = json_body(response).await;
        assert_eq!(body["accepted"], true);

        let filename = body["filename"].as_str().unwrap();
        assert!(filename.starts_with("upload_"));
        assert!(filename.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_storage_failure_is_500_not_accepted() {
        let reference = StoredPhoto::new(png([1, 1, 1]), "a.png", "image/png");
        let t = test_app_with_store(0.99, Arc::new(FailingBlobStore::holding(reference)));

        let response = upload_png(&t.app, "b.png", &png([2, 2, 2])).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body["outcome"], "error");
        assert_eq!(body["detail"], "Storage error occurred");
        assert!(body.get("accepted").is_none());
    }
}
