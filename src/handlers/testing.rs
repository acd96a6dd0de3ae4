//! Router test helpers

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use tower::ServiceExt;

use crate::config::Config;
use crate::logic::storage::{BlobStore, MemoryBlobStore};
use crate::logic::test_support::FixedScorer;
use crate::logic::threshold::ThresholdStore;
use crate::{create_router, AppState};

const BOUNDARY: &str = "photo-match-test-boundary";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub scorer: Arc<FixedScorer>,
}

/// Router over in-memory stores, threshold 0.90, scorer fixed at `score`
pub fn test_app(score: f64) -> TestApp {
    test_app_with_store(score, Arc::new(MemoryBlobStore::new()))
}

/// Same as [`test_app`] over the given photo store
pub fn test_app_with_store(score: f64, photos: Arc<dyn BlobStore>) -> TestApp {
    let scorer = Arc::new(FixedScorer::new(score));
    let state = AppState::from_parts(
        Config::with_data_dir(std::env::temp_dir().join("photo-match-unused")),
        photos,
        Arc::new(ThresholdStore::in_memory(0.90).unwrap()),
        scorer.clone(),
    );
    TestApp {
        app: create_router(state.clone()),
        state,
        scorer,
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// POST a single-part multipart body to /api/upload
pub async fn multipart_upload(
    app: &Router,
    field: &str,
    filename: Option<&str>,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Response<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());

    let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", field);
    if let Some(filename) = filename {
        disposition.push_str(&format!("; filename=\"{}\"", filename));
    }
    body.extend_from_slice(disposition.as_bytes());
    body.extend_from_slice(b"\r\n");

    if let Some(content_type) = content_type {
        body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

/// Upload `bytes` as `filename` with an `image/png` content type
pub async fn upload_png(app: &Router, filename: &str, bytes: &[u8]) -> Response<Body> {
    multipart_upload(app, "file", Some(filename), Some("image/png"), bytes).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
