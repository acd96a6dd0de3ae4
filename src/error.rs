//! Error handling

use axum::{
    extract::multipart::MultipartError,
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::logic::admission::AdmissionError;
use crate::logic::storage::StorageError;
use crate::logic::threshold::ThresholdError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Upload errors
    InvalidImage(String),
    ScorerUnavailable(String),
    PayloadTooLarge(String),

    // Admin errors
    OutOfRange(String),

    // Resource errors
    NotFound(String),

    // Request errors
    BadRequest(String),

    // Storage errors
    StorageError(String),

    // Generic errors
    InternalError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            AppError::ScorerUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::OutOfRange(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            AppError::InvalidImage(msg) => msg.as_str(),
            AppError::ScorerUnavailable(msg) => {
                tracing::warn!("Scorer unavailable: {}", msg);
                "Photo comparison is temporarily unavailable, please retry"
            }
            AppError::PayloadTooLarge(msg) => msg.as_str(),
            AppError::OutOfRange(msg) => msg.as_str(),
            AppError::NotFound(msg) => msg.as_str(),
            AppError::BadRequest(msg) => msg.as_str(),
            AppError::StorageError(msg) => {
                tracing::error!("Storage error: {}", msg);
                "Storage error occurred"
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error"
            }
        };

        let body = Json(json!({
            "outcome": "error",
            "detail": detail,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<AdmissionError> for AppError {
    fn from(err: AdmissionError) -> Self {
        match err {
            AdmissionError::InvalidImage(msg) => AppError::InvalidImage(msg),
            AdmissionError::ScorerUnavailable(msg) => AppError::ScorerUnavailable(msg),
            AdmissionError::Storage(e) => AppError::StorageError(e.to_string()),
        }
    }
}

impl From<ThresholdError> for AppError {
    fn from(err: ThresholdError) -> Self {
        match err {
            ThresholdError::OutOfRange(_) => AppError::OutOfRange(err.to_string()),
            ThresholdError::Io(_) | ThresholdError::Serialization(_) => {
                AppError::StorageError(err.to_string())
            }
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::StorageError(err.to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(err.body_text())
        } else {
            AppError::BadRequest(err.body_text())
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}
