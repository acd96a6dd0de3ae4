//! Service status model

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::logic::storage::StoredPhoto;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub match_threshold: f64,
    pub photo: PhotoStatus,
    pub timestamp: i64,
}

#[derive(Debug, Default, Serialize)]
pub struct PhotoStatus {
    pub present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_at: Option<DateTime<Utc>>,
}

impl From<Option<&StoredPhoto>> for PhotoStatus {
    fn from(photo: Option<&StoredPhoto>) -> Self {
        match photo {
            Some(photo) => Self {
                present: true,
                filename: Some(photo.filename.clone()),
                size_bytes: Some(photo.size_bytes()),
                stored_at: Some(photo.stored_at),
            },
            None => Self::default(),
        }
    }
}
