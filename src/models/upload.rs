//! Upload response model

use serde::Serialize;

use crate::logic::admission::{AdmissionOutcome, AdmissionResult};

/// Body returned for a decided upload (accepted or rejected).
///
/// `outcome` / `accepted` are authoritative; `result` is display text only.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub outcome: AdmissionOutcome,
    pub accepted: bool,
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub score: f64,
    pub threshold: f64,
}

impl From<AdmissionResult> for UploadResponse {
    fn from(result: AdmissionResult) -> Self {
        Self {
            outcome: result.outcome,
            accepted: result.accepted,
            result: result.message,
            filename: result.filename,
            score: result.score,
            threshold: result.threshold,
        }
    }
}
