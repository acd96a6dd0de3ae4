use serde::Serialize;
use thiserror::Error;

use crate::logic::storage::StorageError;

pub const ACCEPTED_MESSAGE: &str = "Photo matches the reference and is now the current photo";
pub const SEEDED_MESSAGE: &str = "No reference photo yet, this photo is now the reference";
pub const REJECTED_MESSAGE: &str = "Photo does not match the reference closely enough, \
     the current photo was not replaced. Try again with a new photo";

/// An uploaded photo waiting for a decision
#[derive(Debug, Clone)]
pub struct CandidatePhoto {
    pub bytes: Vec<u8>,
    /// Name supplied by the client, if any
    pub filename: Option<String>,
    /// Declared content type, if any
    pub content_type: Option<String>,
}

impl CandidatePhoto {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            filename: None,
            content_type: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionOutcome {
    Accepted,
    Rejected,
}

/// Decision for one upload. Not persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionResult {
    pub outcome: AdmissionOutcome,
    pub accepted: bool,
    pub score: f64,
    /// Threshold the score was compared against
    pub threshold: f64,
    pub message: String,
    /// Label of the stored photo; only set when accepted
    pub filename: Option<String>,
    /// True when the slot was empty and this upload seeded it
    pub seeded: bool,
}

impl AdmissionResult {
    pub(crate) fn accepted(score: f64, threshold: f64, filename: String, seeded: bool) -> Self {
        let message = if seeded { SEEDED_MESSAGE } else { ACCEPTED_MESSAGE };
        Self {
            outcome: AdmissionOutcome::Accepted,
            accepted: true,
            score,
            threshold,
            message: message.to_string(),
            filename: Some(filename),
            seeded,
        }
    }

    pub(crate) fn rejected(score: f64, threshold: f64) -> Self {
        Self {
            outcome: AdmissionOutcome::Rejected,
            accepted: false,
            score,
            threshold,
            message: REJECTED_MESSAGE.to_string(),
            filename: None,
            seeded: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum AdmissionError {
    /// Payload is not a decodable image. Nothing was stored.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Scoring failed, timed out or produced an unusable value. Nothing was
    /// stored; the caller may retry.
    #[error("Similarity scorer unavailable: {0}")]
    ScorerUnavailable(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),
}
