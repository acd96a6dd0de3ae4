use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use image::DynamicImage;
use parking_lot::Mutex;

use crate::logic::similarity::{decode_image, DecodedImage, SimilarityScorer};
use crate::logic::storage::{BlobStore, StoredPhoto, CURRENT_PHOTO_SLOT};
use crate::logic::threshold::ThresholdStore;

use super::types::{AdmissionError, AdmissionResult, CandidatePhoto};

pub const DEFAULT_SCORER_TIMEOUT: Duration = Duration::from_secs(10);
/// Score reported for the upload that seeds an empty slot
pub const SEED_SCORE: f64 = 1.0;
const MAX_LABEL_LEN: usize = 255;

/// Decides whether an upload replaces the current photo.
///
/// Holds handles to its collaborators; no lock is held while scoring.
pub struct AdmissionEngine {
    photos: Arc<dyn BlobStore>,
    thresholds: Arc<ThresholdStore>,
    scorer: Arc<dyn SimilarityScorer>,
    scorer_timeout: Duration,
    /// Decoded form of the current reference, keyed by its digest
    reference_cache: Mutex<Option<(String, Arc<DynamicImage>)>>,
}

impl AdmissionEngine {
    pub fn new(
        photos: Arc<dyn BlobStore>,
        thresholds: Arc<ThresholdStore>,
        scorer: Arc<dyn SimilarityScorer>,
    ) -> Self {
        Self {
            photos,
            thresholds,
            scorer,
            scorer_timeout: DEFAULT_SCORER_TIMEOUT,
            reference_cache: Mutex::new(None),
        }
    }

    pub fn with_scorer_timeout(mut self, timeout: Duration) -> Self {
        self.scorer_timeout = timeout;
        self
    }

    pub fn scorer_timeout(&self) -> Duration {
        self.scorer_timeout
    }

    /// Score `candidate` against the current photo and store it if it passes.
    ///
    /// `Ok(result)` with `result.accepted == true` means the slot now holds the
    /// candidate; any other return leaves the slot untouched.
    pub async fn evaluate(
        &self,
        candidate: CandidatePhoto,
    ) -> Result<AdmissionResult, AdmissionError> {
        if let Some(content_type) = candidate.content_type.as_deref() {
            if !content_type.starts_with("image/") {
                return Err(AdmissionError::InvalidImage("File must be an image".to_string()));
            }
        }

        let CandidatePhoto { bytes, filename, .. } = candidate;
        let (bytes, decoded) = decode_blocking(bytes).await?;

        let threshold = self.thresholds.get();
        let reference = self.photos.read(CURRENT_PHOTO_SLOT).await?;

        let label = photo_label(filename.as_deref(), &decoded);
        let content_type = decoded.content_type();
        let candidate_image = Arc::new(decoded.image);

        let Some(reference) = reference else {
            let stored = self
                .photos
                .write(CURRENT_PHOTO_SLOT, StoredPhoto::new(bytes, label, content_type))
                .await?;
            self.remember_reference(&stored.digest, candidate_image);

            tracing::info!(
                filename = %stored.filename,
                threshold,
                "Slot was empty, upload seeded the reference"
            );
            let filename = stored.filename.clone();
            return Ok(AdmissionResult::accepted(SEED_SCORE, threshold, filename, true));
        };

        let score = self.score(Arc::clone(&candidate_image), &reference).await?;

        if score >= threshold {
            let stored = self
                .photos
                .write(CURRENT_PHOTO_SLOT, StoredPhoto::new(bytes, label, content_type))
                .await?;
            self.remember_reference(&stored.digest, candidate_image);

            tracing::info!(
                filename = %stored.filename,
                score,
                threshold,
                "Upload accepted, reference replaced"
            );
            Ok(AdmissionResult::accepted(score, threshold, stored.filename.clone(), false))
        } else {
            tracing::info!(
                filename = %label,
                score,
                threshold,
                reference = %reference.filename,
                "Upload rejected, reference kept"
            );
            Ok(AdmissionResult::rejected(score, threshold))
        }
    }

    /// Run the scorer on the blocking pool, bounded by the timeout
    async fn score(
        &self,
        candidate: Arc<DynamicImage>,
        reference: &StoredPhoto,
    ) -> Result<f64, AdmissionError> {
        let cached = self.cached_reference(&reference.digest);
        let reference_bytes = if cached.is_none() {
            Some(reference.bytes.clone())
        } else {
            None
        };

        let scorer = Arc::clone(&self.scorer);
        let task = tokio::task::spawn_blocking(move || {
            let reference_image = match (cached, reference_bytes) {
                (Some(image), _) => image,
                (None, Some(bytes)) => match decode_image(&bytes) {
                    Ok(decoded) => Arc::new(decoded.image),
                    Err(e) => return Err(format!("reference photo could not be decoded: {}", e)),
                },
                (None, None) => return Err("reference photo missing".to_string()),
            };
            let score = scorer
                .score(&candidate, &reference_image)
                .map_err(|e| e.to_string())?;
            Ok((score, reference_image))
        });

        let outcome = match tokio::time::timeout(self.scorer_timeout, task).await {
            Err(_) => Err(format!(
                "{} scorer did not respond within {:?}",
                self.scorer.name(),
                self.scorer_timeout
            )),
            Ok(Err(join_error)) => {
                Err(format!("{} scorer crashed: {}", self.scorer.name(), join_error))
            }
            Ok(Ok(result)) => result,
        };

        let (score, reference_image) = outcome.map_err(|reason| {
            tracing::error!(reason = %reason, "Scoring failed");
            AdmissionError::ScorerUnavailable(reason)
        })?;

        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            tracing::error!(
                score,
                scorer = self.scorer.name(),
                "Scorer returned a value outside [0, 1]"
            );
            return Err(AdmissionError::ScorerUnavailable(format!(
                "{} scorer returned an invalid score ({})",
                self.scorer.name(),
                score
            )));
        }

        self.remember_reference(&reference.digest, reference_image);
        Ok(score)
    }

    fn cached_reference(&self, digest: &str) -> Option<Arc<DynamicImage>> {
        self.reference_cache
            .lock()
            .as_ref()
            .filter(|(cached, _)| cached == digest)
            .map(|(_, image)| Arc::clone(image))
    }

    fn remember_reference(&self, digest: &str, image: Arc<DynamicImage>) {
        *self.reference_cache.lock() = Some((digest.to_string(), image));
    }
}

async fn decode_blocking(bytes: Vec<u8>) -> Result<(Vec<u8>, DecodedImage), AdmissionError> {
    let task = tokio::task::spawn_blocking(move || {
        let decoded = decode_image(&bytes);
        (bytes, decoded)
    });

    match task.await {
        Ok((bytes, Ok(decoded))) => Ok((bytes, decoded)),
        Ok((_, Err(e))) => Err(AdmissionError::InvalidImage(e.to_string())),
        Err(join_error) => Err(AdmissionError::InvalidImage(format!(
            "decoder crashed: {}",
            join_error
        ))),
    }
}

/// Label stored next to an accepted photo: the client's file name without any
/// directory part, or `upload_<timestamp>.<ext>` when none was given
pub(crate) fn photo_label(filename: Option<&str>, decoded: &DecodedImage) -> String {
    let cleaned: String = filename
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .map(|name| name.chars().filter(|c| !c.is_control()).collect::<String>())
        .map(|name| name.trim().to_string())
        .unwrap_or_default();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return format!(
            "upload_{}.{}",
            Utc::now().format("%Y%m%d_%H%M%S"),
            decoded.extension()
        );
    }

    cleaned.chars().take(MAX_LABEL_LEN).collect()
}
