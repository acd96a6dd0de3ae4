//! Shared test fixtures: generated images, controllable scorers and a broken store

use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use super::similarity::{ScorerError, SimilarityScorer};
use super::storage::{BlobStore, StorageError, StoredPhoto};

/// Encode a small solid-colour PNG
pub fn png(color: [u8; 3]) -> Vec<u8> {
    encode(RgbImage::from_pixel(8, 8, Rgb(color)), ImageFormat::Png)
}

/// Encode a small solid-colour JPEG
pub fn jpeg(color: [u8; 3]) -> Vec<u8> {
    encode(RgbImage::from_pixel(8, 8, Rgb(color)), ImageFormat::Jpeg)
}

fn encode(img: RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut out, format).unwrap();
    out.into_inner()
}

/// Returns whatever score it was last told to
pub struct FixedScorer {
    bits: AtomicU64,
}

impl FixedScorer {
    pub fn new(score: f64) -> Self {
        Self {
            bits: AtomicU64::new(score.to_bits()),
        }
    }

    pub fn set(&self, score: f64) {
        self.bits.store(score.to_bits(), Ordering::SeqCst);
    }
}

impl SimilarityScorer for FixedScorer {
    fn score(&self, _: &DynamicImage, _: &DynamicImage) -> Result<f64, ScorerError> {
        Ok(f64::from_bits(self.bits.load(Ordering::SeqCst)))
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Always errors
pub struct FailingScorer;

impl SimilarityScorer for FailingScorer {
    fn score(&self, _: &DynamicImage, _: &DynamicImage) -> Result<f64, ScorerError> {
        Err(ScorerError::Failed("model offline".to_string()))
    }
}

/// Always panics
pub struct PanickingScorer;

impl SimilarityScorer for PanickingScorer {
    fn score(&self, _: &DynamicImage, _: &DynamicImage) -> Result<f64, ScorerError> {
        panic!("scorer bug")
    }
}

/// Sleeps before answering
pub struct SlowScorer {
    pub delay: Duration,
    pub score: f64,
}

impl SimilarityScorer for SlowScorer {
    fn score(&self, _: &DynamicImage, _: &DynamicImage) -> Result<f64, ScorerError> {
        std::thread::sleep(self.delay);
        Ok(self.score)
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}

/// Serves a fixed photo (or nothing) and fails every write
pub struct FailingBlobStore {
    current: Option<Arc<StoredPhoto>>,
}

impl FailingBlobStore {
    pub fn empty() -> Self {
        Self { current: None }
    }

    pub fn holding(photo: StoredPhoto) -> Self {
        Self {
            current: Some(Arc::new(photo)),
        }
    }
}

#[async_trait]
impl BlobStore for FailingBlobStore {
    async fn read(&self, _: &str) -> Result<Option<Arc<StoredPhoto>>, StorageError> {
        Ok(self.current.clone())
    }

    async fn write(&self, _: &str, _: StoredPhoto) -> Result<Arc<StoredPhoto>, StorageError> {
        Err(StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )))
    }
}
