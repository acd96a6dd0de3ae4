//! Similarity Module - Image decoding and scoring
//!
//! The admission engine only sees the [`SimilarityScorer`] trait, so the
//! comparison algorithm can be swapped without touching admission logic.
//!
//! # Architecture
//! - `decode.rs`: Payload sniffing and decoding
//! - `histogram.rs`: Default scorer (grayscale MSE + colour histogram correlation)

pub mod decode;
pub mod histogram;

use image::DynamicImage;
use thiserror::Error;

pub use decode::{decode_image, DecodeError, DecodedImage};
pub use histogram::HistogramScorer;

#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("Scorer failed: {0}")]
    Failed(String),
}

/// Compares two decoded images.
///
/// Implementations must be deterministic and return a value in [0.0, 1.0];
/// higher means more alike.
pub trait SimilarityScorer: Send + Sync {
    fn score(&self, candidate: &DynamicImage, reference: &DynamicImage) -> Result<f64, ScorerError>;

    /// Short identifier used in logs
    fn name(&self) -> &'static str {
        "custom"
    }
}
