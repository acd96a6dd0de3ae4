//! Default similarity scorer
//!
//! Equal-weight blend of two signals computed on 500x500 resamples:
//! - grayscale (BT.601 luma) mean squared error, mapped to `1 / (1 + mse / 1000)`
//! - correlation of 8x8x8 RGB colour histograms
//!
//! The blend is clamped to [0.0, 1.0] since histogram correlation can go
//! negative.

use image::imageops::FilterType;
use image::DynamicImage;

use super::{ScorerError, SimilarityScorer};

/// Longest side before comparison; larger inputs are downscaled first
const MAX_SIDE: u32 = 1000;
/// Both images are resampled to this square before comparing
const COMPARE_SIDE: u32 = 500;
const MSE_SCALE: f64 = 1000.0;
const BINS_PER_CHANNEL: usize = 8;
const MSE_WEIGHT: f64 = 0.5;
const HISTOGRAM_WEIGHT: f64 = 0.5;
/// BT.601 luma weights for R, G, B
const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

#[derive(Debug, Default, Clone, Copy)]
pub struct HistogramScorer;

impl HistogramScorer {
    pub fn new() -> Self {
        Self
    }
}

impl SimilarityScorer for HistogramScorer {
    fn score(
        &self,
        candidate: &DynamicImage,
        reference: &DynamicImage,
    ) -> Result<f64, ScorerError> {
        let is_empty = |img: &DynamicImage| img.width() == 0 || img.height() == 0;
        if is_empty(candidate) || is_empty(reference) {
            return Err(ScorerError::Failed("cannot compare an empty image".to_string()));
        }

        let a = prepare(candidate);
        let b = prepare(reference);

        let mse = grayscale_similarity(&a, &b);
        let hist = histogram_correlation(&color_histogram(&a), &color_histogram(&b));
        let combined = MSE_WEIGHT * mse + HISTOGRAM_WEIGHT * hist;

        tracing::trace!(mse, hist, combined, "Similarity components");

        if !combined.is_finite() {
            return Err(ScorerError::Failed(format!("non-finite score {}", combined)));
        }
        Ok(combined.clamp(0.0, 1.0))
    }

    fn name(&self) -> &'static str {
        "histogram"
    }
}

fn prepare(image: &DynamicImage) -> DynamicImage {
    let bounded = if image.width().max(image.height()) > MAX_SIDE {
        image.resize(MAX_SIDE, MAX_SIDE, FilterType::Triangle)
    } else {
        image.clone()
    };
    bounded.resize_exact(COMPARE_SIDE, COMPARE_SIDE, FilterType::Triangle)
}

/// 8-bit BT.601 luma of every pixel, rounded like an integer grayscale conversion
fn luma(image: &DynamicImage) -> Vec<u8> {
    image
        .to_rgb8()
        .pixels()
        .map(|p| {
            let y: f64 = p.0.iter().zip(LUMA_WEIGHTS).map(|(&c, w)| w * c as f64).sum();
            y.round().clamp(0.0, 255.0) as u8
        })
        .collect()
}

fn grayscale_similarity(a: &DynamicImage, b: &DynamicImage) -> f64 {
    let a = luma(a);
    let b = luma(b);

    let pixels = a.len().max(1) as f64;
    let sum_sq: f64 = a
        .iter()
        .zip(&b)
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum();

    let mse = sum_sq / pixels;
    1.0 / (1.0 + mse / MSE_SCALE)
}

fn color_histogram(image: &DynamicImage) -> Vec<f64> {
    let shift = 8 - BINS_PER_CHANNEL.trailing_zeros();
    let mut hist = vec![0.0; BINS_PER_CHANNEL.pow(3)];

    for pixel in image.to_rgb8().pixels() {
        let [r, g, b] = pixel.0;
        let (r, g, b) = ((r >> shift) as usize, (g >> shift) as usize, (b >> shift) as usize);
        let idx = (r * BINS_PER_CHANNEL + g) * BINS_PER_CHANNEL + b;
        hist[idx] += 1.0;
    }

    // L2 normalize
    let norm = hist.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for v in hist.iter_mut() {
            *v /= norm;
        }
    }
    hist
}

/// Pearson correlation of two histograms, in [-1.0, 1.0]
fn histogram_correlation(h1: &[f64], h2: &[f64]) -> f64 {
    let n = h1.len() as f64;
    let mean1 = h1.iter().sum::<f64>() / n;
    let mean2 = h2.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut den1 = 0.0;
    let mut den2 = 0.0;
    for (a, b) in h1.iter().zip(h2) {
        let da = a - mean1;
        let db = b - mean2;
        num += da * db;
        den1 += da * da;
        den2 += db * db;
    }

    let den = (den1 * den2).sqrt();
    if den <= f64::EPSILON {
        // Flat histograms carry no shape to correlate
        return if h1 == h2 { 1.0 } else { 0.0 };
    }
    (num / den).clamp(-1.0, 1.0)
}
