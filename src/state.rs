//! Shared application state
//!
//! Stores are built once at start-up and handed to every handler through
//! `AppState`; nothing reaches for process globals.

use std::sync::Arc;

use anyhow::Context;

use crate::config::Config;
use crate::logic::admission::AdmissionEngine;
use crate::logic::similarity::{HistogramScorer, SimilarityScorer};
use crate::logic::storage::{BlobStore, FsBlobStore};
use crate::logic::threshold::ThresholdStore;

const PHOTO_DIR: &str = "photo";
const THRESHOLD_FILE: &str = "threshold.json";

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AdmissionEngine>,
    pub photos: Arc<dyn BlobStore>,
    pub thresholds: Arc<ThresholdStore>,
    pub config: Config,
}

impl AppState {
    /// Open the durable stores under `config.data_dir` with the default scorer
    pub async fn open(config: Config) -> anyhow::Result<Self> {
        let photos = FsBlobStore::open(config.data_dir.join(PHOTO_DIR))
            .await
            .with_context(|| {
                format!("Failed to open photo store in {}", config.data_dir.display())
            })?;

        let threshold_path = config.data_dir.join(THRESHOLD_FILE);
        let thresholds = ThresholdStore::open(threshold_path, config.default_threshold)
            .await
            .context("Failed to open threshold store")?;

        Ok(Self::from_parts(
            config,
            Arc::new(photos),
            Arc::new(thresholds),
            Arc::new(HistogramScorer::new()),
        ))
    }

    /// Assemble state from already-built collaborators
    pub fn from_parts(
        config: Config,
        photos: Arc<dyn BlobStore>,
        thresholds: Arc<ThresholdStore>,
        scorer: Arc<dyn SimilarityScorer>,
    ) -> Self {
        let engine = AdmissionEngine::new(Arc::clone(&photos), Arc::clone(&thresholds), scorer)
            .with_scorer_timeout(config.scorer_timeout);

        Self {
            engine: Arc::new(engine),
            photos,
            thresholds,
            config,
        }
    }

    /// Called once the server has stopped accepting requests
    pub fn shutdown(self) {
        // Every committed write is already on disk; dropping the handles is enough
        tracing::info!(
            threshold = self.thresholds.get(),
            "State released, photo store and threshold store closed"
        );
    }
}
