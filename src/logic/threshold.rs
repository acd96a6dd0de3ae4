//! Admission Threshold Store
//!
//! Holds the minimum similarity score an upload needs to be accepted.
//! The value lives in an `AtomicU64` (f64 bit pattern) so readers never take
//! a lock and never see a torn value. Writers are serialized and persist the
//! value before publishing it.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::logic::storage::write_synced;

#[derive(Debug, Error)]
pub enum ThresholdError {
    #[error("Threshold must be between 0.0 and 1.0 (got {0})")]
    OutOfRange(f64),

    #[error("Failed to persist threshold: {0}")]
    Io(#[from] std::io::Error),

    #[error("Threshold file is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persisted threshold file format
#[derive(Debug, Serialize, Deserialize)]
struct ThresholdFile {
    threshold: f64,
    updated_at: DateTime<Utc>,
}

/// Reject anything outside [0.0, 1.0], NaN included
pub fn check_range(value: f64) -> Result<f64, ThresholdError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ThresholdError::OutOfRange(value))
    }
}

/// Format a threshold as a percentage with one decimal ("90.0%")
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Single-value threshold store
pub struct ThresholdStore {
    bits: AtomicU64,
    /// `None` keeps the value in memory only
    path: Option<PathBuf>,
    write_lock: Mutex<()>,
}

impl ThresholdStore {
    /// Load the persisted threshold from `path`, falling back to `default`
    /// when the file is missing or holds an invalid value
    pub async fn open(path: impl Into<PathBuf>, default: f64) -> Result<Self, ThresholdError> {
        let default = check_range(default)?;
        let path = path.into();

        let initial = match load_file(&path).await {
            Ok(Some(value)) => match check_range(value) {
                Ok(value) => {
                    tracing::info!(
                        "Loaded threshold {} from {}",
                        format_percent(value),
                        path.display()
                    );
                    value
                }
                Err(e) => {
                    tracing::warn!("Ignoring persisted threshold: {}", e);
                    default
                }
            },
            Ok(None) => {
                tracing::info!("No persisted threshold, using default {}", format_percent(default));
                default
            }
            Err(e) => {
                tracing::warn!("Failed to read {}: {}, using default", path.display(), e);
                default
            }
        };

        Ok(Self {
            bits: AtomicU64::new(initial.to_bits()),
            path: Some(path),
            write_lock: Mutex::new(()),
        })
    }

    /// Store that never touches the disk
    pub fn in_memory(initial: f64) -> Result<Self, ThresholdError> {
        let initial = check_range(initial)?;
        Ok(Self {
            bits: AtomicU64::new(initial.to_bits()),
            path: None,
            write_lock: Mutex::new(()),
        })
    }

    /// Latest committed threshold
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Replace the threshold, returning the value it replaced.
    ///
    /// Out-of-range values and persistence failures leave the current value
    /// untouched.
    pub async fn set(&self, value: f64) -> Result<f64, ThresholdError> {
        let value = check_range(value)?;
        let _writer = self.write_lock.lock().await;

        if let Some(path) = &self.path {
            persist(path, value).await?;
        }

        let previous = f64::from_bits(self.bits.swap(value.to_bits(), Ordering::AcqRel));
        Ok(previous)
    }
}

async fn load_file(path: &Path) -> Result<Option<f64>, ThresholdError> {
    match tokio::fs::read(path).await {
        Ok(data) => {
            let file: ThresholdFile = serde_json::from_slice(&data)?;
            Ok(Some(file.threshold))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write to a synced sibling temp file and rename it into place
async fn persist(path: &Path, value: f64) -> Result<(), ThresholdError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_vec_pretty(&ThresholdFile {
        threshold: value,
        updated_at: Utc::now(),
    })?;

    let staged = path.with_extension("json.tmp");
    if let Err(e) = write_synced(&staged, &json).await {
        let _ = tokio::fs::remove_file(&staged).await;
        return Err(e.into());
    }
    tokio::fs::rename(&staged, path).await?;
    Ok(())
}
