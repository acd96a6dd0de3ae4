//! Storage Module - Photo slot persistence
//!
//! Holds at most one photo per slot key. The service only ever uses
//! [`CURRENT_PHOTO_SLOT`].
//!
//! # Architecture
//! - `fs.rs`: Durable store (copy-on-write blob + manifest rename)
//! - `memory.rs`: Process-local store for tests and throwaway runs
//!
//! # Consistency
//! Readers always get an `Arc<StoredPhoto>` snapshot: either the photo that
//! was current before a write, or the complete new one. Never a mix.

pub mod fs;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;

/// The one well-known slot holding the current reference photo
pub const CURRENT_PHOTO_SLOT: &str = "current";

/// A photo held in a slot
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPhoto {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: String,
    /// Hex SHA-256 of `bytes`
    pub digest: String,
    pub stored_at: DateTime<Utc>,
}

impl StoredPhoto {
    pub fn new(
        bytes: Vec<u8>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        let digest = digest_hex(&bytes);
        Self {
            bytes,
            filename: filename.into(),
            content_type: content_type.into(),
            digest,
            stored_at: Utc::now(),
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// Hex-encoded SHA-256 of a payload
pub fn digest_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Invalid slot key: {0:?}")]
    InvalidSlotKey(String),

    #[error("Slot {slot} is corrupt: {reason}")]
    Corrupt { slot: String, reason: String },
}

/// Key -> photo storage with atomic replace
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Current photo in `slot_key`, `None` when the slot is empty
    async fn read(&self, slot_key: &str) -> Result<Option<Arc<StoredPhoto>>, StorageError>;

    /// Replace the photo in `slot_key`. Concurrent readers observe either the
    /// previous photo or `photo`, never a partial write.
    async fn write(
        &self,
        slot_key: &str,
        photo: StoredPhoto,
    ) -> Result<Arc<StoredPhoto>, StorageError>;
}

/// Write a file and flush it to disk before returning
pub(crate) async fn write_synced(path: &std::path::Path, bytes: &[u8]) -> std::io::Result<()> {
    use tokio::io::AsyncWriteExt;

    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

/// Slot keys become directory names, so keep them to a safe alphabet
pub(crate) fn validate_slot_key(slot_key: &str) -> Result<(), StorageError> {
    let valid = !slot_key.is_empty()
        && slot_key.len() <= 64
        && slot_key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidSlotKey(slot_key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_photo_digest() {
        let photo = StoredPhoto::new(b"abc".to_vec(), "a.png", "image/png");
        assert_eq!(
            photo.digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(photo.size_bytes(), 3);
    }

    #[test]
    fn test_slot_key_validation() {
        assert!(validate_slot_key(CURRENT_PHOTO_SLOT).is_ok());
        assert!(validate_slot_key("slot_2-b").is_ok());
        assert!(validate_slot_key("").is_err());
        assert!(validate_slot_key("../escape").is_err());
        assert!(validate_slot_key("a/b").is_err());
    }
}
