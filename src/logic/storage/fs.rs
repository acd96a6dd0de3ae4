//! Filesystem slot store
//!
//! Each slot is a directory under the store root:
//!
//! ```text
//! <root>/<slot>/manifest.json      filename, content type, digest, blob name
//! <root>/<slot>/blob-<uuid>.bin    photo bytes referenced by the manifest
//! ```
//!
//! A write lands the bytes in a fresh blob file, then renames a new manifest
//! over the old one. The rename is the commit point; the slot directory is
//! synced before the previous blob is removed. Anything not referenced by a
//! manifest at start-up is debris from an interrupted write and gets swept.
//!
//! A slot whose manifest or blob cannot be loaded is kept as corrupt: reads
//! fail until a write replaces it, so a damaged reference is never mistaken
//! for an empty slot.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{digest_hex, validate_slot_key, write_synced, BlobStore, StorageError, StoredPhoto};

const MANIFEST_FILE: &str = "manifest.json";
const MANIFEST_FORMAT_VERSION: u32 = 1;

/// On-disk slot manifest
#[derive(Debug, Serialize, Deserialize)]
struct SlotManifest {
    format_version: u32,
    filename: String,
    content_type: String,
    digest: String,
    size_bytes: u64,
    stored_at: DateTime<Utc>,
    blob: String,
}

impl SlotManifest {
    fn for_photo(photo: &StoredPhoto, blob: &str) -> Self {
        Self {
            format_version: MANIFEST_FORMAT_VERSION,
            filename: photo.filename.clone(),
            content_type: photo.content_type.clone(),
            digest: photo.digest.clone(),
            size_bytes: photo.bytes.len() as u64,
            stored_at: photo.stored_at,
            blob: blob.to_string(),
        }
    }
}

/// In-memory view of one slot directory
#[derive(Debug, Clone)]
enum SlotState {
    Ready(Arc<StoredPhoto>),
    Corrupt(String),
}

/// Durable slot store backed by a directory
pub struct FsBlobStore {
    root: PathBuf,
    /// Committed photos; readers never touch the disk
    slots: RwLock<HashMap<String, SlotState>>,
    /// Serializes writers so disk order and memory order agree
    write_lock: Mutex<()>,
}

impl FsBlobStore {
    /// Open (or create) a store rooted at `root`, loading every committed slot
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;

        let mut slots = HashMap::new();
        let mut entries = fs::read_dir(&root).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let Some(slot) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if validate_slot_key(&slot).is_err() {
                continue;
            }

            match load_slot(&entry.path(), &slot).await {
                Ok(Some(photo)) => {
                    tracing::info!(
                        slot = %slot,
                        filename = %photo.filename,
                        size_bytes = photo.bytes.len(),
                        "Loaded stored photo"
                    );
                    slots.insert(slot, SlotState::Ready(Arc::new(photo)));
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(
                        slot = %slot,
                        error = %e,
                        "Unreadable slot, reads fail until rewritten"
                    );
                    slots.insert(slot, SlotState::Corrupt(e.to_string()));
                }
            }
        }

        Ok(Self {
            root,
            slots: RwLock::new(slots),
            write_lock: Mutex::new(()),
        })
    }

    /// Root directory of this store
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_dir(&self, slot_key: &str) -> PathBuf {
        self.root.join(slot_key)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn read(&self, slot_key: &str) -> Result<Option<Arc<StoredPhoto>>, StorageError> {
        validate_slot_key(slot_key)?;
        match self.slots.read().get(slot_key) {
            Some(SlotState::Ready(photo)) => Ok(Some(Arc::clone(photo))),
            Some(SlotState::Corrupt(reason)) => Err(StorageError::Corrupt {
                slot: slot_key.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(None),
        }
    }

    async fn write(
        &self,
        slot_key: &str,
        photo: StoredPhoto,
    ) -> Result<Arc<StoredPhoto>, StorageError> {
        validate_slot_key(slot_key)?;
        let _writer = self.write_lock.lock().await;

        let dir = self.slot_dir(slot_key);
        fs::create_dir_all(&dir).await?;

        let blob = format!("blob-{}.bin", Uuid::new_v4());
        write_synced(&dir.join(&blob), &photo.bytes).await?;

        let manifest = serde_json::to_vec_pretty(&SlotManifest::for_photo(&photo, &blob))?;
        let staged = dir.join(format!("{}.{}.tmp", MANIFEST_FILE, Uuid::new_v4()));
        if let Err(e) = write_synced(&staged, &manifest).await {
            let _ = fs::remove_file(dir.join(&blob)).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&staged, dir.join(MANIFEST_FILE)).await {
            let _ = fs::remove_file(&staged).await;
            let _ = fs::remove_file(dir.join(&blob)).await;
            return Err(e.into());
        }

        let photo = Arc::new(photo);
        self.slots
            .write()
            .insert(slot_key.to_string(), SlotState::Ready(Arc::clone(&photo)));

        // The rename must be durable before the old blob goes away
        if let Err(e) = sync_dir(&dir).await {
            tracing::warn!(slot = %slot_key, "Slot directory not synced, keeping old blobs: {}", e);
        } else if let Err(e) = sweep_debris(&dir, Some(&blob)).await {
            tracing::warn!(slot = %slot_key, "Failed to remove replaced blobs: {}", e);
        }

        tracing::debug!(slot = %slot_key, blob = %blob, digest = %photo.digest, "Slot replaced");
        Ok(photo)
    }
}

#[cfg(unix)]
async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

async fn read_manifest(dir: &Path) -> Result<Option<SlotManifest>, StorageError> {
    match fs::read(dir.join(MANIFEST_FILE)).await {
        Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Load the committed photo of one slot and sweep leftovers of interrupted writes
async fn load_slot(dir: &Path, slot: &str) -> Result<Option<StoredPhoto>, StorageError> {
    let manifest = read_manifest(dir).await?;
    sweep_debris(dir, manifest.as_ref().map(|m| m.blob.as_str())).await?;

    let Some(manifest) = manifest else {
        return Ok(None);
    };

    if manifest.format_version != MANIFEST_FORMAT_VERSION {
        return Err(StorageError::Corrupt {
            slot: slot.to_string(),
            reason: format!("unsupported manifest version {}", manifest.format_version),
        });
    }
    if manifest.blob.contains('/') || manifest.blob.contains('\\') {
        return Err(StorageError::Corrupt {
            slot: slot.to_string(),
            reason: format!("blob name {:?} escapes the slot", manifest.blob),
        });
    }

    let bytes = fs::read(dir.join(&manifest.blob)).await?;
    let digest = digest_hex(&bytes);
    if digest != manifest.digest {
        return Err(StorageError::Corrupt {
            slot: slot.to_string(),
            reason: format!("digest mismatch (manifest {}, blob {})", manifest.digest, digest),
        });
    }

    Ok(Some(StoredPhoto {
        bytes,
        filename: manifest.filename,
        content_type: manifest.content_type,
        digest,
        stored_at: manifest.stored_at,
    }))
}

async fn sweep_debris(dir: &Path, keep_blob: Option<&str>) -> Result<(), StorageError> {
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };

        let stale_blob = name.starts_with("blob-") && Some(name) != keep_blob;
        let stale_manifest = name.starts_with(MANIFEST_FILE) && name.ends_with(".tmp");
        if stale_blob || stale_manifest {
            tracing::debug!("Sweeping leftover {}", name);
            if let Err(e) = fs::remove_file(entry.path()).await {
                tracing::warn!("Failed to sweep {}: {}", name, e);
            }
        }
    }
    Ok(())
}
