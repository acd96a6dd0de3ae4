use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{validate_slot_key, BlobStore, StorageError, StoredPhoto};

/// In-memory slot store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryBlobStore {
    slots: RwLock<HashMap<String, Arc<StoredPhoto>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read(&self, slot_key: &str) -> Result<Option<Arc<StoredPhoto>>, StorageError> {
        validate_slot_key(slot_key)?;
        Ok(self.slots.read().get(slot_key).cloned())
    }

    async fn write(
        &self,
        slot_key: &str,
        photo: StoredPhoto,
    ) -> Result<Arc<StoredPhoto>, StorageError> {
        validate_slot_key(slot_key)?;
        let photo = Arc::new(photo);
        self.slots.write().insert(slot_key.to_string(), Arc::clone(&photo));
        Ok(photo)
    }
}
