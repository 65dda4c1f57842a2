use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{public_url, validate_key, ObjectStore, StoredObject};
use crate::error::IngestError;

/// Object store kept in process memory, used by tests and the CLI dry runs
pub struct MemoryObjectStore {
    public_base_url: String,
    objects: Mutex<BTreeMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        MemoryObjectStore {
            public_base_url: public_base_url.into(),
            objects: Mutex::new(BTreeMap::new()),
        }
    }

    fn objects(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, StoredObject>>, IngestError> {
        self.objects
            .lock()
            .map_err(|_| IngestError::Storage("object store lock poisoned".into()))
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new("memory://objects")
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, IngestError> {
        validate_key(key)?;
        self.objects()?.insert(
            key.to_string(),
            StoredObject {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        Ok(public_url(&self.public_base_url, key))
    }

    async fn get(&self, key: &str) -> Result<Option<StoredObject>, IngestError> {
        Ok(self.objects()?.get(key).cloned())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, IngestError> {
        Ok(self
            .objects()?
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}
