use crate::object_ops::{head_options, map_read_error, put_options, visibility_of};
use crate::traits::{Storage, StorageError, StorageResult, Visibility};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{Error as ObjectStoreError, ObjectStore, PutPayload};
use std::sync::Arc;

/// In-process object storage backed by object_store's `InMemory`.
///
/// Used by tests and by `STORAGE_BACKEND=memory` for local development. Contents are
/// lost when the process exits.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    store: Arc<InMemory>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// All keys currently stored, sorted.
    pub async fn keys(&self) -> StorageResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .store
            .list(None)
            .map_ok(|meta| meta.location.to_string())
            .try_collect()
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        keys.sort();
        Ok(keys)
    }

    /// Visibility class an object was written with.
    pub async fn visibility(&self, storage_key: &str) -> StorageResult<Option<Visibility>> {
        let result = self
            .store
            .get_opts(&Path::from(storage_key), Default::default())
            .await
            .map_err(|e| map_read_error(storage_key, e))?;
        Ok(visibility_of(&result.attributes))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
        visibility: Visibility,
    ) -> StorageResult<()> {
        let size = data.len();
        self.store
            .put_opts(
                &Path::from(storage_key),
                PutPayload::from(data),
                put_options(content_type, visibility, false),
            )
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        tracing::debug!(
            key = %storage_key,
            size_bytes = size,
            visibility = visibility.as_str(),
            "Memory upload successful"
        );
        Ok(())
    }

    async fn get(&self, storage_key: &str) -> StorageResult<Bytes> {
        let result = self
            .store
            .get_opts(&Path::from(storage_key), Default::default())
            .await
            .map_err(|e| map_read_error(storage_key, e))?;

        result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        match self
            .store
            .get_opts(&Path::from(storage_key), head_options())
            .await
        {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn public_url(&self, storage_key: &str) -> String {
        format!("memory:///{}", storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
