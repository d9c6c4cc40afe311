//! Artifact store: the persisted layout of uploads, artifacts and metadata sidecars
//! on top of any [`Storage`] backend.

use crate::keys::KeyLayout;
use crate::traits::{Storage, StorageError, StorageResult, Visibility};
use bytes::Bytes;
use pastebom_core::ArtifactMetadata;
use std::sync::Arc;
use uuid::Uuid;

const UPLOAD_CONTENT_TYPE: &str = "application/octet-stream";
const ARTIFACT_CONTENT_TYPE: &str = "text/html; charset=utf-8";
const METADATA_CONTENT_TYPE: &str = "application/json";

#[derive(Clone)]
pub struct ArtifactStore {
    storage: Arc<dyn Storage>,
    layout: KeyLayout,
}

impl ArtifactStore {
    pub fn new(storage: Arc<dyn Storage>, layout: KeyLayout) -> Self {
        ArtifactStore { storage, layout }
    }

    pub fn layout(&self) -> &KeyLayout {
        &self.layout
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Persist the original upload privately. Returns the key written.
    pub async fn store_upload(&self, id: Uuid, filename: &str, data: Bytes) -> StorageResult<String> {
        let key = self.layout.upload_key(id, filename);
        self.storage
            .put(&key, data, UPLOAD_CONTENT_TYPE, Visibility::Private)
            .await?;

        tracing::debug!(bom_id = %id, key = %key, "Stored original upload");
        Ok(key)
    }

    /// Publish a generated artifact and its metadata sidecar.
    ///
    /// The artifact is written first. If the sidecar write fails the artifact stays
    /// reachable through its public URL while `get_metadata` reports nothing.
    /// Returns the artifact key; [`ArtifactStore::public_url`] turns it into a link.
    pub async fn store_artifact(
        &self,
        id: Uuid,
        html: Bytes,
        metadata: &ArtifactMetadata,
    ) -> StorageResult<String> {
        if metadata.id != id {
            return Err(StorageError::InvalidKey(format!(
                "metadata id {} does not match artifact id {}",
                metadata.id, id
            )));
        }

        let metadata_json = serde_json::to_vec(metadata).map_err(|source| StorageError::Malformed {
            key: self.layout.metadata_key(id),
            source,
        })?;

        let artifact_key = self.layout.artifact_key(id);
        self.storage
            .put(&artifact_key, html, ARTIFACT_CONTENT_TYPE, Visibility::Public)
            .await?;

        let metadata_key = self.layout.metadata_key(id);
        if let Err(e) = self
            .storage
            .put(
                &metadata_key,
                Bytes::from(metadata_json),
                METADATA_CONTENT_TYPE,
                Visibility::Private,
            )
            .await
        {
            tracing::error!(
                error = %e,
                bom_id = %id,
                artifact_key = %artifact_key,
                metadata_key = %metadata_key,
                "Artifact published without metadata sidecar"
            );
            return Err(e);
        }

        tracing::info!(
            bom_id = %id,
            artifact_key = %artifact_key,
            components = metadata.components,
            "Artifact published"
        );

        Ok(artifact_key)
    }

    pub async fn artifact_exists(&self, id: Uuid) -> StorageResult<bool> {
        self.storage.exists(&self.layout.artifact_key(id)).await
    }

    /// Metadata for `id`, or `None` when no sidecar was ever written.
    pub async fn get_metadata(&self, id: Uuid) -> StorageResult<Option<ArtifactMetadata>> {
        let key = self.layout.metadata_key(id);
        let raw = match self.storage.get(&key).await {
            Ok(raw) => raw,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| StorageError::Malformed { key, source })
    }

    /// Artifact HTML for `id`, or `None` when it does not exist.
    pub async fn get_artifact(&self, id: Uuid) -> StorageResult<Option<Bytes>> {
        match self.storage.get(&self.layout.artifact_key(id)).await {
            Ok(html) => Ok(Some(html)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Public URL of the artifact for `id`. Pure: does not check existence.
    pub fn public_url(&self, id: Uuid) -> String {
        self.storage.public_url(&self.layout.artifact_key(id))
    }
}
