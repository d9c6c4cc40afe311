//! Storage backend and artifact store initialization

use anyhow::{Context, Result};
use pastebom_core::Config;
use pastebom_services::{create_storage, ArtifactStore, KeyLayout};

/// Create the configured backend and wrap it in the persisted key layout.
pub async fn setup_storage(config: &Config) -> Result<ArtifactStore> {
    tracing::info!(backend = %config.storage_backend, "Initializing storage backend");

    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    let layout = KeyLayout::new(config.uploads_prefix.clone(), config.boms_prefix.clone());

    tracing::info!(
        backend = %storage.backend_type(),
        uploads_prefix = %config.uploads_prefix,
        boms_prefix = %config.boms_prefix,
        "Storage initialized"
    );

    Ok(ArtifactStore::new(storage, layout))
}
