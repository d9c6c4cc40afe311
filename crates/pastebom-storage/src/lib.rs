//! PasteBOM Storage Library
//!
//! This crate provides the storage abstraction used for uploads and generated BOM
//! artifacts, its backends (S3, local filesystem, in-memory) and the [`ArtifactStore`]
//! that applies the persisted key layout on top of any backend.
//!
//! # Storage key format
//!
//! Keys are derived from the BOM id and never from user input alone:
//!
//! - **Uploads** (private): `uploads/{id}/{filename}`
//! - **Artifacts** (public): `boms/{id}.html`
//! - **Metadata** (private): `boms/{id}.meta.json`
//!
//! Both prefixes are configurable. Key derivation lives in the `keys` module so
//! `public_url` and the writers always agree.

pub mod artifact_store;
pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
mod object_ops;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use artifact_store::ArtifactStore;
pub use factory::create_storage;
pub use keys::KeyLayout;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
pub use pastebom_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult, Visibility};
