//! PasteBOM Services Layer
//!
//! Hosts the generation orchestrator and re-exports the storage and processing
//! types the API crate needs, so handlers depend on a single service facade.
//! Keep coordination here; keep thin HTTP handling in pastebom-api.

pub mod generator;

pub use generator::{GenerateError, Generator};
pub use pastebom_processing::{
    build_config, BoardFormat, ConfigError, ExternalConverter, GenerationConfig, ParserDispatch,
    ParserRegistry, TemplateAssets, UploadValidator, ValidationError,
};
#[cfg(feature = "storage-local")]
pub use pastebom_storage::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use pastebom_storage::S3Storage;
pub use pastebom_storage::{
    create_storage, ArtifactStore, KeyLayout, MemoryStorage, Storage, StorageBackend,
    StorageError, StorageResult, Visibility,
};
