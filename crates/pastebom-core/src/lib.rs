//! PasteBOM Core Library
//!
//! This crate provides the process configuration, the unified error type and the
//! API-facing data models shared by every PasteBOM component.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{ArtifactMetadata, Summary, UploadResponse};
pub use storage_types::StorageBackend;
