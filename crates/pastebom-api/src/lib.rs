//! PasteBOM API Library
//!
//! This crate provides the HTTP handlers, error rendering and application setup
//! for the PasteBOM service.

// Module declarations
mod api_doc;
mod handlers;
pub mod setup;
mod telemetry;
mod utils;

// Public modules
pub mod error;
pub mod state;

// Re-exports
pub use api_doc::ApiDoc;
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
