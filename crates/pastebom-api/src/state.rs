//! Application state shared by every handler.

use pastebom_core::Config;
use pastebom_services::{ArtifactStore, Generator};
use std::sync::Arc;

/// Read-only after startup; handlers receive it as `State<Arc<AppState>>`.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub generator: Arc<Generator>,
    pub store: ArtifactStore,
}

impl AppState {
    pub fn new(config: Config, generator: Generator) -> Self {
        let store = generator.store().clone();
        AppState {
            config,
            generator: Arc::new(generator),
            store,
        }
    }
}
