//! Test helpers: build AppState and router for integration tests.
//!
//! Every app gets its own in-memory backend, so tests can inspect what was written.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use pastebom_api::setup::routes;
use pastebom_api::AppState;
use pastebom_core::{Config, StorageBackend};
use pastebom_services::{
    ArtifactStore, GenerationConfig, Generator, KeyLayout, MemoryStorage, ParserRegistry,
    TemplateAssets,
};
use std::sync::Arc;

/// Three components: two identical resistors on the front and one capacitor on the back.
pub const BOARD_JSON: &str = r#"{
    "spec_version": 1,
    "pcbdata": {
        "edges_bbox": {"minx": 0.0, "miny": 0.0, "maxx": 25.4, "maxy": 12.7},
        "edges": [],
        "footprints": []
    },
    "components": [
        {"ref": "R1", "val": "10k", "footprint": "R_0805", "layer": "F"},
        {"ref": "R2", "val": "10k", "footprint": "R_0805", "layer": "F"},
        {"ref": "C1", "val": "100n", "footprint": "C_0603", "layer": "B"}
    ]
}"#;

pub const BASE_URL: &str = "http://bom.test";

/// Test application: server plus a handle on its storage.
pub struct TestApp {
    pub server: TestServer,
    pub storage: MemoryStorage,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn test_config() -> Config {
    Config {
        base_url: BASE_URL.to_string(),
        storage_backend: StorageBackend::Memory,
        max_upload_size_mb: 1,
        bom_expiry_days: 30,
        ..Config::default()
    }
}

/// Setup test app with isolated in-memory storage and the generic JSON parser only.
pub fn setup_test_app() -> TestApp {
    let config = test_config();
    let storage = MemoryStorage::new();
    let store = ArtifactStore::new(
        Arc::new(storage.clone()),
        KeyLayout::new(config.uploads_prefix.clone(), config.boms_prefix.clone()),
    );

    let generator = Generator::new(
        store,
        Arc::new(ParserRegistry::with_defaults(None)),
        Arc::new(TemplateAssets::embedded()),
        GenerationConfig::default(),
        config.max_upload_bytes(),
    );

    let state = Arc::new(AppState::new(config.clone(), generator));
    let app = routes::setup_routes(&config, state).expect("Failed to build router");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp { server, storage }
}

/// Multipart form with a `file` field and an optional `config` field.
pub fn upload_form(filename: &str, data: impl Into<Vec<u8>>, config: Option<&str>) -> MultipartForm {
    let part = Part::bytes(data.into())
        .file_name(filename.to_string())
        .mime_type("application/octet-stream");
    let form = MultipartForm::new().add_part("file", part);
    match config {
        Some(config) => form.add_text("config", config.to_string()),
        None => form,
    }
}
