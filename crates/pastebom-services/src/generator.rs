//! Generation orchestrator: one upload in, one published artifact out.

use bytes::Bytes;
use chrono::Utc;
use pastebom_core::{Config, Summary};
use pastebom_processing::parser::extension_of;
use pastebom_processing::{
    assemble, generate_bom, BoardFormat, BoardParser, ConfigError, ExternalConverter,
    GenerationConfig, ParserDispatch, ParserRegistry, TemplateAssets, UploadValidator,
};
use pastebom_storage::{ArtifactStore, StorageError};
use serde_json::{Map, Value};
use std::io::Write;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    SizeLimitExceeded { size: usize, max: usize },

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    #[error("Unsupported file format '{extension}'")]
    UnsupportedFormat {
        extension: String,
        supported: Vec<String>,
    },

    #[error("Failed to parse board: {0}")]
    ParseFailure(String),

    #[error("Failed to generate BOM: {0}")]
    Generation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

struct Rendered {
    html: String,
    components: usize,
}

/// Decode, summarize and assemble one board. Runs on a blocking worker.
///
/// The temporary copy of the upload lives only for the duration of this call.
fn render_board(
    parser: &dyn BoardParser,
    data: &[u8],
    extension: &str,
    config: &GenerationConfig,
    assets: &TemplateAssets,
) -> Result<Rendered, GenerateError> {
    let mut file = tempfile::Builder::new()
        .prefix("pastebom-")
        .suffix(extension)
        .tempfile()
        .map_err(|e| GenerateError::Generation(format!("failed to create temp file: {}", e)))?;
    file.write_all(data)
        .and_then(|_| file.flush())
        .map_err(|e| GenerateError::Generation(format!("failed to write temp file: {}", e)))?;

    let board = parser
        .parse(file.path())
        .map_err(|e| GenerateError::ParseFailure(e.to_string()))?;
    if board.is_empty() {
        return Err(GenerateError::ParseFailure(
            "board contains no components".to_string(),
        ));
    }

    let bom = generate_bom(&board.components, config);
    let html = assemble(&board.pcbdata, &bom, config, assets)
        .map_err(|e| GenerateError::Generation(e.to_string()))?;

    Ok(Rendered {
        html,
        components: board.components.len(),
    })
}

/// Turns uploaded board files into published artifacts.
pub struct Generator {
    store: ArtifactStore,
    parsers: Arc<dyn ParserDispatch>,
    assets: Arc<TemplateAssets>,
    base_config: GenerationConfig,
    validator: UploadValidator,
}

impl Generator {
    pub fn new(
        store: ArtifactStore,
        parsers: Arc<dyn ParserDispatch>,
        assets: Arc<TemplateAssets>,
        base_config: GenerationConfig,
        max_upload_bytes: usize,
    ) -> Self {
        let validator = UploadValidator::new(max_upload_bytes);
        Generator {
            store,
            parsers,
            assets,
            base_config,
            validator,
        }
    }

    /// Wire a generator from process configuration: converter command, template
    /// directory and generation defaults.
    pub fn from_config(config: &Config, store: ArtifactStore) -> std::io::Result<Self> {
        let converter = config
            .board_converter_cmd
            .as_deref()
            .and_then(ExternalConverter::from_command_line);
        match &converter {
            Some(converter) => {
                tracing::info!(converter = %converter.program(), "Native board formats enabled")
            }
            None => tracing::info!("No board converter configured; only generic JSON boards accepted"),
        }

        let assets = match &config.template_dir {
            Some(dir) => TemplateAssets::from_dir(dir)?,
            None => TemplateAssets::embedded(),
        };

        let base_config = GenerationConfig {
            dark_mode: config.default_dark_mode,
            compression: config.default_compression,
            ..GenerationConfig::default()
        };

        Ok(Generator::new(
            store,
            Arc::new(ParserRegistry::with_defaults(converter)),
            Arc::new(assets),
            base_config,
            config.max_upload_bytes(),
        ))
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn validator(&self) -> &UploadValidator {
        &self.validator
    }

    pub fn supported_extensions(&self) -> Vec<String> {
        self.parsers.supported_extensions()
    }

    /// Generate and publish the artifact for one upload.
    ///
    /// Size, configuration and format are checked before anything is written. Once
    /// the upload is stored it is kept even when a later step fails.
    #[tracing::instrument(skip(self, data, overrides), fields(filename = %filename, size_bytes = data.len()))]
    pub async fn generate(
        &self,
        data: Bytes,
        filename: &str,
        overrides: &Map<String, Value>,
    ) -> Result<Summary, GenerateError> {
        let start = std::time::Instant::now();

        if self.validator.validate_file_size(data.len()).is_err() {
            return Err(GenerateError::SizeLimitExceeded {
                size: data.len(),
                max: self.validator.max_file_size(),
            });
        }

        let config = self.base_config.with_overrides(overrides)?;

        let unsupported = || GenerateError::UnsupportedFormat {
            extension: extension_of(filename),
            supported: self.parsers.supported_extensions(),
        };
        let format = BoardFormat::from_filename(filename).ok_or_else(unsupported)?;
        let parser = self.parsers.select_parser(format).ok_or_else(unsupported)?;

        let id = Uuid::new_v4();
        self.store.store_upload(id, filename, data.clone()).await?;

        let assets = self.assets.clone();
        let extension = format.extension();
        let worker_config = config.clone();
        let rendered = tokio::task::spawn_blocking(move || {
            render_board(parser.as_ref(), &data, extension, &worker_config, &assets)
        })
        .await
        .map_err(|e| GenerateError::Generation(format!("generation worker failed: {}", e)))?
        .map_err(|e| {
            tracing::warn!(bom_id = %id, error = %e, "Generation failed; upload retained");
            e
        })?;

        let summary = Summary {
            id,
            filename: filename.to_string(),
            component_count: rendered.components,
            format: format.name().to_string(),
            file_size: rendered.html.len() as u64,
            created_at: Utc::now(),
        };

        self.store
            .store_artifact(id, Bytes::from(rendered.html), &summary.metadata())
            .await?;

        tracing::info!(
            bom_id = %id,
            components = summary.component_count,
            format = %summary.format,
            compression = config.compression,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "BOM generated"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pastebom_processing::assembler::prepare_pcbdata;
    use pastebom_processing::lzstring::decompress_from_base64;
    use pastebom_processing::GenericJsonParser;
    use pastebom_storage::{KeyLayout, MemoryStorage};
    use serde_json::json;

    const BOARD: &str = r#"{
        "spec_version": 1,
        "pcbdata": {
            "edges_bbox": {"minx": 0.0, "miny": 0.0, "maxx": 25.4000001, "maxy": 12.7},
            "edges": [],
            "footprints": []
        },
        "components": [
            {"ref": "R1", "val": "10k", "footprint": "R_0805", "layer": "F"},
            {"ref": "R2", "val": "10k", "footprint": "R_0805", "layer": "F"},
            {"ref": "C1", "val": "100n", "footprint": "C_0603", "layer": "B"}
        ]
    }"#;

    fn generator_with(memory: &MemoryStorage, max: usize) -> Generator {
        let store = ArtifactStore::new(Arc::new(memory.clone()), KeyLayout::default());
        Generator::new(
            store,
            Arc::new(ParserRegistry::with_defaults(None)),
            Arc::new(TemplateAssets::embedded()),
            GenerationConfig::default(),
            max,
        )
    }

    fn extract_payload(html: &str) -> String {
        let marker = "LZString.decompressFromBase64(\"";
        let start = html.find(marker).unwrap() + marker.len();
        let end = html[start..].find('"').unwrap();
        html[start..start + end].to_string()
    }

    #[tokio::test]
    async fn test_generate_end_to_end() {
        let memory = MemoryStorage::new();
        let generator = generator_with(&memory, 1024 * 1024);

        let summary = generator
            .generate(Bytes::from_static(BOARD.as_bytes()), "board.json", &Map::new())
            .await
            .unwrap();

        assert_eq!(summary.component_count, 3);
        assert_eq!(summary.format, "json");
        let store = generator.store();
        assert!(store.artifact_exists(summary.id).await.unwrap());

        let metadata = store.get_metadata(summary.id).await.unwrap().unwrap();
        assert_eq!(metadata.components, 3);
        assert_eq!(metadata.filename, "board.json");
        assert_eq!(metadata.file_size, summary.file_size);

        let html = store.get_artifact(summary.id).await.unwrap().unwrap();
        let html = String::from_utf8(html.to_vec()).unwrap();
        assert!(html.contains("var pcbdata = JSON.parse(LZString.decompressFromBase64("));
        assert!(html.contains("var config = {\"dark_mode\":false"));

        let decoded: Value =
            serde_json::from_str(&decompress_from_base64(&extract_payload(&html)).unwrap())
                .unwrap();
        let board = GenericJsonParser.parse_slice(BOARD.as_bytes()).unwrap();
        let config = GenerationConfig::default();
        let expected = prepare_pcbdata(
            &board.pcbdata,
            &generate_bom(&board.components, &config),
            &config,
        )
        .unwrap();
        assert_eq!(decoded, expected);
        assert_eq!(decoded["edges_bbox"]["maxx"], json!(25.4));

        let keys = memory.keys().await.unwrap();
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&format!("uploads/{}/board.json", summary.id)));
    }

    #[tokio::test]
    async fn test_overrides_reach_the_artifact() {
        let memory = MemoryStorage::new();
        let generator = generator_with(&memory, 1024 * 1024);
        let overrides = match json!({"compression": false, "dark_mode": true, "bogus": 1}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        let summary = generator
            .generate(Bytes::from_static(BOARD.as_bytes()), "board.json", &overrides)
            .await
            .unwrap();
        let html = generator.store().get_artifact(summary.id).await.unwrap().unwrap();
        let html = String::from_utf8(html.to_vec()).unwrap();
        assert!(html.contains("var pcbdata = {"));
        assert!(html.contains("var config = {\"dark_mode\":true"));
    }

    #[tokio::test]
    async fn test_unsupported_format_writes_nothing() {
        let memory = MemoryStorage::new();
        let generator = generator_with(&memory, 1024 * 1024);

        let err = generator
            .generate(Bytes::from_static(b"data"), "design.xyz", &Map::new())
            .await
            .unwrap_err();

        match err {
            GenerateError::UnsupportedFormat {
                extension,
                supported,
            } => {
                assert_eq!(extension, ".xyz");
                assert_eq!(supported, vec![".json".to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(memory.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_native_format_without_converter_is_unsupported() {
        let memory = MemoryStorage::new();
        let generator = generator_with(&memory, 1024 * 1024);
        let err = generator
            .generate(Bytes::from_static(b"(kicad_pcb)"), "board.kicad_pcb", &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::UnsupportedFormat { .. }));
        assert!(memory.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_upload_writes_nothing() {
        let memory = MemoryStorage::new();
        let generator = generator_with(&memory, 16);
        let err = generator
            .generate(Bytes::from_static(BOARD.as_bytes()), "board.json", &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::SizeLimitExceeded { max: 16, .. }));
        assert!(memory.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_config_writes_nothing() {
        let memory = MemoryStorage::new();
        let generator = generator_with(&memory, 1024 * 1024);
        let overrides = match json!({"board_rotation": "left"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let err = generator
            .generate(Bytes::from_static(BOARD.as_bytes()), "board.json", &overrides)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::InvalidConfig(_)));
        assert!(memory.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_parse_failure_keeps_upload() {
        let memory = MemoryStorage::new();
        let generator = generator_with(&memory, 1024 * 1024);
        let err = generator
            .generate(Bytes::from_static(b"{\"spec_version\": 1"), "broken.json", &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::ParseFailure(_)));

        let keys = memory.keys().await.unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].starts_with("uploads/"));
        assert!(keys[0].ends_with("/broken.json"));
    }

    #[tokio::test]
    async fn test_board_without_components_is_a_parse_failure() {
        let memory = MemoryStorage::new();
        let generator = generator_with(&memory, 1024 * 1024);
        let empty = br#"{"spec_version": 1, "pcbdata": {"edges": []}, "components": []}"#;
        let err = generator
            .generate(Bytes::from_static(empty), "empty.json", &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::ParseFailure(_)));
    }
}
