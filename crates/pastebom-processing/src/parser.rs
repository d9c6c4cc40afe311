//! Board formats and decoder dispatch.
//!
//! Decoders are path based: the caller writes the upload to a temporary file carrying
//! the original extension and hands the path to the selected [`BoardParser`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

/// Version of the generic board JSON document understood by [`GenericJsonParser`].
pub const GENERIC_SPEC_VERSION: u64 = 1;

/// Board file formats known to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BoardFormat {
    KicadPcb,
    GenericJson,
    Eagle,
    Fusion,
}

impl BoardFormat {
    pub const ALL: [BoardFormat; 4] = [
        BoardFormat::KicadPcb,
        BoardFormat::GenericJson,
        BoardFormat::Eagle,
        BoardFormat::Fusion,
    ];

    /// File extension including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            BoardFormat::KicadPcb => ".kicad_pcb",
            BoardFormat::GenericJson => ".json",
            BoardFormat::Eagle => ".brd",
            BoardFormat::Fusion => ".fbrd",
        }
    }

    /// Short name recorded in artifact metadata.
    pub fn name(&self) -> &'static str {
        match self {
            BoardFormat::KicadPcb => "kicad_pcb",
            BoardFormat::GenericJson => "json",
            BoardFormat::Eagle => "eagle",
            BoardFormat::Fusion => "fusion",
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.to_lowercase();
        BoardFormat::ALL
            .into_iter()
            .find(|format| format.extension() == extension)
    }

    pub fn from_filename(filename: &str) -> Option<Self> {
        Self::from_extension(&extension_of(filename))
    }
}

/// Lower-cased final extension of `filename` with its leading dot, or `""`.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "F")]
    Front,
    #[serde(rename = "B")]
    Back,
}

/// One placed part as reported by a decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub val: String,
    #[serde(default)]
    pub footprint: String,
    pub layer: Side,
    #[serde(default)]
    pub attr: Option<String>,
    #[serde(default)]
    pub extra_fields: BTreeMap<String, String>,
}

/// Decoder output: viewer board data plus the component list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedBoard {
    pub pcbdata: Map<String, Value>,
    pub components: Vec<Component>,
}

impl ParsedBoard {
    /// True when either the board data or the component list is empty.
    pub fn is_empty(&self) -> bool {
        self.pcbdata.is_empty() || self.components.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to read board file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed board data: {0}")]
    Malformed(String),

    #[error("Unsupported board data version {0}")]
    UnsupportedVersion(u64),

    #[error("Board converter failed: {0}")]
    Converter(String),
}

/// A decoder for one board format.
pub trait BoardParser: Send + Sync {
    fn parse(&self, path: &Path) -> Result<ParsedBoard, ParseError>;

    fn name(&self) -> &'static str;
}

/// Maps a board format to the decoder able to read it.
pub trait ParserDispatch: Send + Sync {
    fn select_parser(&self, format: BoardFormat) -> Option<Arc<dyn BoardParser>>;

    /// Extensions that currently have a decoder, in [`BoardFormat::ALL`] order.
    fn supported_extensions(&self) -> Vec<String>;
}

#[derive(Deserialize)]
struct GenericBoard {
    spec_version: u64,
    pcbdata: Map<String, Value>,
    components: Vec<Component>,
}

/// Built-in decoder for the generic board JSON document:
/// `{"spec_version": 1, "pcbdata": {...}, "components": [...]}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericJsonParser;

impl GenericJsonParser {
    pub fn parse_slice(&self, data: &[u8]) -> Result<ParsedBoard, ParseError> {
        let board: GenericBoard =
            serde_json::from_slice(data).map_err(|e| ParseError::Malformed(e.to_string()))?;

        if board.spec_version != GENERIC_SPEC_VERSION {
            return Err(ParseError::UnsupportedVersion(board.spec_version));
        }

        Ok(ParsedBoard {
            pcbdata: board.pcbdata,
            components: board.components,
        })
    }
}

impl BoardParser for GenericJsonParser {
    fn parse(&self, path: &Path) -> Result<ParsedBoard, ParseError> {
        let data = std::fs::read(path)?;
        self.parse_slice(&data)
    }

    fn name(&self) -> &'static str {
        "generic-json"
    }
}

/// An external program that converts a native board file to generic board JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalConverter {
    program: String,
    args: Vec<String>,
}

impl ExternalConverter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        ExternalConverter {
            program: program.into(),
            args,
        }
    }

    /// Split a whitespace separated command line. `None` for a blank line.
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(String::from);
        let program = parts.next()?;
        Some(ExternalConverter::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

/// Runs `<program> [args..] <path>` and decodes its stdout as generic board JSON.
#[derive(Debug, Clone)]
pub struct ExternalConverterParser {
    converter: ExternalConverter,
}

impl ExternalConverterParser {
    pub fn new(converter: ExternalConverter) -> Self {
        ExternalConverterParser { converter }
    }
}

impl BoardParser for ExternalConverterParser {
    #[tracing::instrument(skip(self), fields(converter = %self.converter.program))]
    fn parse(&self, path: &Path) -> Result<ParsedBoard, ParseError> {
        let start = std::time::Instant::now();
        let output = Command::new(&self.converter.program)
            .args(&self.converter.args)
            .arg(path)
            .output()
            .map_err(|e| {
                ParseError::Converter(format!(
                    "failed to run {}: {}",
                    self.converter.program, e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(status = %output.status, stderr = %stderr.trim(), "Board converter failed");
            return Err(ParseError::Converter(format!(
                "{} exited with {}: {}",
                self.converter.program,
                output.status,
                stderr.trim()
            )));
        }

        tracing::debug!(
            stdout_bytes = output.stdout.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Board converter finished"
        );

        GenericJsonParser.parse_slice(&output.stdout)
    }

    fn name(&self) -> &'static str {
        "external-converter"
    }
}

/// Format to decoder table.
#[derive(Clone, Default)]
pub struct ParserRegistry {
    parsers: BTreeMap<BoardFormat, Arc<dyn BoardParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `.json` always decodes with [`GenericJsonParser`]. Native CAD formats are only
    /// registered when a converter is available.
    pub fn with_defaults(converter: Option<ExternalConverter>) -> Self {
        let mut registry = ParserRegistry::new();
        registry.register(BoardFormat::GenericJson, Arc::new(GenericJsonParser));

        if let Some(converter) = converter {
            let parser: Arc<dyn BoardParser> = Arc::new(ExternalConverterParser::new(converter));
            for format in [BoardFormat::KicadPcb, BoardFormat::Eagle, BoardFormat::Fusion] {
                registry.register(format, parser.clone());
            }
        }

        registry
    }

    pub fn register(&mut self, format: BoardFormat, parser: Arc<dyn BoardParser>) {
        self.parsers.insert(format, parser);
    }
}

impl ParserDispatch for ParserRegistry {
    fn select_parser(&self, format: BoardFormat) -> Option<Arc<dyn BoardParser>> {
        self.parsers.get(&format).cloned()
    }

    fn supported_extensions(&self) -> Vec<String> {
        BoardFormat::ALL
            .into_iter()
            .filter(|format| self.parsers.contains_key(format))
            .map(|format| format.extension().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BOARD: &str = r#"{
        "spec_version": 1,
        "pcbdata": {"edges_bbox": {"minx": 0, "miny": 0, "maxx": 10, "maxy": 10}},
        "components": [
            {"ref": "R1", "val": "10k", "footprint": "0805", "layer": "F"},
            {"ref": "C1", "val": "100n", "footprint": "0603", "layer": "B",
             "attr": "Virtual", "extra_fields": {"MPN": "GRM188"}}
        ]
    }"#;

    #[test]
    fn test_format_from_filename() {
        assert_eq!(BoardFormat::from_filename("x.KICAD_PCB"), Some(BoardFormat::KicadPcb));
        assert_eq!(BoardFormat::from_filename("a.b.json"), Some(BoardFormat::GenericJson));
        assert_eq!(BoardFormat::from_filename("design.xyz"), None);
        assert_eq!(BoardFormat::from_filename("noext"), None);
        assert_eq!(extension_of("design.XYZ"), ".xyz");
        assert_eq!(extension_of("noext"), "");
    }

    #[test]
    fn test_generic_json_parse() {
        let board = GenericJsonParser.parse_slice(BOARD.as_bytes()).unwrap();
        assert_eq!(board.components.len(), 2);
        assert_eq!(board.components[1].layer, Side::Back);
        assert_eq!(board.components[1].attr.as_deref(), Some("Virtual"));
        assert_eq!(board.components[1].extra_fields["MPN"], "GRM188");
        assert!(!board.is_empty());
    }

    #[test]
    fn test_generic_json_rejects_bad_input() {
        assert!(matches!(
            GenericJsonParser.parse_slice(b"not json"),
            Err(ParseError::Malformed(_))
        ));
        assert!(matches!(
            GenericJsonParser.parse_slice(br#"{"spec_version": 2, "pcbdata": {}, "components": []}"#),
            Err(ParseError::UnsupportedVersion(2))
        ));
        assert!(matches!(
            GenericJsonParser.parse_slice(br#"{"spec_version": 1, "components": []}"#),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn test_generic_json_reads_path() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(BOARD.as_bytes()).unwrap();
        let board = GenericJsonParser.parse(file.path()).unwrap();
        assert_eq!(board.components[0].reference, "R1");
    }

    #[test]
    fn test_registry_without_converter() {
        let registry = ParserRegistry::with_defaults(None);
        assert_eq!(registry.supported_extensions(), vec![".json".to_string()]);
        assert!(registry.select_parser(BoardFormat::KicadPcb).is_none());
        assert!(registry.select_parser(BoardFormat::GenericJson).is_some());
    }

    #[test]
    fn test_registry_with_converter() {
        let converter = ExternalConverter::from_command_line("pcb-extract --format json");
        let registry = ParserRegistry::with_defaults(converter);
        assert_eq!(
            registry.supported_extensions(),
            vec![".kicad_pcb", ".json", ".brd", ".fbrd"]
        );
        assert_eq!(
            registry.select_parser(BoardFormat::Eagle).unwrap().name(),
            "external-converter"
        );
    }

    #[test]
    fn test_converter_command_line() {
        assert_eq!(ExternalConverter::from_command_line("   "), None);
        let converter = ExternalConverter::from_command_line("conv -q").unwrap();
        assert_eq!(converter.program(), "conv");
    }

    #[cfg(unix)]
    #[test]
    fn test_external_converter_reads_stdout() {
        let mut file = tempfile::Builder::new().suffix(".kicad_pcb").tempfile().unwrap();
        file.write_all(BOARD.as_bytes()).unwrap();

        let parser = ExternalConverterParser::new(ExternalConverter::new("cat", vec![]));
        let board = parser.parse(file.path()).unwrap();
        assert_eq!(board.components.len(), 2);

        let parser = ExternalConverterParser::new(ExternalConverter::new("false", vec![]));
        assert!(matches!(parser.parse(file.path()), Err(ParseError::Converter(_))));
    }
}
