//! PasteBOM Processing Library
//!
//! Everything between an uploaded board file and the finished HTML document:
//!
//! - [`config`]: the per-generation option set and override handling
//! - [`parser`]: board formats and the decoder registry
//! - [`bom`]: grouping components into BOM tables
//! - [`assembler`]: embedding board data and config into the viewer template
//! - [`lzstring`]: the LZ-string base64 codec understood by the viewer
//!
//! Nothing in this crate performs async or storage I/O; callers run it on a
//! blocking worker.

pub mod assembler;
pub mod bom;
pub mod config;
pub mod lzstring;
pub mod parser;
pub mod rounding;
pub mod template;
pub mod validator;

pub use assembler::{assemble, AssembleError, IBOM_VERSION};
pub use bom::{generate_bom, BomSummary};
pub use config::{
    build_config, BomView, ConfigError, GenerationConfig, HighlightPin1, LayerView,
};
pub use parser::{
    BoardFormat, BoardParser, Component, ExternalConverter, ExternalConverterParser,
    GenericJsonParser, ParseError, ParsedBoard, ParserDispatch, ParserRegistry, Side,
};
pub use template::TemplateAssets;
pub use validator::{UploadValidator, ValidationError};
