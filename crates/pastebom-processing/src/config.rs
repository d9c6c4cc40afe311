//! Per-generation configuration.
//!
//! A [`GenerationConfig`] is built fresh for every request from a base (the built-in
//! defaults or the process-level defaults derived from `Config`) plus the client's
//! override object.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// Viewer layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BomView {
    BomOnly,
    #[default]
    LeftRight,
    TopBottom,
}

/// Which board sides the viewer shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LayerView {
    #[serde(rename = "F")]
    Front,
    #[default]
    #[serde(rename = "FB")]
    Both,
    #[serde(rename = "B")]
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightPin1 {
    #[default]
    None,
    All,
    Selected,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for '{key}': {reason}")]
    InvalidOverride { key: String, reason: String },
}

/// Every recognised generation option.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct GenerationConfig {
    pub dark_mode: bool,
    pub show_pads: bool,
    pub show_fabrication: bool,
    pub show_silkscreen: bool,
    pub redraw_on_drag: bool,
    pub highlight_pin1: HighlightPin1,
    /// Board rotation in steps of 5 degrees
    #[validate(range(min = -36, max = 36, message = "must be between -36 and 36"))]
    pub board_rotation: i32,
    pub offset_back_rotation: bool,
    /// Comma separated checkbox column names
    pub checkboxes: String,
    pub mark_when_checked: String,
    pub bom_view: BomView,
    pub layer_view: LayerView,
    pub compression: bool,
    pub kicad_text_formatting: bool,
    pub component_sort_order: Vec<String>,
    /// Refs or `PREFIX*` patterns to leave out of the BOM
    pub component_blacklist: Vec<String>,
    pub blacklist_virtual: bool,
    pub blacklist_empty_val: bool,
    pub include_tracks: bool,
    pub include_nets: bool,
    pub show_fields: Vec<String>,
    pub group_fields: Vec<String>,
    pub normalize_field_case: bool,
    pub dnp_field: String,
}

pub const DEFAULT_SORT_ORDER: [&str; 17] = [
    "C", "R", "L", "D", "U", "Y", "X", "F", "SW", "A", "~", "HS", "CNN", "J", "P", "NT", "MH",
];

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            dark_mode: false,
            show_pads: true,
            show_fabrication: false,
            show_silkscreen: true,
            redraw_on_drag: true,
            highlight_pin1: HighlightPin1::None,
            board_rotation: 0,
            offset_back_rotation: false,
            checkboxes: "Sourced,Placed".to_string(),
            mark_when_checked: String::new(),
            bom_view: BomView::LeftRight,
            layer_view: LayerView::Both,
            compression: true,
            kicad_text_formatting: true,
            component_sort_order: strings(&DEFAULT_SORT_ORDER),
            component_blacklist: Vec::new(),
            blacklist_virtual: true,
            blacklist_empty_val: false,
            include_tracks: false,
            include_nets: false,
            show_fields: strings(&["Value", "Footprint"]),
            group_fields: strings(&["Value", "Footprint"]),
            normalize_field_case: false,
            dnp_field: String::new(),
        }
    }
}

/// The subset of options the viewer reads at runtime, in the order it expects.
#[derive(Debug, Serialize)]
pub struct HtmlConfig<'a> {
    pub dark_mode: bool,
    pub show_pads: bool,
    pub show_fabrication: bool,
    pub show_silkscreen: bool,
    pub highlight_pin1: HighlightPin1,
    pub redraw_on_drag: bool,
    pub board_rotation: i32,
    pub checkboxes: &'a str,
    pub bom_view: BomView,
    pub layer_view: LayerView,
    pub offset_back_rotation: bool,
    pub kicad_text_formatting: bool,
    pub mark_when_checked: &'a str,
    pub fields: &'a [String],
}

fn field<T: DeserializeOwned>(key: &str, value: &Value) -> Result<T, ConfigError> {
    T::deserialize(value).map_err(|e| ConfigError::InvalidOverride {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

impl GenerationConfig {
    /// Overlay `overrides` on top of `self`.
    ///
    /// Unknown keys are ignored and reported at `warn`. A recognised key with a value
    /// of the wrong type or out of range fails the whole overlay.
    pub fn with_overrides(&self, overrides: &Map<String, Value>) -> Result<Self, ConfigError> {
        let mut config = self.clone();
        let mut unknown = Vec::new();

        for (key, value) in overrides {
            if !config.apply(key, value)? {
                unknown.push(key.as_str());
            }
        }

        if !unknown.is_empty() {
            tracing::warn!(keys = ?unknown, "Ignoring unknown configuration overrides");
        }

        config.validate().map_err(|e| ConfigError::InvalidOverride {
            key: e
                .field_errors()
                .keys()
                .next()
                .map(|k| k.to_string())
                .unwrap_or_default(),
            reason: e.to_string(),
        })?;

        Ok(config)
    }

    /// Returns false when `key` is not a recognised option.
    fn apply(&mut self, key: &str, value: &Value) -> Result<bool, ConfigError> {
        match key {
            "dark_mode" => self.dark_mode = field(key, value)?,
            "show_pads" => self.show_pads = field(key, value)?,
            "show_fabrication" => self.show_fabrication = field(key, value)?,
            "show_silkscreen" => self.show_silkscreen = field(key, value)?,
            "redraw_on_drag" => self.redraw_on_drag = field(key, value)?,
            "highlight_pin1" => self.highlight_pin1 = field(key, value)?,
            "board_rotation" => self.board_rotation = field(key, value)?,
            "offset_back_rotation" => self.offset_back_rotation = field(key, value)?,
            "checkboxes" => self.checkboxes = field(key, value)?,
            "mark_when_checked" => self.mark_when_checked = field(key, value)?,
            "bom_view" => self.bom_view = field(key, value)?,
            "layer_view" => self.layer_view = field(key, value)?,
            "compression" => self.compression = field(key, value)?,
            "kicad_text_formatting" => self.kicad_text_formatting = field(key, value)?,
            "component_sort_order" => self.component_sort_order = field(key, value)?,
            "component_blacklist" => {
                let mut list: Vec<String> = field(key, value)?;
                list.sort();
                list.dedup();
                self.component_blacklist = list;
            }
            "blacklist_virtual" => self.blacklist_virtual = field(key, value)?,
            "blacklist_empty_val" => self.blacklist_empty_val = field(key, value)?,
            "include_tracks" => self.include_tracks = field(key, value)?,
            "include_nets" => self.include_nets = field(key, value)?,
            "show_fields" => self.show_fields = field(key, value)?,
            "group_fields" => self.group_fields = field(key, value)?,
            "normalize_field_case" => self.normalize_field_case = field(key, value)?,
            "dnp_field" => self.dnp_field = field(key, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub fn html_config(&self) -> HtmlConfig<'_> {
        HtmlConfig {
            dark_mode: self.dark_mode,
            show_pads: self.show_pads,
            show_fabrication: self.show_fabrication,
            show_silkscreen: self.show_silkscreen,
            highlight_pin1: self.highlight_pin1,
            redraw_on_drag: self.redraw_on_drag,
            board_rotation: self.board_rotation,
            checkboxes: &self.checkboxes,
            bom_view: self.bom_view,
            layer_view: self.layer_view,
            offset_back_rotation: self.offset_back_rotation,
            kicad_text_formatting: self.kicad_text_formatting,
            mark_when_checked: &self.mark_when_checked,
            fields: &self.show_fields,
        }
    }

    /// JSON text of [`Self::html_config`].
    pub fn html_config_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.html_config())
    }
}

/// Defaults with `overrides` applied.
pub fn build_config(overrides: &Map<String, Value>) -> Result<GenerationConfig, ConfigError> {
    GenerationConfig::default().with_overrides(overrides)
}
