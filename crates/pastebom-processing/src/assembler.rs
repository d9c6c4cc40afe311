//! Builds the self-contained HTML artifact.

use crate::bom::BomSummary;
use crate::config::GenerationConfig;
use crate::lzstring::compress_to_base64;
use crate::rounding::round_floats;
use crate::template::TemplateAssets;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

/// Board data format version the embedded viewer understands.
pub const IBOM_VERSION: &str = "2.10.0";

const FLOAT_DIGITS: i32 = 6;

#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    #[error("Failed to serialize board data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// The board data object exactly as embedded: decoder output, minus the layers the
/// configuration leaves out, plus `bom` and `ibom_version`, floats rounded.
pub fn prepare_pcbdata(
    pcbdata: &Map<String, Value>,
    bom: &BomSummary,
    config: &GenerationConfig,
) -> Result<Value, AssembleError> {
    let mut data = pcbdata.clone();
    if !config.include_tracks {
        data.remove("tracks");
        data.remove("zones");
    }
    if !config.include_nets {
        data.remove("nets");
    }
    data.insert("bom".to_string(), serde_json::to_value(bom)?);
    data.insert("ibom_version".to_string(), Value::from(IBOM_VERSION));

    let mut data = Value::Object(data);
    round_floats(&mut data, FLOAT_DIGITS);
    Ok(data)
}

fn pcbdata_script(json: &str, compression: bool) -> Result<String, AssembleError> {
    if compression {
        let encoded = serde_json::to_string(&compress_to_base64(json))?;
        Ok(format!(
            "var pcbdata = JSON.parse(LZString.decompressFromBase64({}))",
            encoded
        ))
    } else {
        Ok(format!("var pcbdata = {}", json.replace("</", "<\\/")))
    }
}

/// Substitute every known `///NAME///` placeholder in one pass.
///
/// Inserted content is never rescanned; unknown placeholders are left as they are.
fn substitute(
    assets: &TemplateAssets,
    config_js: &str,
    pcbdata_js: &str,
    compression: bool,
) -> Result<String, AssembleError> {
    let pattern = Regex::new(r"///([A-Z_-]+)///")?;

    let html = pattern.replace_all(assets.template(), |caps: &Captures| {
        let content = match &caps[1] {
            "CSS" => assets.block("ibom.css"),
            "USERCSS" => assets.block("user.css"),
            "SPLITJS" => assets.block("split.js"),
            "LZ-STRING" if compression => assets.block("lz-string.js"),
            "LZ-STRING" => "",
            "POINTER_EVENTS_POLYFILL" => assets.block("pep.js"),
            "CONFIG" => config_js,
            "UTILJS" => assets.block("util.js"),
            "RENDERJS" => assets.block("render.js"),
            "TABLEUTILJS" => assets.block("table-util.js"),
            "IBOMJS" => assets.block("ibom.js"),
            "USERJS" => assets.block("user.js"),
            "USERHEADER" => assets.block("userheader.html"),
            "USERFOOTER" => assets.block("userfooter.html"),
            "PCBDATA" => pcbdata_js,
            _ => &caps[0],
        };
        content.to_string()
    });

    Ok(html.into_owned())
}

/// Assemble the artifact for one board.
///
/// Pure and deterministic: the same inputs always produce byte-identical output.
pub fn assemble(
    pcbdata: &Map<String, Value>,
    bom: &BomSummary,
    config: &GenerationConfig,
    assets: &TemplateAssets,
) -> Result<String, AssembleError> {
    let data = prepare_pcbdata(pcbdata, bom, config)?;
    let json = serde_json::to_string(&data)?;

    let pcbdata_js = pcbdata_script(&json, config.compression)?;
    let config_js = format!("var config = {}", config.html_config_json()?);

    substitute(assets, &config_js, &pcbdata_js, config.compression)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bom::generate_bom;
    use crate::lzstring::decompress_from_base64;
    use crate::parser::{Component, Side};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn board() -> (Map<String, Value>, Vec<Component>) {
        let pcbdata = json!({
            "edges_bbox": {"minx": 0.1234567, "miny": 0, "maxx": 50.5, "maxy": 30},
            "tracks": {"F": [], "B": []},
            "footprints": []
        });
        let components = ["R1", "R2", "C1"]
            .iter()
            .map(|reference| Component {
                reference: reference.to_string(),
                val: "x".to_string(),
                footprint: "0603".to_string(),
                layer: Side::Front,
                attr: None,
                extra_fields: BTreeMap::new(),
            })
            .collect();
        match pcbdata {
            Value::Object(map) => (map, components),
            _ => unreachable!(),
        }
    }

    fn assets() -> TemplateAssets {
        TemplateAssets::embedded()
            .with_template(
                "<style>///CSS///</style><script>///LZ-STRING///</script>\
                 <script>///CONFIG///\n///PCBDATA///</script>///UNKNOWN///",
            )
            .with_block("ibom.css", "body{}///PCBDATA///")
            .with_block("lz-string.js", "var LZString={}")
    }

    fn extract_b64(html: &str) -> String {
        let start = html.find("decompressFromBase64(\"").unwrap() + "decompressFromBase64(\"".len();
        let end = html[start..].find('"').unwrap();
        html[start..start + end].to_string()
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let (pcbdata, components) = board();
        let config = GenerationConfig::default();
        let bom = generate_bom(&components, &config);
        let first = assemble(&pcbdata, &bom, &config, &assets()).unwrap();
        let second = assemble(&pcbdata, &bom, &config, &assets()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_compressed_payload_round_trips() {
        let (pcbdata, components) = board();
        let config = GenerationConfig::default();
        let bom = generate_bom(&components, &config);
        let html = assemble(&pcbdata, &bom, &config, &assets()).unwrap();

        assert!(html.contains("var LZString={}"));
        let decoded = decompress_from_base64(&extract_b64(&html)).unwrap();
        let value: Value = serde_json::from_str(&decoded).unwrap();

        assert_eq!(value, prepare_pcbdata(&pcbdata, &bom, &config).unwrap());
        assert_eq!(value["ibom_version"], "2.10.0");
        assert_eq!(value["edges_bbox"]["minx"], json!(0.123457));
        assert!(value.get("tracks").is_none());
        assert_eq!(value["bom"]["both"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_single_pass_substitution() {
        let (pcbdata, components) = board();
        let config = GenerationConfig::default();
        let bom = generate_bom(&components, &config);
        let html = assemble(&pcbdata, &bom, &config, &assets()).unwrap();

        assert!(html.starts_with("<style>body{}///PCBDATA///</style>"));
        assert!(html.ends_with("///UNKNOWN///"));
        assert!(html.contains("var config = {\"dark_mode\":false"));
    }

    #[test]
    fn test_uncompressed_embeds_escaped_json() {
        let (mut pcbdata, components) = board();
        pcbdata.insert("title".to_string(), json!("</script><b>"));
        let config = GenerationConfig {
            compression: false,
            include_tracks: true,
            ..GenerationConfig::default()
        };
        let bom = generate_bom(&components, &config);
        let html = assemble(&pcbdata, &bom, &config, &assets()).unwrap();

        assert!(!html.contains("var LZString"));
        assert!(html.contains("var pcbdata = {"));
        assert!(html.contains(r#""title":"<\/script><b>""#));
        assert!(html.contains(r#""tracks":{"B":[],"F":[]}"#));
    }
}
