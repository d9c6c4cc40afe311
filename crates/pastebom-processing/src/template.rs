//! Viewer template and the asset blocks spliced into it.

use std::collections::HashMap;
use std::io;
use std::path::Path;

/// Template file holding the `///NAME///` placeholders.
pub const TEMPLATE_FILE: &str = "ibom.html";

/// Asset blocks that can be substituted into the template.
pub const ASSET_FILES: [&str; 12] = [
    "ibom.css",
    "user.css",
    "split.js",
    "lz-string.js",
    "pep.js",
    "util.js",
    "render.js",
    "table-util.js",
    "ibom.js",
    "user.js",
    "userheader.html",
    "userfooter.html",
];

fn embedded(name: &str) -> &'static str {
    match name {
        "ibom.html" => include_str!("../web/ibom.html"),
        "ibom.css" => include_str!("../web/ibom.css"),
        "lz-string.js" => include_str!("../web/lz-string.js"),
        "util.js" => include_str!("../web/util.js"),
        "render.js" => include_str!("../web/render.js"),
        "ibom.js" => include_str!("../web/ibom.js"),
        _ => "",
    }
}

/// Template text plus named asset blocks. Loaded once and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateAssets {
    template: String,
    blocks: HashMap<&'static str, String>,
}

impl Default for TemplateAssets {
    fn default() -> Self {
        Self::embedded()
    }
}

impl TemplateAssets {
    /// Assets compiled into the binary.
    pub fn embedded() -> Self {
        TemplateAssets {
            template: embedded(TEMPLATE_FILE).to_string(),
            blocks: ASSET_FILES
                .into_iter()
                .map(|name| (name, embedded(name).to_string()))
                .collect(),
        }
    }

    /// Load every asset from `dir`. A missing file becomes an empty block.
    pub fn from_dir(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref();
        let read = |name: &str| match std::fs::read_to_string(dir.join(name)) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(file = %name, dir = %dir.display(), "Template asset missing, using empty block");
                Ok(String::new())
            }
            Err(e) => Err(e),
        };

        let template = read(TEMPLATE_FILE)?;
        if template.is_empty() {
            tracing::warn!(dir = %dir.display(), "Template directory has no {}", TEMPLATE_FILE);
        }

        let mut blocks = HashMap::new();
        for name in ASSET_FILES {
            blocks.insert(name, read(name)?);
        }

        Ok(TemplateAssets { template, blocks })
    }

    /// Replace one asset block.
    pub fn with_block(mut self, name: &'static str, content: impl Into<String>) -> Self {
        self.blocks.insert(name, content.into());
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Content of an asset block; empty for unknown names.
    pub fn block(&self, name: &str) -> &str {
        self.blocks.get(name).map(String::as_str).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_template_has_placeholders() {
        let assets = TemplateAssets::embedded();
        for placeholder in ["///CSS///", "///CONFIG///", "///PCBDATA///", "///LZ-STRING///"] {
            assert!(assets.template().contains(placeholder), "{}", placeholder);
        }
        assert!(assets.block("lz-string.js").contains("decompressFromBase64"));
        assert_eq!(assets.block("user.css"), "");
    }

    #[test]
    fn test_from_dir_missing_files_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ibom.html"), "<html>///PCBDATA///</html>").unwrap();
        std::fs::write(dir.path().join("user.js"), "console.log(1)").unwrap();

        let assets = TemplateAssets::from_dir(dir.path()).unwrap();
        assert_eq!(assets.template(), "<html>///PCBDATA///</html>");
        assert_eq!(assets.block("user.js"), "console.log(1)");
        assert_eq!(assets.block("ibom.css"), "");
    }
}
