//! Shared key derivation for uploads, artifacts and metadata sidecars.
//!
//! Every function here is pure and total so the key written by the artifact store and
//! the key embedded in a public URL can never drift apart.

use uuid::Uuid;

const MAX_FILENAME_LENGTH: usize = 255;
const FALLBACK_FILENAME: &str = "upload";

/// Prefixes under which uploads and generated BOMs live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    uploads_prefix: String,
    boms_prefix: String,
}

impl Default for KeyLayout {
    fn default() -> Self {
        KeyLayout::new("uploads", "boms")
    }
}

impl KeyLayout {
    pub fn new(uploads_prefix: impl Into<String>, boms_prefix: impl Into<String>) -> Self {
        KeyLayout {
            uploads_prefix: trim_prefix(uploads_prefix.into()),
            boms_prefix: trim_prefix(boms_prefix.into()),
        }
    }

    /// `{uploads}/{id}/{filename}`, with the filename reduced to a safe final component.
    pub fn upload_key(&self, id: Uuid, filename: &str) -> String {
        format!(
            "{}/{}/{}",
            self.uploads_prefix,
            id,
            sanitize_filename(filename)
        )
    }

    /// `{boms}/{id}.html`
    pub fn artifact_key(&self, id: Uuid) -> String {
        format!("{}/{}.html", self.boms_prefix, id)
    }

    /// `{boms}/{id}.meta.json`
    pub fn metadata_key(&self, id: Uuid) -> String {
        format!("{}/{}.meta.json", self.boms_prefix, id)
    }
}

fn trim_prefix(prefix: String) -> String {
    prefix.trim_matches('/').to_string()
}

/// Reduce a client-supplied filename to its last path component.
///
/// Separators of either platform are honoured, control characters are dropped and
/// names that would be empty or refer to a directory fall back to `upload`.
pub fn sanitize_filename(filename: &str) -> String {
    let last = filename
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(filename);

    let cleaned: String = last
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_FILENAME_LENGTH)
        .collect::<String>()
        .trim()
        .to_string();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        FALLBACK_FILENAME.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_matches_persisted_scheme() {
        let id = Uuid::parse_str("6f1c1a52-3a4e-4f7b-9a57-1d4f6f5b2c10").unwrap();
        let layout = KeyLayout::default();
        assert_eq!(
            layout.upload_key(id, "board.kicad_pcb"),
            "uploads/6f1c1a52-3a4e-4f7b-9a57-1d4f6f5b2c10/board.kicad_pcb"
        );
        assert_eq!(
            layout.artifact_key(id),
            "boms/6f1c1a52-3a4e-4f7b-9a57-1d4f6f5b2c10.html"
        );
        assert_eq!(
            layout.metadata_key(id),
            "boms/6f1c1a52-3a4e-4f7b-9a57-1d4f6f5b2c10.meta.json"
        );
    }

    #[test]
    fn test_custom_prefixes_are_normalised() {
        let id = Uuid::new_v4();
        let layout = KeyLayout::new("/ibom/uploads/", "ibom/boms/");
        assert!(layout.upload_key(id, "a.json").starts_with("ibom/uploads/"));
        assert_eq!(layout.artifact_key(id), format!("ibom/boms/{}.html", id));
    }

    #[test]
    fn test_artifact_key_does_not_depend_on_filename() {
        let id = Uuid::new_v4();
        let layout = KeyLayout::default();
        assert!(!layout.artifact_key(id).contains("secret-project"));
        assert!(layout
            .upload_key(id, "secret-project.kicad_pcb")
            .ends_with("secret-project.kicad_pcb"));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\work\\board.brd"), "board.brd");
        assert_eq!(sanitize_filename("dir/.."), "upload");
        assert_eq!(sanitize_filename(""), "upload");
        assert_eq!(sanitize_filename("my\u{0}board.json"), "myboard.json");
        assert_eq!(sanitize_filename("x".repeat(400).as_str()).len(), 255);
    }
}
