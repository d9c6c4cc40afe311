//! Configuration validation
//!
//! Validates configuration at startup to catch misconfigurations early.

use anyhow::Result;
use pastebom_core::Config;
use std::path::Path;

/// Fail on inconsistent settings; warn on settings that work but are probably unintended.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.is_production() && config.base_url.contains("localhost") {
        tracing::warn!(
            base_url = %config.base_url,
            "BASE_URL points at localhost in production - BOM links will not resolve for users"
        );
    }

    if let Some(dir) = &config.template_dir {
        if !Path::new(dir).join("ibom.html").is_file() {
            return Err(anyhow::anyhow!(
                "TEMPLATE_DIR '{}' does not contain ibom.html",
                dir
            ));
        }
    }

    if config.board_converter_cmd.is_none() {
        tracing::warn!(
            "BOARD_CONVERTER_CMD not set - only generic JSON board files will be accepted"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pastebom_core::StorageBackend;

    fn memory_config() -> Config {
        Config {
            storage_backend: StorageBackend::Memory,
            ..Config::default()
        }
    }

    #[test]
    fn test_validate_accepts_memory_config() {
        assert!(validate_config(&memory_config()).is_ok());
    }

    #[test]
    fn test_validate_rejects_template_dir_without_template() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            template_dir: Some(dir.path().to_string_lossy().to_string()),
            ..memory_config()
        };
        assert!(validate_config(&config).is_err());

        std::fs::write(dir.path().join("ibom.html"), "///PCBDATA///").unwrap();
        assert!(validate_config(&config).is_ok());
    }
}
