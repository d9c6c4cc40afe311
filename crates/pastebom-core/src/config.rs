//! Configuration module
//!
//! Process-wide settings loaded once at startup from the environment (and an optional
//! `.env` file). The resulting [`Config`] is passed explicitly into storage, generator
//! and HTTP setup; nothing below `main` reads the environment on its own.

use std::env;

use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 8080;
const BIND_ADDR: &str = "0.0.0.0";
const BASE_URL: &str = "http://localhost:8080";
const MAX_UPLOAD_SIZE_MB: usize = 50;
const BOM_EXPIRY_DAYS: u32 = 0;
const LOG_LEVEL: &str = "info";
const UPLOADS_PREFIX: &str = "uploads";
const BOMS_PREFIX: &str = "boms";

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub bind_addr: String,
    /// Public base URL of this service, used for `/b/{id}` links.
    pub base_url: String,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub max_upload_size_mb: usize,
    /// Reported as `expires_at` on uploads; never enforced. 0 = no expiry.
    pub bom_expiry_days: u32,
    pub log_level: String,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, R2, ...)
    pub aws_region: Option<String>,
    /// Skip object tagging for providers that do not support it
    pub s3_disable_tagging: bool,
    pub uploads_prefix: String,
    pub boms_prefix: String,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Generation configuration
    pub template_dir: Option<String>,
    pub board_converter_cmd: Option<String>,
    pub default_dark_mode: bool,
    pub default_compression: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_port: SERVER_PORT,
            bind_addr: BIND_ADDR.to_string(),
            base_url: BASE_URL.to_string(),
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            max_upload_size_mb: MAX_UPLOAD_SIZE_MB,
            bom_expiry_days: BOM_EXPIRY_DAYS,
            log_level: LOG_LEVEL.to_string(),
            storage_backend: StorageBackend::S3,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            s3_disable_tagging: false,
            uploads_prefix: UPLOADS_PREFIX.to_string(),
            boms_prefix: BOMS_PREFIX.to_string(),
            local_storage_path: None,
            local_storage_base_url: None,
            template_dir: None,
            board_converter_cmd: None,
            default_dark_mode: false,
            default_compression: true,
        }
    }
}

/// Parse a boolean flag leniently (`true/false`, `1/0`, `yes/no`, `on/off`).
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| parse_flag(&v))
        .unwrap_or(default)
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let storage_backend = match env_opt("STORAGE_BACKEND") {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::S3,
        };

        Ok(Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| BIND_ADDR.to_string()),
            base_url: env::var("BASE_URL")
                .unwrap_or_else(|_| BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            environment,
            cors_origins,
            max_upload_size_mb: env::var("MAX_UPLOAD_SIZE_MB")
                .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
                .parse()
                .unwrap_or(MAX_UPLOAD_SIZE_MB),
            bom_expiry_days: env::var("BOM_EXPIRY_DAYS")
                .unwrap_or_else(|_| BOM_EXPIRY_DAYS.to_string())
                .parse()
                .unwrap_or(BOM_EXPIRY_DAYS),
            log_level: env::var("LOG_LEVEL")
                .unwrap_or_else(|_| LOG_LEVEL.to_string())
                .to_lowercase(),
            storage_backend,
            s3_bucket: env_opt("S3_BUCKET"),
            s3_region: env_opt("S3_REGION"),
            s3_endpoint: env_opt("S3_ENDPOINT").or_else(|| env_opt("S3_ENDPOINT_URL")),
            aws_region: env_opt("AWS_REGION"),
            s3_disable_tagging: env_flag("S3_DISABLE_TAGGING", false),
            uploads_prefix: env_opt("S3_UPLOADS_PREFIX")
                .unwrap_or_else(|| UPLOADS_PREFIX.to_string()),
            boms_prefix: env_opt("S3_BOMS_PREFIX").unwrap_or_else(|| BOMS_PREFIX.to_string()),
            local_storage_path: env_opt("LOCAL_STORAGE_PATH"),
            local_storage_base_url: env_opt("LOCAL_STORAGE_BASE_URL"),
            template_dir: env_opt("TEMPLATE_DIR"),
            board_converter_cmd: env_opt("BOARD_CONVERTER_CMD"),
            default_dark_mode: env_flag("DEFAULT_DARK_MODE", false),
            default_compression: env_flag("DEFAULT_COMPRESSION", true),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_upload_size_mb == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "BASE_URL must be an absolute http(s) URL, got '{}'",
                self.base_url
            ));
        }

        for (name, prefix) in [
            ("S3_UPLOADS_PREFIX", &self.uploads_prefix),
            ("S3_BOMS_PREFIX", &self.boms_prefix),
        ] {
            if prefix.is_empty() || prefix.contains("..") || prefix.starts_with('/') {
                return Err(anyhow::anyhow!(
                    "{} must be a relative, non-empty key prefix",
                    name
                ));
            }
        }

        if self.uploads_prefix == self.boms_prefix {
            return Err(anyhow::anyhow!(
                "S3_UPLOADS_PREFIX and S3_BOMS_PREFIX must differ"
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.region().is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
            StorageBackend::Memory => {
                if self.is_production() {
                    return Err(anyhow::anyhow!(
                        "STORAGE_BACKEND=memory is not allowed in production"
                    ));
                }
            }
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_size_mb * 1024 * 1024
    }

    /// Region for the S3 backend: `S3_REGION`, falling back to `AWS_REGION`.
    pub fn region(&self) -> Option<&str> {
        self.s3_region.as_deref().or(self.aws_region.as_deref())
    }

    /// Base URL used by the local backend when deriving public URLs.
    /// Defaults to `{BASE_URL}/files`.
    pub fn local_base_url(&self) -> String {
        self.local_storage_base_url
            .clone()
            .unwrap_or_else(|| format!("{}/files", self.base_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> Config {
        Config {
            storage_backend: StorageBackend::Memory,
            ..Config::default()
        }
    }

    #[test]
    fn test_parse_flag_variants() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.max_upload_bytes(), 50 * 1024 * 1024);
        assert_eq!(config.uploads_prefix, "uploads");
        assert_eq!(config.boms_prefix, "boms");
        assert!(config.default_compression);
        assert!(!config.default_dark_mode);
    }

    #[test]
    fn test_validate_requires_bucket_for_s3() {
        let config = Config {
            s3_region: Some("us-east-1".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            s3_bucket: Some("boms".to_string()),
            aws_region: Some("eu-west-1".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.region(), Some("eu-west-1"));
    }

    #[test]
    fn test_validate_rejects_bad_prefixes() {
        let mut config = memory_config();
        config.boms_prefix = "../boms".to_string();
        assert!(config.validate().is_err());

        let mut config = memory_config();
        config.boms_prefix = config.uploads_prefix.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_memory_backend_rejected_in_production() {
        let mut config = memory_config();
        assert!(config.validate().is_ok());
        config.environment = "production".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_local_base_url_defaults_to_service_url() {
        let config = Config::default();
        assert_eq!(config.local_base_url(), "http://localhost:8080/files");
    }
}
