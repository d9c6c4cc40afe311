use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Metadata sidecar stored next to every generated artifact.
///
/// Written once when the artifact is published and never updated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ArtifactMetadata {
    pub id: Uuid,
    /// Original upload filename
    pub filename: String,
    /// Number of components reported by the parser
    pub components: usize,
    /// Artifact size in bytes
    pub file_size: u64,
    pub created_at: DateTime<Utc>,
    /// Detected board format (e.g. "kicad_pcb", "json")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Result of one successful generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub id: Uuid,
    pub filename: String,
    pub component_count: usize,
    pub format: String,
    pub file_size: u64,
    pub created_at: DateTime<Utc>,
}

impl Summary {
    pub fn metadata(&self) -> ArtifactMetadata {
        ArtifactMetadata {
            id: self.id,
            filename: self.filename.clone(),
            components: self.component_count,
            file_size: self.file_size,
            created_at: self.created_at,
            format: Some(self.format.clone()),
        }
    }
}

/// Response body for `POST /upload`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub id: Uuid,
    /// Viewer link served by this service
    pub url: String,
    /// Direct link to the public artifact object in storage
    pub artifact_url: String,
    pub filename: String,
    pub components: usize,
    pub created_at: DateTime<Utc>,
    /// Informational only; expiry is not enforced
    pub expires_at: Option<DateTime<Utc>>,
}

impl UploadResponse {
    pub fn new(summary: &Summary, base_url: &str, artifact_url: String, expiry_days: u32) -> Self {
        let expires_at = (expiry_days > 0)
            .then(|| summary.created_at + Duration::days(i64::from(expiry_days)));

        UploadResponse {
            id: summary.id,
            url: format!("{}/b/{}", base_url.trim_end_matches('/'), summary.id),
            artifact_url,
            filename: summary.filename.clone(),
            components: summary.component_count,
            created_at: summary.created_at,
            expires_at,
        }
    }
}
