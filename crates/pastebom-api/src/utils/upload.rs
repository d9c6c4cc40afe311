//! Multipart extraction for board uploads

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use bytes::Bytes;
use pastebom_core::AppError;
use serde_json::{Map, Value};

/// Fields of one `POST /upload` request.
#[derive(Debug)]
pub struct BoardUpload {
    pub data: Bytes,
    pub filename: String,
    pub config: Map<String, Value>,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("Request body too large: {}", e.body_text()))
    } else {
        AppError::InvalidInput(format!("Failed to read multipart: {}", e.body_text()))
    }
}

/// Parse the optional `config` field. Blank text means no overrides.
pub fn parse_config_field(text: &str) -> Result<Map<String, Value>, AppError> {
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::InvalidConfig(
            "config must be a JSON object".to_string(),
        )),
        Err(e) => Err(AppError::InvalidConfig(format!(
            "config is not valid JSON: {}",
            e
        ))),
    }
}

/// Extract the `file` and optional `config` fields from the form.
/// Only one field named "file" is accepted; unknown fields are skipped.
pub async fn extract_board_upload(mut multipart: Multipart) -> Result<BoardUpload, AppError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut config = Map::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            "file" => {
                if file.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple file fields are not allowed; send exactly one field named 'file'"
                            .to_string(),
                    ));
                }
                let filename = field
                    .file_name()
                    .map(|s: &str| s.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some((filename, data));
            }
            "config" => {
                let text = field.text().await.map_err(multipart_error)?;
                config = parse_config_field(&text)?;
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unexpected multipart field");
            }
        }
    }

    let (filename, data) =
        file.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;

    Ok(BoardUpload {
        data,
        filename,
        config,
    })
}
