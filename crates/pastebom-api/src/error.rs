//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Orchestrator, storage and
//! validation failures convert into [`AppError`] first so status, body and log level all
//! come from one metadata table.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pastebom_core::{AppError, ErrorMetadata, LogLevel};
use pastebom_services::{GenerateError, StorageError, ValidationError};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g. "unsupported_format")
    pub error: String,
    /// Human-readable description
    pub message: String,
    /// Accepted file extensions, present on `unsupported_format`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported: Option<Vec<String>>,
    /// Whether retrying the same request may succeed
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl ErrorResponse {
    pub fn from_app_error(error: &AppError) -> Self {
        ErrorResponse {
            error: error.error_code().to_string(),
            message: error.client_message(),
            supported: error.supported_formats().map(<[String]>::to_vec),
            recoverable: error.is_recoverable(),
            suggested_action: error.suggested_action().map(String::from),
        }
    }
}

/// Wrapper type for AppError to implement IntoResponse
/// (orphan rule: IntoResponse and AppError are both foreign to this crate).
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

fn log_error(error: &AppError) {
    let error_code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_code = error_code, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_code = error_code, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_code = error_code, "Request failed");
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        (status, Json(ErrorResponse::from_app_error(app_error))).into_response()
    }
}

// Convert domain errors to HttpAppError (avoids orphan rule: we impl for local HttpAppError)

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
            other => AppError::Storage(other.to_string()),
        };
        HttpAppError(app)
    }
}

impl From<ValidationError> for HttpAppError {
    fn from(err: ValidationError) -> Self {
        let app = match err {
            ValidationError::FileTooLarge { size, max } => AppError::PayloadTooLarge(format!(
                "File too large: {} bytes exceeds max {} bytes",
                size, max
            )),
            ValidationError::InvalidFilename(msg) => {
                AppError::InvalidInput(format!("Invalid filename: {}", msg))
            }
            ValidationError::EmptyFile => AppError::InvalidInput("File is empty".to_string()),
        };
        HttpAppError(app)
    }
}

impl From<GenerateError> for HttpAppError {
    fn from(err: GenerateError) -> Self {
        let app = match err {
            GenerateError::SizeLimitExceeded { size, max } => AppError::PayloadTooLarge(format!(
                "File too large: {} bytes exceeds max {} bytes",
                size, max
            )),
            GenerateError::InvalidConfig(e) => AppError::InvalidConfig(e.to_string()),
            GenerateError::UnsupportedFormat {
                extension,
                supported,
            } => AppError::UnsupportedFormat {
                extension,
                supported,
            },
            GenerateError::ParseFailure(msg) => AppError::ParseFailure(msg),
            GenerateError::Generation(msg) => AppError::Generation(msg),
            GenerateError::Storage(e) => return HttpAppError::from(e),
        };
        HttpAppError(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pastebom_services::ConfigError;

    fn status_of(err: impl Into<HttpAppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_from_generate_error_status_mapping() {
        assert_eq!(
            status_of(GenerateError::SizeLimitExceeded { size: 10, max: 5 }),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status_of(GenerateError::InvalidConfig(ConfigError::InvalidOverride {
                key: "dark_mode".to_string(),
                reason: "expected a boolean".to_string(),
            })),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(GenerateError::UnsupportedFormat {
                extension: ".xyz".to_string(),
                supported: vec![".json".to_string()],
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(GenerateError::ParseFailure("truncated".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(GenerateError::Generation("worker died".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(GenerateError::Storage(StorageError::UploadFailed(
                "bucket gone".to_string()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_from_storage_error_not_found() {
        let HttpAppError(app_err) = StorageError::NotFound("boms/x.html".to_string()).into();
        match app_err {
            AppError::NotFound(msg) => assert_eq!(msg, "boms/x.html"),
            other => panic!("Expected NotFound variant, got {:?}", other),
        }
    }

    #[test]
    fn test_storage_error_hides_backend_details() {
        let HttpAppError(app_err) =
            StorageError::BackendError("s3://internal-bucket timed out".to_string()).into();
        let body = ErrorResponse::from_app_error(&app_err);
        assert_eq!(body.error, "storage_error");
        assert_eq!(body.message, "Failed to access storage");
        assert!(body.recoverable);
    }

    #[test]
    fn test_from_validation_error_empty_file() {
        let HttpAppError(app_err) = ValidationError::EmptyFile.into();
        match app_err {
            AppError::InvalidInput(msg) => assert_eq!(msg, "File is empty"),
            other => panic!("Expected InvalidInput variant, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_format_body_lists_supported() {
        let HttpAppError(app_err) = GenerateError::UnsupportedFormat {
            extension: ".xyz".to_string(),
            supported: vec![".kicad_pcb".to_string(), ".json".to_string()],
        }
        .into();
        let json = serde_json::to_value(ErrorResponse::from_app_error(&app_err)).unwrap();
        assert_eq!(json["error"], "unsupported_format");
        assert_eq!(json["message"], "Unsupported file format: .xyz");
        assert_eq!(json["supported"], serde_json::json!([".kicad_pcb", ".json"]));
    }

    #[test]
    fn test_error_response_omits_supported_elsewhere() {
        let body = ErrorResponse::from_app_error(&AppError::NotFound("BOM not found".into()));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "not_found");
        assert!(json.get("supported").is_none());
        assert_eq!(json["recoverable"], false);
    }
}
