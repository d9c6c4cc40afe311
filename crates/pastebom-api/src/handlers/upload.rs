use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::extract_board_upload;
use axum::{
    extract::{Multipart, State},
    Json,
};
use pastebom_core::UploadResponse;
use std::sync::Arc;

/// Upload a board file and publish its interactive BOM.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "boms",
    request_body(
        content = inline(Object),
        content_type = "multipart/form-data",
        description = "`file`: board file (required). `config`: JSON object of generation options (optional)."
    ),
    responses(
        (status = 200, description = "BOM generated", body = UploadResponse),
        (status = 400, description = "Unsupported format, invalid config or invalid input", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 422, description = "Board file could not be parsed", body = ErrorResponse),
        (status = 500, description = "Storage or generation failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_bom"))]
pub async fn upload_bom(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let upload = extract_board_upload(multipart).await?;

    let validator = state.generator.validator();
    validator.validate_filename(&upload.filename)?;
    validator.validate_not_empty(upload.data.len())?;

    let summary = state
        .generator
        .generate(upload.data, &upload.filename, &upload.config)
        .await?;

    let artifact_url = state.store.public_url(summary.id);
    Ok(Json(UploadResponse::new(
        &summary,
        &state.config.base_url,
        artifact_url,
        state.config.bom_expiry_days,
    )))
}
