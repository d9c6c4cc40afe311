//! Serving published artifacts and their metadata.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use pastebom_core::{AppError, ArtifactMetadata};
use std::sync::Arc;
use uuid::Uuid;

fn not_found() -> HttpAppError {
    HttpAppError(AppError::NotFound("BOM not found".to_string()))
}

/// Ids are UUIDs; anything else cannot name an artifact.
fn parse_id(id: &str) -> Result<Uuid, HttpAppError> {
    Uuid::parse_str(id).map_err(|_| not_found())
}

async fn artifact_response(state: &AppState, id: Uuid) -> Result<impl IntoResponse, HttpAppError> {
    let html = state.store.get_artifact(id).await?.ok_or_else(not_found)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        html,
    ))
}

/// Interactive BOM viewer page.
#[utoipa::path(
    get,
    path = "/b/{id}",
    tag = "boms",
    params(("id" = String, Path, description = "BOM id")),
    responses(
        (status = 200, description = "Artifact HTML", body = String, content_type = "text/html"),
        (status = 404, description = "BOM not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "get_bom"))]
pub async fn get_bom(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    artifact_response(&state, parse_id(&id)?).await
}

/// Public artifact object by storage key, for backends whose public URLs point back at
/// this service. Only `{boms_prefix}/{id}.html` resolves; uploads and sidecars stay private.
#[tracing::instrument(skip(state), fields(operation = "get_artifact_file"))]
pub async fn get_artifact_file(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = key
        .strip_prefix(state.config.boms_prefix.as_str())
        .and_then(|rest| rest.strip_prefix('/'))
        .and_then(|file| file.strip_suffix(".html"))
        .ok_or_else(not_found)?;

    artifact_response(&state, parse_id(id)?).await
}

/// Metadata recorded when the BOM was generated.
#[utoipa::path(
    get,
    path = "/b/{id}/meta",
    tag = "boms",
    params(("id" = String, Path, description = "BOM id")),
    responses(
        (status = 200, description = "Artifact metadata", body = ArtifactMetadata),
        (status = 404, description = "BOM not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "get_bom_meta"))]
pub async fn get_bom_meta(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ArtifactMetadata>, HttpAppError> {
    let id = parse_id(&id)?;
    let metadata = state.store.get_metadata(id).await?.ok_or_else(not_found)?;
    Ok(Json(metadata))
}
