//! OpenAPI documentation, served at `/api/openapi.json` and browsable at `/docs`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use crate::setup::routes::health;
use pastebom_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PasteBOM API",
        version = "0.1.0",
        description = "Upload a PCB board file and get a shareable, self-contained interactive BOM page."
    ),
    paths(
        handlers::upload::upload_bom,
        handlers::bom::get_bom,
        handlers::bom::get_bom_meta,
        health::health_check,
    ),
    components(schemas(
        models::UploadResponse,
        models::ArtifactMetadata,
        error::ErrorResponse,
        health::HealthResponse,
    )),
    tags(
        (name = "boms", description = "BOM generation and retrieval"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;
