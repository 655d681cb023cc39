//! Batch QR download endpoint

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::services::archive;
use crate::AppState;

/// GET /api/employees/batch-download query
#[derive(Debug, Deserialize)]
pub struct BatchDownloadQuery {
    /// Comma-separated record identifiers
    pub ids: Option<String>,
}

/// Split the `ids` parameter, dropping blank entries
pub fn parse_ids(ids: &str) -> Vec<String> {
    ids.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// GET /api/employees/batch-download?ids=a,b,c
pub async fn batch_download(
    State(state): State<AppState>,
    Query(query): Query<BatchDownloadQuery>,
) -> ApiResult<impl IntoResponse> {
    let identifiers = query.ids.as_deref().map(parse_ids).unwrap_or_default();
    if identifiers.is_empty() {
        return Err(ApiError::BadRequest("No record identifiers provided".to_string()));
    }

    let archive = archive::build(&state.db, state.issuer.qr_dir(), &identifiers).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"qr_codes.zip\"",
            ),
        ],
        archive,
    ))
}

/// Build download routes
pub fn download_routes() -> Router<AppState> {
    Router::new().route("/employees/batch-download", get(batch_download))
}
