//! Spreadsheet upload endpoint

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::services::{reconciler, spreadsheet, RowFailure};
use crate::AppState;

/// Maximum accepted upload size (10 MiB)
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Multipart field carrying the spreadsheet
pub const FILE_FIELD: &str = "file";

const SPREADSHEET_CONTENT_TYPES: &[&str] = &[
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
    "application/vnd.ms-excel.sheet.binary.macroenabled.12",
    "application/vnd.oasis.opendocument.spreadsheet",
];

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsb", "ods"];

/// POST /api/upload response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub processed: usize,
    pub total: usize,
    pub failures: Vec<RowFailure>,
}

/// POST /api/upload
///
/// Reads the `file` field, decodes the first worksheet and reconciles its
/// rows into the record store.
pub async fn upload_spreadsheet(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        if !is_spreadsheet(&content_type, &file_name) {
            return Err(ApiError::BadRequest(format!(
                "Only Excel files are allowed (got {} '{}')",
                content_type, file_name
            )));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read uploaded file: {}", e)))?;
        upload = Some((file_name, bytes.to_vec()));
    }

    let Some((file_name, bytes)) = upload else {
        return Err(ApiError::BadRequest("No file uploaded".to_string()));
    };
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
    }

    info!(file = %file_name, size_bytes = bytes.len(), "Processing upload");

    let rows = tokio::task::spawn_blocking(move || spreadsheet::read_rows(bytes))
        .await
        .map_err(|e| ApiError::Internal(format!("Spreadsheet worker failed: {}", e)))??;

    let summary = reconciler::reconcile(&state.db, &state.issuer, rows).await?;

    Ok(Json(UploadResponse {
        message: "Upload successful".to_string(),
        processed: summary.processed,
        total: summary.total,
        failures: summary.failures,
    }))
}

/// Accept known spreadsheet MIME types, or a spreadsheet file extension when
/// the browser sent a generic type
fn is_spreadsheet(content_type: &str, file_name: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    if SPREADSHEET_CONTENT_TYPES.contains(&content_type.as_str()) {
        return true;
    }

    let generic = content_type == "application/octet-stream" || content_type.is_empty();
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    generic
        && extension
            .map(|ext| SPREADSHEET_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
}

/// Build upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_spreadsheet))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
