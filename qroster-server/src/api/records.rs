//! Record listing, lookup, edit and delete endpoints

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use qroster_common::db::{Record, RecordFields};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::records;
use crate::error::{ApiError, ApiResult};
use crate::services::roster;
use crate::AppState;

/// PUT /api/employees/:id request
///
/// Absent or null fields are written as empty strings. The historical names
/// `cell_number` and `image_url` are accepted as aliases.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateRecordRequest {
    pub name: Option<String>,
    pub designation: Option<String>,
    pub constituency: Option<String>,
    pub district: Option<String>,
    #[serde(alias = "cell_number")]
    pub phone_number: Option<String>,
    #[serde(alias = "image_url")]
    pub photo_url: Option<String>,
}

impl From<UpdateRecordRequest> for RecordFields {
    fn from(request: UpdateRecordRequest) -> Self {
        Self {
            name: request.name.unwrap_or_default(),
            designation: request.designation.unwrap_or_default(),
            constituency: request.constituency.unwrap_or_default(),
            district: request.district.unwrap_or_default(),
            phone_number: request.phone_number.unwrap_or_default(),
            photo_url: request.photo_url.unwrap_or_default(),
        }
    }
}

/// Mutation response
#[derive(Debug, Serialize)]
pub struct RecordMutationResponse {
    pub message: String,
    pub record: Record,
}

/// GET /api/employees
pub async fn list_records(State(state): State<AppState>) -> ApiResult<Json<Vec<Record>>> {
    Ok(Json(records::list(&state.db).await?))
}

/// GET /api/employees/unique/:identifier
pub async fn get_record_by_identifier(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> ApiResult<Json<Record>> {
    records::get_by_identifier(&state.db, &identifier)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No record with identifier '{}'", identifier)))
}

/// PUT /api/employees/:id
///
/// Replaces the mutable fields; identifier and QR image are untouched.
pub async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateRecordRequest>,
) -> ApiResult<Json<RecordMutationResponse>> {
    records::update_fields(&state.db, id, &request.into()).await?;

    let record = records::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Record {} not found", id)))?;

    info!(id, identifier = %record.identifier, "Updated record");

    Ok(Json(RecordMutationResponse {
        message: "Record updated successfully".to_string(),
        record,
    }))
}

/// DELETE /api/employees/:id
///
/// Removes the record, then its QR image file.
pub async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<RecordMutationResponse>> {
    let record = roster::delete_record(&state.db, state.issuer.qr_dir(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Record {} not found", id)))?;

    Ok(Json(RecordMutationResponse {
        message: "Record deleted successfully".to_string(),
        record,
    }))
}

/// Build record routes
pub fn record_routes() -> Router<AppState> {
    Router::new()
        .route("/employees", get(list_records))
        .route("/employees/unique/:identifier", get(get_record_by_identifier))
        .route("/employees/:id", put(update_record).delete(delete_record))
}
