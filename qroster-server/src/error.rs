//! Error types for qroster-server
//!
//! Maps service failures onto HTTP status codes: validation and empty
//! batches are 400, unknown records 404, issuance/store/io failures 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::services::archive::ArchiveError;
use crate::services::reconciler::ReconcileError;
use crate::services::spreadsheet::SpreadsheetError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Spreadsheet(#[from] SpreadsheetError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// qroster-common error
    #[error(transparent)]
    Common(#[from] qroster_common::Error),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Spreadsheet(_) => (StatusCode::BAD_REQUEST, "INVALID_SPREADSHEET"),
            ApiError::Reconcile(ReconcileError::EmptyBatch) => {
                (StatusCode::BAD_REQUEST, "EMPTY_BATCH")
            }
            ApiError::Reconcile(ReconcileError::Store(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "UPLOAD_FAILED")
            }
            ApiError::Archive(ArchiveError::NoRecordsFound) => {
                (StatusCode::NOT_FOUND, "NO_RECORDS_FOUND")
            }
            ApiError::Archive(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ARCHIVE_FAILED"),
            ApiError::Common(qroster_common::Error::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            }
            ApiError::Common(qroster_common::Error::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST")
            }
            ApiError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();
        let message = self.to_string();

        if status.is_server_error() {
            error!(code = error_code, error = %message, "Request failed");
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ReconcileError::EmptyBatch.into(), StatusCode::BAD_REQUEST),
            (
                ReconcileError::Store(sqlx::Error::PoolClosed).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ArchiveError::NoRecordsFound.into(), StatusCode::NOT_FOUND),
            (
                qroster_common::Error::NotFound("record 1".into()).into(),
                StatusCode::NOT_FOUND,
            ),
            (
                qroster_common::Error::Config("bad".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                SpreadsheetError::NoWorksheet.into(),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
