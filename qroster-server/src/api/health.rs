//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status ("ok" or "degraded" when the store is unreachable)
    pub status: String,
    pub module: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Number of stored records, absent if the store could not be queried
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<i64>,
}

/// GET /api/health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let now = Utc::now();
    let uptime_seconds = now.signed_duration_since(state.startup_time).num_seconds().max(0) as u64;

    let records = crate::db::records::count(&state.db).await.ok();
    let status = if records.is_some() { "ok" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        module: "qroster-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: now,
        uptime_seconds,
        records,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
