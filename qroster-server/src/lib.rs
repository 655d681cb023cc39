//! qroster-server library
//!
//! Spreadsheet-driven roster importer: uploads are reconciled into the record
//! store, every record gets a QR code pointing at its public detail page, and
//! the dashboard can view, edit, delete and bulk-download records.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use std::path::PathBuf;

use axum::Router;
use chrono::{DateTime, Utc};
use qroster_common::config::QR_CODES_DIR_NAME;
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::services::QrIssuer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Record store connection pool, constructed once at startup
    pub db: SqlitePool,
    /// QR issuer; also owns the QR image directory
    pub issuer: QrIssuer,
    /// Optional directory of prebuilt dashboard assets
    pub static_assets: Option<PathBuf>,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, issuer: QrIssuer) -> Self {
        Self {
            db,
            issuer,
            static_assets: None,
            startup_time: Utc::now(),
        }
    }

    pub fn with_static_assets(mut self, dir: Option<PathBuf>) -> Self {
        self.static_assets = dir;
        self
    }
}

/// Build application router
///
/// JSON endpoints live under `/api`; QR images are served from
/// `/qr_codes/<file>` matching the paths stored on records.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(api::upload_routes())
        .merge(api::record_routes())
        .merge(api::download_routes())
        .merge(api::health_routes());

    let qr_files = ServeDir::new(state.issuer.qr_dir());

    let mut router = Router::new()
        .nest("/api", api_routes)
        .merge(api::ui_routes())
        .nest_service(&format!("/{}", QR_CODES_DIR_NAME), qr_files);

    if let Some(dir) = &state.static_assets {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
