//! HTTP API handlers for qroster-server

pub mod download;
pub mod health;
pub mod records;
pub mod ui;
pub mod upload;

pub use download::download_routes;
pub use health::health_routes;
pub use records::record_routes;
pub use ui::ui_routes;
pub use upload::upload_routes;
