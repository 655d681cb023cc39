//! Roster services: spreadsheet intake, normalization, QR issuance,
//! batch reconciliation and archive building

pub mod archive;
pub mod normalizer;
pub mod qr_issuer;
pub mod reconciler;
pub mod roster;
pub mod spreadsheet;

pub use qr_issuer::QrIssuer;
pub use reconciler::{reconcile, ReconcileError, ReconcileSummary, RowFailure};
