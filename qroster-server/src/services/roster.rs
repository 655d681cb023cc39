//! Single-record operations that touch both the store and the QR directory

use std::path::Path;

use qroster_common::db::Record;
use qroster_common::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::qr_issuer::resolve_stored_path;
use crate::db::records;

/// Delete a record, then its QR image
///
/// The row deletion is authoritative: if the image cannot be removed the
/// record stays deleted and the file is left orphaned. Returns `None` when
/// no record has this id.
pub async fn delete_record(pool: &SqlitePool, qr_dir: &Path, id: i64) -> Result<Option<Record>> {
    let Some(record) = records::delete_by_id(pool, id).await? else {
        return Ok(None);
    };

    info!(id, identifier = %record.identifier, "Deleted record");

    if let Some(path) = resolve_stored_path(qr_dir, &record.qr_image_path) {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                identifier = %record.identifier,
                file = %path.display(),
                error = %e,
                "QR image removal failed; file is orphaned"
            ),
        }
    }

    Ok(Some(record))
}
