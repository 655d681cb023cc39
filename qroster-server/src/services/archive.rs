//! Batch QR archive building
//!
//! Collects the QR images of the requested records into an in-memory zip.
//! Entries are named `<identifier>.png`. Records without an image on disk are
//! skipped silently.

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::qr_issuer::resolve_stored_path;
use crate::db::records;

/// Archive building failure
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Identifiers were given but none matched a stored record
    #[error("No records found for the requested identifiers")]
    NoRecordsFound,

    #[error("Record lookup failed: {0}")]
    Store(#[from] qroster_common::Error),

    #[error("QR image read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip encoding failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Archive worker failed: {0}")]
    Worker(String),
}

/// Build a zip of QR images for `identifiers`
pub async fn build(
    pool: &SqlitePool,
    qr_dir: &Path,
    identifiers: &[String],
) -> Result<Vec<u8>, ArchiveError> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    let mut matched = 0;

    for identifier in identifiers {
        if !seen.insert(identifier.as_str()) {
            continue;
        }

        let Some(record) = records::get_by_identifier(pool, identifier).await? else {
            debug!(identifier = %identifier, "Batch download: no such record");
            continue;
        };
        matched += 1;

        if let Some(path) = resolve_stored_path(qr_dir, &record.qr_image_path) {
            entries.push((entry_name(&record.identifier), path));
        }
    }

    if !identifiers.is_empty() && matched == 0 {
        return Err(ArchiveError::NoRecordsFound);
    }

    let archive = tokio::task::spawn_blocking(move || pack(entries))
        .await
        .map_err(|e| ArchiveError::Worker(e.to_string()))??;

    info!(
        requested = identifiers.len(),
        matched,
        bytes = archive.len(),
        "Built QR archive"
    );

    Ok(archive)
}

/// Zip entry name for a record's QR image
pub fn entry_name(identifier: &str) -> String {
    format!("{}.png", identifier.replace(['/', '\\'], "_"))
}

/// Write the existing files among `entries` into a zip
fn pack(entries: Vec<(String, PathBuf)>) -> Result<Vec<u8>, ArchiveError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut written = HashSet::new();

    for (name, path) in entries {
        // distinct identifiers may collapse to one entry name after sanitizing
        if written.contains(&name) {
            continue;
        }

        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(file = %path.display(), "QR image missing, skipping");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        zip.start_file(name.as_str(), options)?;
        zip.write_all(&data)?;
        written.insert(name);
    }

    Ok(zip.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::qr_issuer::QrIssuer;
    use qroster_common::config::QrConfig;
    use qroster_common::db::RecordFields;
    use zip::ZipArchive;

    struct Fixture {
        _dir: tempfile::TempDir,
        pool: SqlitePool,
        issuer: QrIssuer,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let pool = qroster_common::db::init_database(&dir.path().join("qroster.db"))
            .await
            .unwrap();
        let issuer = QrIssuer::new(
            dir.path().join("qr_codes"),
            "https://roster.example/details",
            QrConfig::default(),
        );
        Fixture {
            _dir: dir,
            pool,
            issuer,
        }
    }

    async fn store(f: &Fixture, identifier: &str) -> String {
        let path = f.issuer.issue(identifier).unwrap();
        records::upsert_by_identifier(&f.pool, identifier, &RecordFields::default(), &path)
            .await
            .unwrap();
        path
    }

    fn names(bytes: Vec<u8>) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_empty_request_yields_empty_archive() {
        let f = fixture().await;

        let bytes = build(&f.pool, f.issuer.qr_dir(), &[]).await.unwrap();

        assert!(names(bytes).is_empty());
    }

    #[tokio::test]
    async fn test_unknown_identifier_is_error() {
        let f = fixture().await;

        let result = build(&f.pool, f.issuer.qr_dir(), &["unknown".to_string()]).await;

        assert!(matches!(result, Err(ArchiveError::NoRecordsFound)));
    }

    #[tokio::test]
    async fn test_archive_contains_matched_images() {
        let f = fixture().await;
        store(&f, "A1").await;
        store(&f, "B2").await;

        let ids = vec![
            "A1".to_string(),
            "B2".to_string(),
            "A1".to_string(),
            "missing".to_string(),
        ];
        let bytes = build(&f.pool, f.issuer.qr_dir(), &ids).await.unwrap();

        assert_eq!(names(bytes), vec!["A1.png", "B2.png"]);
    }

    #[tokio::test]
    async fn test_missing_image_file_is_skipped() {
        let f = fixture().await;
        let path = store(&f, "gone").await;
        store(&f, "kept").await;
        std::fs::remove_file(resolve_stored_path(f.issuer.qr_dir(), &path).unwrap()).unwrap();

        let ids = vec!["gone".to_string(), "kept".to_string()];
        let bytes = build(&f.pool, f.issuer.qr_dir(), &ids).await.unwrap();

        assert_eq!(names(bytes), vec!["kept.png"]);
    }

    #[test]
    fn test_entry_name_replaces_separators() {
        assert_eq!(entry_name("a/b\\c"), "a_b_c.png");
    }
}
