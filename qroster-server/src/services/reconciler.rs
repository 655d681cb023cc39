//! Upload reconciliation
//!
//! Runs one uploaded batch in two passes. The first pass normalizes every row
//! and issues its QR image; nothing touches the store yet. The second pass
//! upserts the issued rows inside a single transaction, so the SQLite writer
//! lock is only held for the upserts. A row that cannot be issued or
//! upserted is logged and recorded in the summary but never
//! aborts the batch. Lock contention outlasting the busy timeout, or failing
//! to open or commit the transaction, rolls the whole batch back; QR files
//! already written for it are left on disk as orphans.

use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{error, info, warn};

use super::normalizer::{self, NormalizedRecord, RawRow};
use super::qr_issuer::{IssuanceError, QrIssuer};
use crate::db::records;

/// Batch-level failure
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Upload contained no data rows
    #[error("Spreadsheet contains no data rows")]
    EmptyBatch,

    /// Transaction could not be opened, written or committed; nothing was
    /// persisted
    #[error("Batch transaction failed: {0}")]
    Store(#[from] sqlx::Error),
}

/// Why a single row was skipped
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RowFailure {
    /// 1-based data row number (header excluded)
    pub row: usize,
    pub identifier: String,
    pub cause: String,
}

/// Outcome of a committed batch
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub processed: usize,
    pub total: usize,
    pub failures: Vec<RowFailure>,
}

/// A normalized row with its freshly issued QR image
struct IssuedRow {
    row: usize,
    record: NormalizedRecord,
    qr_image_path: String,
}

/// Reconcile a batch of raw rows into the record store
pub async fn reconcile(
    pool: &SqlitePool,
    issuer: &QrIssuer,
    rows: Vec<RawRow>,
) -> Result<ReconcileSummary, ReconcileError> {
    if rows.is_empty() {
        return Err(ReconcileError::EmptyBatch);
    }

    let total = rows.len();
    let mut failures = Vec::new();
    let mut issued = Vec::with_capacity(total);

    for (index, raw) in rows.iter().enumerate() {
        let row = index + 1;
        let record = normalizer::normalize(raw);

        if record.generated_identifier {
            info!(row, identifier = %record.identifier, "Generated identifier for row");
        }

        let issuance = issue_blocking(issuer, &record.identifier).await;
        match issuance {
            Ok(qr_image_path) => issued.push(IssuedRow {
                row,
                record,
                qr_image_path,
            }),
            Err(e) => {
                error!(row, identifier = %record.identifier, error = %e, "QR issuance failed");
                failures.push(RowFailure {
                    row,
                    identifier: record.identifier,
                    cause: e.to_string(),
                });
            }
        }
    }

    let issued_files: Vec<&str> = issued.iter().map(|r| r.qr_image_path.as_str()).collect();
    let orphan = |e: sqlx::Error| {
        warn!(
            orphaned = issued_files.len(),
            files = ?issued_files,
            error = %e,
            "Batch rolled back; issued QR files are now orphaned"
        );
        ReconcileError::Store(e)
    };

    let mut tx = pool.begin().await.map_err(&orphan)?;
    let mut processed = 0;

    for IssuedRow {
        row,
        record,
        qr_image_path,
    } in &issued
    {
        match records::upsert_by_identifier(
            &mut *tx,
            &record.identifier,
            &record.fields,
            qr_image_path,
        )
        .await
        {
            Ok(()) => {
                processed += 1;
                info!(row, total, identifier = %record.identifier, "Processed row");
            }
            Err(qroster_common::Error::Database(e)) if is_lock_contention(&e) => {
                return Err(orphan(e));
            }
            Err(e) => {
                error!(row, identifier = %record.identifier, error = %e, "Record upsert failed");
                failures.push(RowFailure {
                    row: *row,
                    identifier: record.identifier.clone(),
                    cause: e.to_string(),
                });
            }
        }
    }

    tx.commit().await.map_err(&orphan)?;

    failures.sort_by_key(|f| f.row);
    info!(processed, total, failed = failures.len(), "Upload batch committed");

    Ok(ReconcileSummary {
        processed,
        total,
        failures,
    })
}

/// SQLITE_BUSY or SQLITE_LOCKED, including their extended codes
fn is_lock_contention(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|db| db.code())
        .and_then(|code| code.parse::<i32>().ok())
        .map(|code| matches!(code & 0xff, 5 | 6))
        .unwrap_or(false)
}

/// Run QR issuance on the blocking pool; it renders and writes files
async fn issue_blocking(issuer: &QrIssuer, identifier: &str) -> Result<String, IssuanceError> {
    let issuer = issuer.clone();
    let identifier = identifier.to_string();

    tokio::task::spawn_blocking(move || issuer.issue(&identifier))
        .await
        .map_err(|e| IssuanceError::Worker(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use qroster_common::config::QrConfig;
    use qroster_common::db::RecordFields;
    use std::time::Duration;

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

    fn row(cells: &[(&str, &str)]) -> RawRow {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_empty_batch_rejected() {
        let f = fixture().await;

        let result = reconcile(&f.pool, &f.issuer, Vec::new()).await;

        assert!(matches!(result, Err(ReconcileError::EmptyBatch)));
        assert!(!f.issuer.qr_dir().exists(), "No QR work before the batch opens");
    }

    #[tokio::test]
    async fn test_valid_rows_all_processed() {
        let f = fixture().await;
        let rows = vec![
            row(&[("Unique ID", "a"), ("Name", "Asha")]),
            row(&[("Unique ID", "b"), ("Name", "Bala")]),
            row(&[("unique_id", "c"), ("name", "Chitra")]),
        ];

        let summary = reconcile(&f.pool, &f.issuer, rows).await.unwrap();

        assert_eq!(summary.processed, 3);
        assert_eq!(summary.total, 3);
        assert!(summary.failures.is_empty());
        assert_eq!(records::count(&f.pool).await.unwrap(), 3);

        for record in records::list(&f.pool).await.unwrap() {
            let path =
                super::super::qr_issuer::resolve_stored_path(f.issuer.qr_dir(), &record.qr_image_path)
                    .unwrap();
            assert!(path.exists(), "QR image missing for {}", record.identifier);
        }
    }

    #[tokio::test]
    async fn test_blank_and_duplicate_identifiers() {
        let f = fixture().await;
        let rows = vec![
            row(&[("Unique ID", "dup"), ("Name", "First"), ("District", "Salem")]),
            row(&[("Unique ID", ""), ("Name", "Generated")]),
            row(&[("Unique ID", "dup"), ("Name", "Third"), ("District", "Erode")]),
        ];

        let summary = reconcile(&f.pool, &f.issuer, rows).await.unwrap();

        assert_eq!(summary.processed, 3);
        assert_eq!(summary.total, 3);

        let all = records::list(&f.pool).await.unwrap();
        assert_eq!(all.len(), 2);

        let dup = records::get_by_identifier(&f.pool, "dup").await.unwrap().unwrap();
        assert_eq!(dup.name, "Third");
        assert_eq!(dup.district, "Erode");

        let generated = all.iter().find(|r| r.name == "Generated").unwrap();
        assert!(!generated.identifier.is_empty());
        assert_ne!(generated.identifier, "dup");
    }

    #[tokio::test]
    async fn test_reimport_updates_fields_not_identifier() {
        let f = fixture().await;
        reconcile(
            &f.pool,
            &f.issuer,
            vec![row(&[("Unique ID", "K1"), ("Name", "Old"), ("Phone", "1")])],
        )
        .await
        .unwrap();
        let before = records::get_by_identifier(&f.pool, "K1").await.unwrap().unwrap();

        reconcile(
            &f.pool,
            &f.issuer,
            vec![row(&[("Unique ID", "K1"), ("Name", "New"), ("Phone", "2")])],
        )
        .await
        .unwrap();
        let after = records::get_by_identifier(&f.pool, "K1").await.unwrap().unwrap();

        assert_eq!(after.id, before.id);
        assert_eq!(after.identifier, before.identifier);
        assert_eq!(after.name, "New");
        assert_eq!(after.phone_number, "2");
        assert_ne!(after.qr_image_path, before.qr_image_path);
    }

    #[tokio::test]
    async fn test_row_issuance_failure_is_skipped() {
        let f = fixture().await;
        // A payload beyond QR capacity cannot be encoded
        let oversized = "x".repeat(8_000);
        let rows = vec![
            row(&[("Unique ID", "ok"), ("Name", "Fine")]),
            row(&[("Unique ID", oversized.as_str()), ("Name", "Too long")]),
        ];

        let summary = reconcile(&f.pool, &f.issuer, rows).await.unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].row, 2);
        assert!(summary.failures[0].cause.contains("QR encoding failed"));
        assert_eq!(records::count(&f.pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_writer_is_waited_out() {
        let f = fixture().await;
        let mut holder = f.pool.begin().await.unwrap();
        records::upsert_by_identifier(&mut *holder, "held", &RecordFields::default(), "")
            .await
            .unwrap();
        let release = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            holder.commit().await.unwrap();
        });

        let summary = reconcile(
            &f.pool,
            &f.issuer,
            vec![row(&[("Unique ID", "A"), ("Name", "Asha")])],
        )
        .await
        .unwrap();
        release.await.unwrap();

        assert_eq!(summary.processed, 1);
        assert!(summary.failures.is_empty());
        assert_eq!(records::count(&f.pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_writer_lock_outlasting_busy_timeout_fails_batch() {
        let f = fixture().await;
        let mut holder = f.pool.begin().await.unwrap();
        records::upsert_by_identifier(&mut *holder, "held", &RecordFields::default(), "")
            .await
            .unwrap();

        let result = reconcile(
            &f.pool,
            &f.issuer,
            vec![
                row(&[("Unique ID", "A"), ("Name", "Asha")]),
                row(&[("Unique ID", "B"), ("Name", "Bala")]),
            ],
        )
        .await;
        holder.rollback().await.unwrap();

        match result {
            Err(ReconcileError::Store(e)) => assert!(is_lock_contention(&e), "{}", e),
            other => panic!("Expected batch-level store error, got {:?}", other),
        }
        assert_eq!(records::count(&f.pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_closed_pool_fails_batch() {
        let f = fixture().await;
        f.pool.close().await;

        let result = reconcile(
            &f.pool,
            &f.issuer,
            vec![row(&[("Unique ID", "A"), ("Name", "Asha")])],
        )
        .await;

        assert!(matches!(result, Err(ReconcileError::Store(_))));
    }
}
