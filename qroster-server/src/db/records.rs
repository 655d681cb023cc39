//! Record store operations
//!
//! Every function takes a sqlx executor so the same queries run against the
//! pool (single requests) or a transaction (upload batches).

use chrono::Utc;
use qroster_common::db::{Record, RecordFields, RECORD_COLUMNS};
use qroster_common::{Error, Result};
use sqlx::{Executor, Sqlite};

/// Insert a record, or update every mutable field of the existing record
/// with the same identifier. `identifier` and `created_at` are never changed
/// by the update branch; `qr_image_path` is.
pub async fn upsert_by_identifier<'e, E>(
    executor: E,
    identifier: &str,
    fields: &RecordFields,
    qr_image_path: &str,
) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO records (
            identifier, name, designation, constituency, district,
            phone_number, photo_url, qr_image_path, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(identifier) DO UPDATE SET
            name = excluded.name,
            designation = excluded.designation,
            constituency = excluded.constituency,
            district = excluded.district,
            phone_number = excluded.phone_number,
            photo_url = excluded.photo_url,
            qr_image_path = excluded.qr_image_path,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(identifier)
    .bind(&fields.name)
    .bind(&fields.designation)
    .bind(&fields.constituency)
    .bind(&fields.district)
    .bind(&fields.phone_number)
    .bind(&fields.photo_url)
    .bind(qr_image_path)
    .bind(&now)
    .bind(&now)
    .execute(executor)
    .await?;

    Ok(())
}

/// Load a record by external identifier
pub async fn get_by_identifier<'e, E>(executor: E, identifier: &str) -> Result<Option<Record>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(&format!(
        "SELECT {} FROM records WHERE identifier = ?",
        RECORD_COLUMNS
    ))
    .bind(identifier)
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(Record::from_row).transpose()
}

/// Load a record by row id
pub async fn get_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Record>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(&format!("SELECT {} FROM records WHERE id = ?", RECORD_COLUMNS))
        .bind(id)
        .fetch_optional(executor)
        .await?;

    row.as_ref().map(Record::from_row).transpose()
}

/// All records ordered by name, then id for a stable order among equal names
pub async fn list<'e, E>(executor: E) -> Result<Vec<Record>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(&format!(
        "SELECT {} FROM records ORDER BY name ASC, id ASC",
        RECORD_COLUMNS
    ))
    .fetch_all(executor)
    .await?;

    rows.iter().map(Record::from_row).collect()
}

/// Replace the mutable fields of a record; identifier and QR path untouched
///
/// Returns `Error::NotFound` when no record has this id.
pub async fn update_fields<'e, E>(executor: E, id: i64, fields: &RecordFields) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE records SET
            name = ?, designation = ?, constituency = ?, district = ?,
            phone_number = ?, photo_url = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&fields.name)
    .bind(&fields.designation)
    .bind(&fields.constituency)
    .bind(&fields.district)
    .bind(&fields.phone_number)
    .bind(&fields.photo_url)
    .bind(Utc::now().to_rfc3339())
    .bind(id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("record {}", id)));
    }

    Ok(())
}

/// Delete a record by row id, returning the deleted record
pub async fn delete_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Record>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(&format!(
        "DELETE FROM records WHERE id = ? RETURNING {}",
        RECORD_COLUMNS
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(Record::from_row).transpose()
}

/// Count stored records
pub async fn count<'e, E>(executor: E) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records")
        .fetch_one(executor)
        .await?;
    Ok(count)
}
