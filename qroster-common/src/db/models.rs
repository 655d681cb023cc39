//! Database models

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};

/// One roster entry, keyed by its external identifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub id: i64,
    pub identifier: String,
    pub name: String,
    pub designation: String,
    pub constituency: String,
    pub district: String,
    pub phone_number: String,
    pub photo_url: String,
    /// Server-relative path of the generated QR image (`/qr_codes/<file>`)
    pub qr_image_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column list matching [`Record::from_row`]
pub const RECORD_COLUMNS: &str = "id, identifier, name, designation, constituency, district, \
     phone_number, photo_url, qr_image_path, created_at, updated_at";

impl Record {
    /// Decode a row selected with [`RECORD_COLUMNS`]
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            identifier: row.try_get("identifier")?,
            name: row.try_get("name")?,
            designation: row.try_get("designation")?,
            constituency: row.try_get("constituency")?,
            district: row.try_get("district")?,
            phone_number: row.try_get("phone_number")?,
            photo_url: row.try_get("photo_url")?,
            qr_image_path: row.try_get("qr_image_path")?,
            created_at: parse_timestamp(row.try_get("created_at")?)?,
            updated_at: parse_timestamp(row.try_get("updated_at")?)?,
        })
    }
}

/// Mutable fields of a record, as written by imports and edits
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordFields {
    pub name: String,
    pub designation: String,
    pub constituency: String,
    pub district: String,
    pub phone_number: String,
    pub photo_url: String,
}

fn parse_timestamp(value: String) -> Result<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(&value) {
        Ok(ts) => Ok(ts.with_timezone(&Utc)),
        Err(source) => Err(Error::Timestamp { value, source }),
    }
}
