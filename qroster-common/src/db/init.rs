//! Database initialization
//!
//! Opens (or creates) the roster database and ensures the `records` table
//! exists. There are no migrations: the schema is created idempotently on
//! every start.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Maximum pooled connections handed out to request handlers
pub const MAX_CONNECTIONS: u32 = 10;

/// How long a connection waits for another writer before failing with
/// `SQLITE_BUSY`
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Initialize database connection pool and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Applied per connection, so every pooled connection shares them.
    // WAL lets dashboard reads proceed while an upload batch holds the writer
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_records_table(&pool).await?;

    Ok(pool)
}

/// Create the `records` table keyed by the external identifier
pub async fn create_records_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            identifier TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL DEFAULT '',
            designation TEXT NOT NULL DEFAULT '',
            constituency TEXT NOT NULL DEFAULT '',
            district TEXT NOT NULL DEFAULT '',
            phone_number TEXT NOT NULL DEFAULT '',
            photo_url TEXT NOT NULL DEFAULT '',
            qr_image_path TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_records_name ON records(name)")
        .execute(pool)
        .await?;

    Ok(())
}
