//! Database access layer for roadwatch-server
//!
//! Single `sightings` table. Timestamps are stored as milliseconds since the
//! Unix epoch so ordering happens in SQL.

use anyhow::{Context, Result};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

pub mod sightings;

pub use sightings::{delete_sighting, insert_sighting, list_sightings, SightingRow};

/// Open (creating if needed) the database at `db_path` and ensure the schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_sightings_table(&pool).await?;

    Ok(pool)
}

/// In-memory database for tests
///
/// One connection that never expires, otherwise each new connection would
/// see an empty database.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .context("Failed to open in-memory database")?;

    create_sightings_table(&pool).await?;
    Ok(pool)
}

async fn create_sightings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sightings (
            id TEXT PRIMARY KEY,
            animal TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'live',
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            address TEXT,
            timestamp_ms INTEGER NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create sightings table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sightings_timestamp ON sightings(timestamp_ms)")
        .execute(pool)
        .await
        .context("Failed to create sightings index")?;

    Ok(())
}
