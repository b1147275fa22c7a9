//! Sighting queries

use roadwatch_common::{NewSighting, SightingStatus};
use sqlx::{Row, SqlitePool};

/// One row of the `sightings` table
#[derive(Debug, Clone, PartialEq)]
pub struct SightingRow {
    pub id: String,
    pub animal: String,
    pub status: SightingStatus,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub timestamp_ms: i64,
    pub notes: Option<String>,
}

/// Insert a sighting under `id`
pub async fn insert_sighting(
    pool: &SqlitePool,
    id: &str,
    sighting: &NewSighting,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO sightings (id, animal, status, latitude, longitude, address, timestamp_ms, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(&sighting.animal)
    .bind(sighting.status.as_str())
    .bind(sighting.latitude)
    .bind(sighting.longitude)
    .bind(&sighting.address)
    .bind(sighting.timestamp.timestamp_millis())
    .bind(&sighting.notes)
    .execute(pool)
    .await?;

    Ok(())
}

/// All sightings, newest first; ties go to the most recently inserted
pub async fn list_sightings(pool: &SqlitePool) -> Result<Vec<SightingRow>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, animal, status, latitude, longitude, address, timestamp_ms, notes
        FROM sightings
        ORDER BY timestamp_ms DESC, rowid DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let status: String = row.get("status");
            SightingRow {
                id: row.get("id"),
                animal: row.get("animal"),
                // Rows are only written through insert_sighting, unknown text reads as live
                status: status.parse().unwrap_or_default(),
                latitude: row.get("latitude"),
                longitude: row.get("longitude"),
                address: row.get("address"),
                timestamp_ms: row.get("timestamp_ms"),
                notes: row.get("notes"),
            }
        })
        .collect())
}

/// Delete by id. Returns false when no row matched.
pub async fn delete_sighting(pool: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sightings WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
