//! Sighting endpoints
//!
//! - `GET /sightings` - all sightings, newest first
//! - `POST /sightings` - create, responds `201 { id }`
//! - `DELETE /sightings/:id` - responds `{ success: true }`

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use roadwatch_common::{time, NewSighting, SightingStatus};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{self, SightingRow};
use crate::{ApiError, ApiResult, AppState};

const REQUIRED_FIELDS: &str = "animal, latitude, and longitude are required";

/// One element of the `GET /sightings` response
#[derive(Debug, Serialize)]
pub struct SightingResponse {
    pub id: String,
    pub animal: String,
    pub status: SightingStatus,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub timestamp: Option<String>,
    pub notes: Option<String>,
}

impl From<SightingRow> for SightingResponse {
    fn from(row: SightingRow) -> Self {
        Self {
            id: row.id,
            animal: row.animal,
            status: row.status,
            latitude: row.latitude,
            longitude: row.longitude,
            address: row.address,
            timestamp: time::from_millis(row.timestamp_ms).map(|ts| time::to_wire(&ts)),
            notes: row.notes,
        }
    }
}

/// GET /sightings
pub async fn list_sightings(State(state): State<AppState>) -> ApiResult<Json<Vec<SightingResponse>>> {
    let rows = db::list_sightings(&state.db).await?;
    debug!(count = rows.len(), "Listed sightings");
    Ok(Json(rows.into_iter().map(SightingResponse::from).collect()))
}

/// POST /sightings
pub async fn create_sighting(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(body) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let sighting = parse_sighting(&body)?;

    let id = Uuid::new_v4().to_string();
    db::insert_sighting(&state.db, &id, &sighting).await?;
    info!(id = %id, animal = %sighting.animal, status = %sighting.status, "Saved sighting");

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// DELETE /sightings/:id
pub async fn delete_sighting(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    if !db::delete_sighting(&state.db, &id).await? {
        return Err(ApiError::NotFound(id));
    }
    info!(id = %id, "Deleted sighting");
    Ok(Json(json!({ "success": true })))
}

/// Build a sighting from a `POST /sightings` body
fn parse_sighting(body: &Value) -> ApiResult<NewSighting> {
    let animal = body["animal"].as_str().map(str::trim).unwrap_or_default();
    let latitude = body["latitude"].as_f64();
    let longitude = body["longitude"].as_f64();

    let (latitude, longitude) = match (latitude, longitude) {
        (Some(lat), Some(lng)) if !animal.is_empty() => (lat, lng),
        _ => return Err(ApiError::BadRequest(REQUIRED_FIELDS.to_string())),
    };

    let status = match &body["status"] {
        Value::Null => SightingStatus::Live,
        Value::String(text) => text
            .parse()
            .map_err(|e: roadwatch_common::Error| ApiError::BadRequest(e.to_string()))?,
        other => {
            return Err(ApiError::BadRequest(format!(
                "status must be 'live' or 'dead', got {}",
                other
            )))
        }
    };

    let mut sighting = NewSighting::new(animal, status, latitude, longitude);

    match &body["timestamp"] {
        Value::Null => {}
        value => {
            let timestamp = time::parse_timestamp(value).ok_or_else(|| {
                ApiError::BadRequest(format!("Invalid timestamp: {}", value))
            })?;
            sighting = sighting.with_timestamp(timestamp);
        }
    }
    if let Some(address) = body["address"].as_str() {
        sighting = sighting.with_address(address);
    }
    if let Some(notes) = body["notes"].as_str() {
        sighting = sighting.with_notes(notes);
    }

    sighting
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(sighting)
}

/// Build sighting routes
pub fn sighting_routes() -> Router<AppState> {
    Router::new()
        .route("/sightings", get(list_sightings).post(create_sighting))
        .route("/sightings/:id", delete(delete_sighting))
}
