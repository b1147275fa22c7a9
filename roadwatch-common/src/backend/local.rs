//! Local REST service adapter
//!
//! Wire contract:
//! - `GET /sightings` → JSON array, newest first (trusted, not re-sorted)
//! - `POST /sightings` → `201 { id }` or `400 { error }`
//! - `DELETE /sightings/:id` → `200 { success: true }`
//!
//! Any non-2xx response is a failure. The server's `error` message is
//! surfaced when the body carries one, otherwise a generic message.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{RawSighting, SightingBackend};
use crate::models::{NewSighting, SightingRecord};
use crate::time;
use crate::{Error, Result};

const USER_AGENT: &str = concat!("roadwatch/", env!("CARGO_PKG_VERSION"));

/// Adapter for the local sightings REST service
#[derive(Debug, Clone)]
pub struct LocalBackend {
    http_client: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

impl LocalBackend {
    /// Create an adapter for the service at `base_url` (e.g. `http://10.0.2.2:3001`)
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid local API URL '{}': {}", base_url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Local API URL must be http or https: {}",
                base_url
            )));
        }

        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `<base>/sightings[/<id>]`, with the id percent-encoded as one segment
    fn endpoint(&self, id: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                Error::Config(format!("Local API URL cannot be a base: {}", self.base_url))
            })?;
            segments.pop_if_empty().push("sightings");
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }
}

/// Decode one `GET /sightings` element into a record.
///
/// Fields are read one at a time; a field of an unexpected type reads as
/// missing and gets the usual default. `id` wins over `_id` when a service
/// sends both.
fn decode(document: &Value) -> Result<SightingRecord> {
    let id = document
        .get("id")
        .and_then(id_value)
        .or_else(|| document.get("_id").and_then(id_value));

    RawSighting {
        id,
        animal: string_field(document, "animal"),
        status: string_field(document, "status"),
        latitude: number_field(document, "latitude"),
        longitude: number_field(document, "longitude"),
        address: string_field(document, "address"),
        timestamp: document.get("timestamp").and_then(time::parse_timestamp),
        notes: string_field(document, "notes"),
    }
    .normalize()
}

/// Plain string, number, or extended JSON `{ "$oid": ... }`
fn id_value(value: &Value) -> Option<String> {
    let id = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(map) => map.get("$oid").and_then(Value::as_str)?.trim().to_string(),
        _ => return None,
    };
    (!id.is_empty()).then_some(id)
}

fn string_field(document: &Value, key: &str) -> Option<String> {
    document.get(key)?.as_str().map(str::to_string)
}

/// Numbers, or numeric strings as some clients stored them
fn number_field(document: &Value, key: &str) -> Option<f64> {
    match document.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// Request body for `POST /sightings`
fn encode(sighting: &NewSighting) -> Value {
    json!({
        "animal": sighting.animal,
        "status": sighting.status.as_str(),
        "latitude": sighting.latitude,
        "longitude": sighting.longitude,
        "address": sighting.address,
        "timestamp": time::to_wire(&sighting.timestamp),
        "notes": sighting.notes,
    })
}

/// Server-provided error message, or `fallback`
async fn error_message(response: Response, fallback: &str) -> String {
    response
        .json::<ErrorResponse>()
        .await
        .ok()
        .and_then(|body| body.error)
        .filter(|msg| !msg.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

#[async_trait]
impl SightingBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn insert(&self, sighting: &NewSighting) -> Result<String> {
        let url = self.endpoint(None)?;
        debug!(url = %url, animal = %sighting.animal, "POST sighting");

        let response = self
            .http_client
            .post(url)
            .json(&encode(sighting))
            .send()
            .await
            .map_err(|e| Error::Persistence(format!("Failed to save sighting: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Persistence(
                error_message(response, "Failed to save sighting").await,
            ));
        }

        let created: CreatedResponse = response
            .json()
            .await
            .map_err(|e| Error::Persistence(format!("Unexpected response from server: {}", e)))?;
        Ok(created.id)
    }

    async fn list(&self) -> Result<Vec<SightingRecord>> {
        let url = self.endpoint(None)?;
        debug!(url = %url, "GET sightings");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("Failed to fetch sightings: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Fetch(
                error_message(response, "Failed to fetch sightings").await,
            ));
        }

        let documents: Vec<Value> = response
            .json()
            .await
            .map_err(|e| Error::Fetch(format!("Failed to parse sightings: {}", e)))?;

        documents.iter().map(decode).collect()
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let url = self.endpoint(Some(id))?;
        debug!(url = %url, "DELETE sighting");

        let response = self
            .http_client
            .delete(url)
            .send()
            .await
            .map_err(|e| Error::Persistence(format!("Failed to delete sighting: {}", e)))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(Error::NotFound(id.to_string())),
            _ => Err(Error::Persistence(
                error_message(response, "Failed to delete sighting").await,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SightingStatus;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_rejects_non_http_base() {
        assert!(matches!(LocalBackend::new("ftp://example.com"), Err(Error::Config(_))));
        assert!(matches!(LocalBackend::new("not a url"), Err(Error::Config(_))));
    }

    #[test]
    fn test_endpoint_paths() {
        let backend = LocalBackend::new("http://10.0.2.2:3001").unwrap();
        assert_eq!(
            backend.endpoint(None).unwrap().as_str(),
            "http://10.0.2.2:3001/sightings"
        );
        assert_eq!(
            backend.endpoint(Some("a b/c")).unwrap().as_str(),
            "http://10.0.2.2:3001/sightings/a%20b%2Fc"
        );

        let prefixed = LocalBackend::new("http://example.com/api/").unwrap();
        assert_eq!(
            prefixed.endpoint(None).unwrap().as_str(),
            "http://example.com/api/sightings"
        );
    }

    #[test]
    fn test_encode_serializes_timestamp_for_the_wire() {
        let ts = Utc.with_ymd_and_hms(2025, 7, 4, 18, 0, 0).unwrap();
        let body = encode(
            &NewSighting::new("Deer", SightingStatus::Dead, 44.0, -93.0)
                .with_timestamp(ts)
                .with_notes("east shoulder"),
        );
        assert_eq!(body["timestamp"], "2025-07-04T18:00:00.000Z");
        assert_eq!(body["status"], "dead");
        assert_eq!(body["notes"], "east shoulder");
        assert!(body["address"].is_null());
    }

    #[test]
    fn test_decode_accepts_mongo_style_documents() {
        let record = decode(&json!({
            "_id": "665f1c2e9b1d8c0012a3b4c5",
            "animal": "Raccoon",
            "latitude": 40.7,
            "longitude": -74.0,
            "address": null,
            "timestamp": "2025-06-01T12:00:00.000Z",
            "notes": null
        }))
        .unwrap();

        assert_eq!(record.id, "665f1c2e9b1d8c0012a3b4c5");
        assert_eq!(record.status, SightingStatus::Live);
        assert_eq!(record.timestamp, Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_decode_extended_json_ids() {
        let record = decode(&json!({
            "_id": { "$oid": "665f1c2e9b1d8c0012a3b4c5" },
            "timestamp": { "$date": "2025-06-01T12:00:00Z" }
        }))
        .unwrap();

        assert_eq!(record.id, "665f1c2e9b1d8c0012a3b4c5");
        assert_eq!(record.animal, "Unknown");
    }

    #[test]
    fn test_decode_prefers_id_when_both_ids_present() {
        let record = decode(&json!({
            "_id": { "$oid": "665f1c2e9b1d8c0012a3b4c5" },
            "id": "665f",
            "animal": "Fox",
            "timestamp": "2025-06-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(record.id, "665f");

        let blank_id = decode(&json!({
            "_id": "665f",
            "id": "  ",
            "timestamp": "2025-06-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(blank_id.id, "665f");
    }

    #[test]
    fn test_decode_numeric_string_coordinates() {
        let record = decode(&json!({
            "id": "s1",
            "animal": "Deer",
            "latitude": "40.7",
            "longitude": " -74.25 ",
            "timestamp": "2025-06-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(record.latitude, 40.7);
        assert_eq!(record.longitude, -74.25);
    }

    #[test]
    fn test_decode_unreadable_fields_fall_back_to_defaults() {
        let record = decode(&json!({
            "id": "s2",
            "animal": 42,
            "status": true,
            "latitude": "north",
            "longitude": { "deg": 5 },
            "address": ["Main St"],
            "timestamp": 1_748_779_200_000i64
        }))
        .unwrap();
        assert_eq!(record.animal, "Unknown");
        assert_eq!(record.status, SightingStatus::Live);
        assert_eq!(record.latitude, 0.0);
        assert_eq!(record.longitude, 0.0);
        assert_eq!(record.address, None);
        assert_eq!(record.timestamp, Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_decode_fails_on_unreadable_timestamp() {
        let document = json!({
            "id": "x1",
            "animal": "Owl",
            "timestamp": "last tuesday"
        });
        assert!(matches!(decode(&document), Err(Error::Fetch(_))));
    }
}
