//! Managed document store adapter
//!
//! Talks to the store's REST surface:
//! - insert: `POST {documents}/{collection}`; the generated id is the last
//!   segment of the returned document `name`
//! - list: `POST {documents}:runQuery`, ordered by `timestamp` descending
//! - delete: `DELETE {documents}/{collection}/{id}?currentDocument.exists=true`
//!
//! Field values are typed (`stringValue`, `doubleValue`, `timestampValue`,
//! ...). Timestamps are written as the store's native timestamp type and
//! read back into `DateTime<Utc>`. Documents written before a field existed
//! are read with the same defaults as every other backend.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{RawSighting, SightingBackend};
use crate::config::RemoteConfig;
use crate::models::{NewSighting, SightingRecord};
use crate::time;
use crate::{Error, Result};

const USER_AGENT: &str = concat!("roadwatch/", env!("CARGO_PKG_VERSION"));

/// Adapter for the managed document store
#[derive(Clone)]
pub struct RemoteBackend {
    http_client: Client,
    /// `{base}/projects/{project}/databases/{database}/documents`
    documents_url: Url,
    collection: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for RemoteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteBackend")
            .field("documents_url", &self.documents_url.as_str())
            .field("collection", &self.collection)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A stored document
#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: HashMap<String, Value>,
}

/// One row of a `runQuery` response; rows without a document carry only
/// read metadata
#[derive(Debug, Deserialize)]
struct QueryRow {
    document: Option<Document>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl RemoteBackend {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let project_id = config
            .project_id
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                Error::Config("Remote backend requires a project id".to_string())
            })?;

        let base = match &config.emulator_host {
            Some(host) => format!("http://{}/v1", host.trim_end_matches('/')),
            None => config.base_url.trim_end_matches('/').to_string(),
        };
        let documents_url = format!(
            "{}/projects/{}/databases/{}/documents",
            base, project_id, config.database
        );
        let documents_url = Url::parse(&documents_url).map_err(|e| {
            Error::Config(format!("Invalid document store URL '{}': {}", documents_url, e))
        })?;
        if documents_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "Document store URL cannot be a base: {}",
                documents_url
            )));
        }

        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            documents_url,
            collection: config.collection.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    pub fn documents_url(&self) -> &str {
        self.documents_url.as_str()
    }

    /// `{documents}/{collection}[/{id}]`, each part percent-encoded as one segment
    fn collection_url(&self, id: Option<&str>) -> Url {
        let mut url = self.documents_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&self.collection);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        url
    }

    /// `{documents}:runQuery`
    fn query_url(&self) -> Url {
        let mut url = self.documents_url.clone();
        let path = format!("{}:runQuery", url.path().trim_end_matches('/'));
        url.set_path(&path);
        url
    }

    fn with_key(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        }
    }
}

/// Request body for document creation
fn encode(sighting: &NewSighting) -> Value {
    fn string_or_null(value: &Option<String>) -> Value {
        match value {
            Some(s) => json!({ "stringValue": s }),
            None => json!({ "nullValue": null }),
        }
    }

    json!({
        "fields": {
            "animal": { "stringValue": sighting.animal },
            "status": { "stringValue": sighting.status.as_str() },
            "latitude": { "doubleValue": sighting.latitude },
            "longitude": { "doubleValue": sighting.longitude },
            "address": string_or_null(&sighting.address),
            "timestamp": { "timestampValue": time::to_wire(&sighting.timestamp) },
            "notes": string_or_null(&sighting.notes),
        }
    })
}

/// Structured query listing the collection newest first
fn list_query(collection: &str) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "orderBy": [{
                "field": { "fieldPath": "timestamp" },
                "direction": "DESCENDING"
            }]
        }
    })
}

/// Trailing segment of a document name
fn document_id(name: &str) -> Option<String> {
    name.rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

fn string_field(fields: &HashMap<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)?
        .get("stringValue")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Numbers may be stored as `doubleValue` or, for whole numbers, as an
/// `integerValue` string
fn number_field(fields: &HashMap<String, Value>, key: &str) -> Option<f64> {
    let value = fields.get(key)?;
    if let Some(d) = value.get("doubleValue").and_then(Value::as_f64) {
        return Some(d);
    }
    match value.get("integerValue")? {
        Value::String(s) => s.parse::<i64>().ok().map(|i| i as f64),
        other => other.as_f64(),
    }
}

fn timestamp_field(fields: &HashMap<String, Value>, key: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let value = fields.get(key)?;
    value
        .get("timestampValue")
        .or_else(|| value.get("stringValue"))
        .or_else(|| value.get("integerValue"))
        .and_then(time::parse_timestamp)
}

/// Decode a stored document into a record
fn decode(document: Document) -> Result<SightingRecord> {
    let fields = &document.fields;
    RawSighting {
        id: document_id(&document.name),
        animal: string_field(fields, "animal"),
        status: string_field(fields, "status"),
        latitude: number_field(fields, "latitude"),
        longitude: number_field(fields, "longitude"),
        address: string_field(fields, "address"),
        timestamp: timestamp_field(fields, "timestamp"),
        notes: string_field(fields, "notes"),
    }
    .normalize()
}

/// Store-provided error message, or `fallback`
async fn error_message(response: Response, fallback: &str) -> String {
    response
        .json::<ErrorEnvelope>()
        .await
        .ok()
        .and_then(|envelope| envelope.error.message)
        .filter(|msg| !msg.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

#[async_trait]
impl SightingBackend for RemoteBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn insert(&self, sighting: &NewSighting) -> Result<String> {
        let url = self.collection_url(None);
        debug!(url = %url, animal = %sighting.animal, "Creating document");

        let response = self
            .with_key(self.http_client.post(url))
            .json(&encode(sighting))
            .send()
            .await
            .map_err(|e| Error::Persistence(format!("Failed to save sighting: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Persistence(
                error_message(response, "Failed to save sighting").await,
            ));
        }

        let document: Document = response
            .json()
            .await
            .map_err(|e| Error::Persistence(format!("Unexpected response from store: {}", e)))?;

        document_id(&document.name).ok_or_else(|| {
            Error::Persistence(format!("Store returned a document without an id: {}", document.name))
        })
    }

    async fn list(&self) -> Result<Vec<SightingRecord>> {
        let url = self.query_url();
        debug!(url = %url, collection = %self.collection, "Querying documents");

        let response = self
            .with_key(self.http_client.post(url))
            .json(&list_query(&self.collection))
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("Failed to fetch sightings: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Fetch(
                error_message(response, "Failed to fetch sightings").await,
            ));
        }

        let rows: Vec<QueryRow> = response
            .json()
            .await
            .map_err(|e| Error::Fetch(format!("Failed to parse sightings: {}", e)))?;

        rows.into_iter()
            .filter_map(|row| row.document)
            .map(decode)
            .collect()
    }

    async fn delete(&self, id: &str) -> Result<()> {
        if id.contains('/') {
            return Err(Error::Validation(format!("Invalid sighting id: {}", id)));
        }
        let url = self.collection_url(Some(id));
        debug!(url = %url, "Deleting document");

        let response = self
            .with_key(self.http_client.delete(url))
            .query(&[("currentDocument.exists", "true")])
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
