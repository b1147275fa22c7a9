//! Remote adapter tests against a fake document store
//!
//! The fake implements just enough of the store's REST surface (create,
//! runQuery, delete with an existence precondition) to exercise the
//! adapter's encoding, ordering, decoding and error mapping.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use roadwatch_common::backend::{RemoteBackend, SightingBackend};
use roadwatch_common::config::RemoteConfig;
use roadwatch_common::{Error, NewSighting, SightingRepository, SightingStatus};
use serde_json::{json, Value};

const PROJECT: &str = "test-project";
const API_KEY: &str = "test-key";

/// In-memory document store
#[derive(Clone, Default)]
struct FakeStore {
    documents: Arc<Mutex<Vec<(String, Value)>>>,
    next_id: Arc<AtomicUsize>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl FakeStore {
    /// Insert raw typed fields, as an older client might have written them
    fn seed(&self, id: &str, fields: Value) {
        self.documents
            .lock()
            .unwrap()
            .push((id.to_string(), fields));
    }

    fn document(id: &str, fields: &Value) -> Value {
        json!({
            "name": format!("projects/{}/databases/(default)/documents/sightings/{}", PROJECT, id),
            "fields": fields,
            "createTime": "2025-06-01T12:00:00.000000Z",
            "updateTime": "2025-06-01T12:00:00.000000Z"
        })
    }
}

fn store_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({
            "error": { "code": status.as_u16(), "message": message, "status": "FAILED" }
        })),
    )
        .into_response()
}

fn field_timestamp(fields: &Value) -> Option<DateTime<Utc>> {
    fields["timestamp"]["timestampValue"]
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|ts| ts.with_timezone(&Utc))
}

/// Decode `%XX` escapes in one path segment
fn percent_decode(segment: &str) -> String {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(byte) = u8::from_str_radix(&segment[i + 1..i + 3], 16) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap()
}

async fn handle(State(store): State<FakeStore>, method: Method, uri: Uri, body: Bytes) -> Response {
    let path = uri.path().to_string();
    let query = uri.query().unwrap_or_default().to_string();
    store.queries.lock().unwrap().push(query.clone());

    if !query.contains(&format!("key={}", API_KEY)) {
        return store_error(StatusCode::FORBIDDEN, "API key not valid.");
    }

    if method == Method::POST && path.ends_with("/documents:runQuery") {
        let request: Value = serde_json::from_slice(&body).unwrap_or_default();
        let descending = request["structuredQuery"]["orderBy"][0]["direction"] == "DESCENDING";

        let mut documents = store.documents.lock().unwrap().clone();
        documents.sort_by_key(|(_, fields)| field_timestamp(fields));
        if descending {
            documents.reverse();
        }

        let mut rows: Vec<Value> = documents
            .iter()
            .map(|(id, fields)| {
                json!({
                    "document": FakeStore::document(id, fields),
                    "readTime": "2025-06-02T00:00:00.000000Z"
                })
            })
            .collect();
        if rows.is_empty() {
            rows.push(json!({ "readTime": "2025-06-02T00:00:00.000000Z" }));
        }
        return Json(Value::Array(rows)).into_response();
    }

    if method == Method::POST && path.ends_with("/documents/sightings") {
        let request: Value = match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(e) => return store_error(StatusCode::BAD_REQUEST, &e.to_string()),
        };
        let fields = request["fields"].clone();
        if fields["animal"]["stringValue"] == "forbidden" {
            return store_error(StatusCode::FORBIDDEN, "Missing or insufficient permissions.");
        }

        let id = format!("doc{}", store.next_id.fetch_add(1, Ordering::SeqCst));
        store.seed(&id, fields.clone());
        return Json(FakeStore::document(&id, &fields)).into_response();
    }

    if method == Method::DELETE && path.contains("/documents/sightings/") {
        let id = percent_decode(path.rsplit('/').next().unwrap_or_default());
        let mut documents = store.documents.lock().unwrap();
        let before = documents.len();
        documents.retain(|(doc_id, _)| doc_id != &id);

        if documents.len() == before && query.contains("currentDocument.exists=true") {
            return store_error(StatusCode::NOT_FOUND, &format!("No document to update: {}", id));
        }
        return Json(json!({})).into_response();
    }

    store_error(StatusCode::NOT_FOUND, "Unknown route")
}

async fn spawn_store(store: FakeStore) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(handle).with_state(store);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr.to_string()
}

fn config(emulator_host: String) -> RemoteConfig {
    RemoteConfig {
        project_id: Some(PROJECT.to_string()),
        api_key: Some(API_KEY.to_string()),
        emulator_host: Some(emulator_host),
        ..RemoteConfig::default()
    }
}

async fn setup() -> (FakeStore, SightingRepository) {
    let store = FakeStore::default();
    let host = spawn_store(store.clone()).await;
    let backend = RemoteBackend::new(&config(host)).unwrap();
    (store, SightingRepository::new(Arc::new(backend)))
}

#[tokio::test]
async fn test_add_returns_generated_id_and_writes_native_timestamp() {
    let (store, repo) = setup().await;
    let ts = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();

    let id = repo
        .add(NewSighting::new("Deer", SightingStatus::Dead, 44.5, -93.25).with_timestamp(ts))
        .await
        .unwrap();
    assert_eq!(id, "doc0");

    let documents = store.documents.lock().unwrap().clone();
    assert_eq!(documents.len(), 1);
    assert_eq!(
        documents[0].1["timestamp"]["timestampValue"],
        "2025-06-01T12:00:00.000Z"
    );
    assert_eq!(documents[0].1["status"]["stringValue"], "dead");
}

#[tokio::test]
async fn test_list_round_trips_and_is_newest_first() {
    let (_store, repo) = setup().await;
    let base = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();

    for (animal, minutes) in [("fox", 0), ("elk", 30), ("owl", 10)] {
        repo.add(
            NewSighting::new(animal, SightingStatus::Live, 45.0, -93.0)
                .with_timestamp(base + Duration::minutes(minutes)),
        )
        .await
        .unwrap();
    }

    let records = repo.list().await.unwrap();
    let animals: Vec<&str> = records.iter().map(|r| r.animal.as_str()).collect();
    assert_eq!(animals, vec!["elk", "owl", "fox"]);
    assert_eq!(records[0].timestamp, base + Duration::minutes(30));
    assert_eq!(records[0].latitude, 45.0);
    assert_eq!(records[0].longitude, -93.0);
}

#[tokio::test]
async fn test_list_empty_collection() {
    let (_store, repo) = setup().await;
    assert!(repo.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_legacy_documents_are_read_with_defaults() {
    let (store, repo) = setup().await;
    store.seed(
        "legacy1",
        json!({
            "latitude": { "integerValue": "44" },
            "longitude": { "integerValue": "-93" },
            "timestamp": { "timestampValue": "2024-01-01T08:00:00Z" }
        }),
    );

    let records = repo.list().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "legacy1");
    assert_eq!(records[0].animal, "Unknown");
    assert_eq!(records[0].status, SightingStatus::Live);
    assert_eq!(records[0].latitude, 44.0);
}

#[tokio::test]
async fn test_remove_then_list_excludes_id() {
    let (_store, repo) = setup().await;

    let id = repo
        .add(NewSighting::new("Skunk", SightingStatus::Dead, 41.0, -87.0))
        .await
        .unwrap();
    repo.remove(&id).await.unwrap();

    assert!(repo.list().await.unwrap().iter().all(|r| r.id != id));
}

#[tokio::test]
async fn test_remove_missing_document_is_not_found() {
    let (store, repo) = setup().await;

    let err = repo.remove("nope").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(id) if id == "nope"));

    let queries = store.queries.lock().unwrap().clone();
    assert!(queries
        .last()
        .unwrap()
        .contains("currentDocument.exists=true"));
}

#[tokio::test]
async fn test_store_rejection_message_is_surfaced() {
    let (_store, repo) = setup().await;

    let err = repo
        .add(NewSighting::new("forbidden", SightingStatus::Live, 45.0, -93.0))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Persistence(_)));
    assert_eq!(err.to_string(), "Missing or insufficient permissions.");
}

#[tokio::test]
async fn test_missing_api_key_fails_fetch() {
    let store = FakeStore::default();
    let host = spawn_store(store).await;
    let backend = RemoteBackend::new(&RemoteConfig {
        api_key: None,
        ..config(host)
    })
    .unwrap();

    let err = backend.list().await.unwrap_err();
    assert!(matches!(err, Error::Fetch(msg) if msg == "API key not valid."));
}

#[tokio::test]
async fn test_unreachable_store_fails_immediately() {
    // Reserve a port, then close it so nothing is listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let host = listener.local_addr().unwrap().to_string();
    drop(listener);

    let repo = SightingRepository::new(Arc::new(RemoteBackend::new(&config(host)).unwrap()));
    assert!(matches!(repo.list().await, Err(Error::Fetch(_))));
    assert!(matches!(
        repo.add(NewSighting::new("Deer", SightingStatus::Live, 45.0, -93.0))
            .await,
        Err(Error::Persistence(_))
    ));
}

// =============================================================================
// Ids that need escaping
// =============================================================================

fn seeded_fields(animal: &str, hour: u32) -> Value {
    json!({
        "animal": { "stringValue": animal },
        "status": { "stringValue": "live" },
        "latitude": { "doubleValue": 45.0 },
        "longitude": { "doubleValue": -93.0 },
        "timestamp": { "timestampValue": format!("2025-06-01T{:02}:00:00Z", hour) }
    })
}

#[tokio::test]
async fn test_remove_with_fragment_in_id_does_not_touch_other_document() {
    let (store, repo) = setup().await;

    let id = repo
        .add(NewSighting::new("Deer", SightingStatus::Dead, 44.5, -93.25))
        .await
        .unwrap();
    assert_eq!(id, "doc0");

    let err = repo.remove("doc0#typo").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(missing) if missing == "doc0#typo"));

    let ids: Vec<String> = repo.list().await.unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["doc0"]);
    assert_eq!(store.documents.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_lifecycle_with_ids_needing_escapes() {
    let (store, repo) = setup().await;
    store.seed("x", seeded_fields("vole", 7));
    store.seed("a b", seeded_fields("fox", 8));
    store.seed("x#y", seeded_fields("owl", 9));
    store.seed("x?y", seeded_fields("elk", 10));

    let ids: Vec<String> = repo.list().await.unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["x?y", "x#y", "a b", "x"]);

    for id in ["a b", "x#y", "x?y"] {
        repo.remove(id).await.unwrap();
        assert!(repo.list().await.unwrap().iter().all(|r| r.id != id));
    }

    let ids: Vec<String> = repo.list().await.unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["x"]);
}
