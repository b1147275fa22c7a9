//! roadwatch-server library - local sightings REST service
//!
//! Development backend for the Roadwatch client. Stores sightings in SQLite
//! and exposes the wire contract the local adapter speaks:
//! `GET/POST /sightings`, `DELETE /sightings/:id`, `GET /health`.

use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

/// Build application router
///
/// CORS is permissive so a browser client served from another port can reach
/// the service.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::sighting_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
