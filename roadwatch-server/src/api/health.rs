//! `GET /health`
//!
//! Liveness check for development clients deciding whether the local
//! sightings service is reachable. Always 200 with `status: "ok"` while the
//! process is serving; it does not touch the database.

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

const SERVICE_NAME: &str = "roadwatch-server";

#[derive(Debug, Serialize)]
pub struct Liveness {
    pub status: &'static str,
    /// Which service answered, so a client can tell it hit the sightings API
    pub module: &'static str,
    pub version: &'static str,
}

pub async fn liveness() -> Json<Liveness> {
    Json(Liveness {
        status: "ok",
        module: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(liveness))
}
