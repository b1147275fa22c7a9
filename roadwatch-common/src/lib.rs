//! # Roadwatch Common Library
//!
//! Shared code for the Roadwatch sighting log:
//! - Sighting model and draft validation
//! - Keyword status classifier for typed or spoken input
//! - Backend adapters (local REST service, managed document store)
//! - The repository facade that picks one adapter per run
//! - Configuration and run-mode resolution
//! - Timestamp normalization and map helpers

pub mod backend;
pub mod classifier;
pub mod config;
pub mod error;
pub mod map;
pub mod models;
pub mod repository;
pub mod time;

pub use classifier::{classify, Classification};
pub use config::{BackendConfig, RunMode};
pub use error::{Error, Result};
pub use models::{Coordinates, GeoFix, NewSighting, SightingDraft, SightingRecord, SightingStatus};
pub use repository::SightingRepository;
