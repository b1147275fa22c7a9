//! Sighting repository
//!
//! The one data-access entry point for the UI. A repository wraps exactly
//! one backend adapter, chosen when it is constructed; every `add`, `list`
//! and `remove` for the life of the repository goes to that adapter. There
//! is no cache, no retry and no fallback to the other backend: a failure is
//! returned to the caller as-is.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::backend::{is_newest_first, LocalBackend, RemoteBackend, SightingBackend};
use crate::config::{BackendConfig, RunMode};
use crate::models::{NewSighting, SightingRecord};
use crate::{Error, Result};

/// Facade over the active backend adapter
#[derive(Clone)]
pub struct SightingRepository {
    backend: Arc<dyn SightingBackend>,
}

impl SightingRepository {
    /// Wrap an already constructed adapter
    pub fn new(backend: Arc<dyn SightingBackend>) -> Self {
        Self { backend }
    }

    /// Build the adapter selected by the run mode
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let backend: Arc<dyn SightingBackend> = match config.mode {
            RunMode::Development => {
                let url = config.local_api_url();
                info!(mode = %config.mode, api = %url, "Using local sightings service");
                Arc::new(LocalBackend::new(&url)?)
            }
            RunMode::Production => {
                let backend = RemoteBackend::new(&config.remote)?;
                info!(
                    mode = %config.mode,
                    documents = %backend.documents_url(),
                    "Using remote document store"
                );
                Arc::new(backend)
            }
        };
        Ok(Self::new(backend))
    }

    /// Name of the active adapter
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Persist a new sighting and return its id.
    ///
    /// Validation runs first; an invalid sighting never reaches the backend.
    pub async fn add(&self, sighting: NewSighting) -> Result<String> {
        sighting.validate()?;
        let id = self.backend.insert(&sighting).await?;
        debug!(backend = self.backend.name(), id = %id, "Sighting saved");
        Ok(id)
    }

    /// All sightings, newest first
    pub async fn list(&self) -> Result<Vec<SightingRecord>> {
        let mut records = self.backend.list().await?;
        if !is_newest_first(&records) {
            warn!(
                backend = self.backend.name(),
                "Backend returned sightings out of order, sorting newest first"
            );
            records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        }
        Ok(records)
    }

    /// Delete a sighting by id
    pub async fn remove(&self, id: &str) -> Result<()> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::Validation("id is required".to_string()));
        }
        self.backend.delete(id).await?;
        debug!(backend = self.backend.name(), id = %id, "Sighting deleted");
        Ok(())
    }
}

impl std::fmt::Debug for SightingRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SightingRepository")
            .field("backend", &self.backend.name())
            .finish()
    }
}
