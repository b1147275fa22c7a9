//! Backend adapters
//!
//! Each adapter implements `SightingBackend` against one physical store and
//! owns a decode step that turns its wire shape into a fully populated
//! `SightingRecord`. Both decoders funnel through `RawSighting::normalize`,
//! so stored documents missing newer fields (e.g. `status`) read back the
//! same way no matter which backend they came from.

pub mod local;
pub mod remote;

pub use local::LocalBackend;
pub use remote::RemoteBackend;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{non_blank, NewSighting, SightingRecord, SightingStatus, UNKNOWN_ANIMAL};
use crate::{Error, Result};

/// Persistence contract shared by every backend.
///
/// `list` must return records newest first.
#[async_trait]
pub trait SightingBackend: Send + Sync {
    /// Short name used in logs ("local", "remote")
    fn name(&self) -> &'static str;

    /// Persist a sighting and return the backend-assigned id
    async fn insert(&self, sighting: &NewSighting) -> Result<String>;

    /// All sightings, ordered by timestamp descending
    async fn list(&self) -> Result<Vec<SightingRecord>>;

    /// Delete by id
    async fn delete(&self, id: &str) -> Result<()>;
}

/// A stored sighting with every field optional, as read off the wire
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSighting {
    pub id: Option<String>,
    pub animal: Option<String>,
    pub status: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl RawSighting {
    /// Apply the read defaults and produce a complete record.
    ///
    /// Missing animal reads as "Unknown", missing coordinates as 0, missing
    /// or unrecognized status as live. A record without an id or a readable
    /// timestamp cannot be repaired and fails the whole read.
    pub fn normalize(self) -> Result<SightingRecord> {
        let id = non_blank(self.id)
            .ok_or_else(|| Error::Fetch("Stored sighting has no id".to_string()))?;
        let timestamp = self.timestamp.ok_or_else(|| {
            Error::Fetch(format!("Stored sighting {} has no readable timestamp", id))
        })?;

        let status = match self.status.as_deref() {
            None => SightingStatus::Live,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(id = %id, status = %raw, "Unrecognized status, reading as live");
                SightingStatus::Live
            }),
        };

        Ok(SightingRecord {
            animal: non_blank(self.animal).unwrap_or_else(|| UNKNOWN_ANIMAL.to_string()),
            status,
            latitude: self.latitude.filter(|v| v.is_finite()).unwrap_or(0.0),
            longitude: self.longitude.filter(|v| v.is_finite()).unwrap_or(0.0),
            address: non_blank(self.address),
            timestamp,
            notes: non_blank(self.notes),
            id,
        })
    }
}

/// True when records are ordered newest first
pub fn is_newest_first(records: &[SightingRecord]) -> bool {
    records.windows(2).all(|pair| pair[0].timestamp >= pair[1].timestamp)
}
