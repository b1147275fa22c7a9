//! Sighting models
//!
//! `SightingRecord` is the shape every backend adapter decodes into and the
//! UI renders. `SightingDraft` is what the UI fills in while the user types or
//! speaks; `NewSighting` is a validated record ready for `add`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::classifier::classify;
use crate::time;
use crate::{Error, Result};

/// Animal name used when a stored document has none
pub const UNKNOWN_ANIMAL: &str = "Unknown";

/// Whether the animal was seen alive or found dead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SightingStatus {
    #[default]
    Live,
    Dead,
}

impl SightingStatus {
    /// Wire representation ("live" / "dead")
    pub fn as_str(&self) -> &'static str {
        match self {
            SightingStatus::Live => "live",
            SightingStatus::Dead => "dead",
        }
    }

    /// Badge label shown next to a sighting
    pub fn label(&self) -> &'static str {
        match self {
            SightingStatus::Live => "LIVE",
            SightingStatus::Dead => "ROADKILL",
        }
    }
}

impl fmt::Display for SightingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SightingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(SightingStatus::Live),
            "dead" => Ok(SightingStatus::Dead),
            other => Err(Error::Validation(format!(
                "status must be 'live' or 'dead', got '{}'",
                other
            ))),
        }
    }
}

/// A latitude/longitude pair in degrees.
///
/// `(0, 0)` is the sentinel for "no location fix". Map consumers filter on
/// the exact zero test, so a genuine sighting at null island is not mappable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const NO_FIX: Coordinates = Coordinates {
        latitude: 0.0,
        longitude: 0.0,
    };

    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True unless this is the `(0, 0)` sentinel
    pub fn is_fix(&self) -> bool {
        self.latitude != 0.0 || self.longitude != 0.0
    }
}

/// Resolved value from the geolocation provider
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Reverse-geocoded "City, Region, Country" when available
    pub address: Option<String>,
}

/// A persisted sighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SightingRecord {
    /// Backend-assigned identifier
    pub id: String,
    pub animal: String,
    pub status: SightingStatus,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub notes: Option<String>,
}

impl SightingRecord {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// False when the record carries the `(0, 0)` no-fix sentinel
    pub fn has_location_fix(&self) -> bool {
        self.coordinates().is_fix()
    }

    /// Address if known, otherwise the coordinates to four decimals
    pub fn location_label(&self) -> String {
        match &self.address {
            Some(address) => address.clone(),
            None => format!("{:.4}, {:.4}", self.latitude, self.longitude),
        }
    }
}

/// A validated sighting that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewSighting {
    pub animal: String,
    pub status: SightingStatus,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub notes: Option<String>,
}

impl NewSighting {
    /// Create a sighting stamped with the current time
    pub fn new(animal: impl Into<String>, status: SightingStatus, latitude: f64, longitude: f64) -> Self {
        Self {
            animal: animal.into(),
            status,
            latitude,
            longitude,
            address: None,
            timestamp: time::now(),
            notes: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = non_blank(Some(address.into()));
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = non_blank(Some(notes.into()));
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Check the fields a backend write requires
    pub fn validate(&self) -> Result<()> {
        if self.animal.trim().is_empty() {
            return Err(Error::Validation("animal is required".to_string()));
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(Error::Validation(format!(
                "latitude must be between -90 and 90, got {}",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(Error::Validation(format!(
                "longitude must be between -180 and 180, got {}",
                self.longitude
            )));
        }
        Ok(())
    }
}

/// Sighting being composed in the UI before it is saved
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SightingDraft {
    pub animal: String,
    pub status: SightingStatus,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl SightingDraft {
    /// Draft from typed text or a speech transcript, classified for status
    pub fn from_transcript(text: &str) -> Self {
        let classification = classify(text);
        Self {
            animal: classification.cleaned_animal,
            status: classification.status,
            ..Self::default()
        }
    }

    /// Attach the geolocation provider's fix
    pub fn at(mut self, fix: GeoFix) -> Self {
        self.latitude = Some(fix.latitude);
        self.longitude = Some(fix.longitude);
        self.address = fix.address;
        self
    }

    /// Explicitly record the sighting with the no-fix sentinel
    pub fn at_unknown_location(mut self) -> Self {
        self.latitude = Some(Coordinates::NO_FIX.latitude);
        self.longitude = Some(Coordinates::NO_FIX.longitude);
        self.address = None;
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Finish the draft, rejecting it if a required field is missing
    pub fn build(self) -> Result<NewSighting> {
        let animal = self.animal.trim().to_string();
        if animal.is_empty() {
            return Err(Error::Validation("animal is required".to_string()));
        }
        let latitude = self
            .latitude
            .ok_or_else(|| Error::Validation("latitude is required".to_string()))?;
        let longitude = self
            .longitude
            .ok_or_else(|| Error::Validation("longitude is required".to_string()))?;

        let sighting = NewSighting {
            animal,
            status: self.status,
            latitude,
            longitude,
            address: non_blank(self.address),
            timestamp: self.timestamp.unwrap_or_else(time::now),
            notes: non_blank(self.notes),
        };
        sighting.validate()?;
        Ok(sighting)
    }
}

/// Trimmed value, or `None` when blank
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
