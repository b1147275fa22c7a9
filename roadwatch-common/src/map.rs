//! Map helpers
//!
//! Records carrying the `(0, 0)` no-fix sentinel are never placed on a map.

use serde_json::{json, Value};

use crate::models::{Coordinates, SightingRecord};
use crate::time;

/// Geographic centre of the contiguous United States, used when nothing is mappable
pub const DEFAULT_CENTER: Coordinates = Coordinates {
    latitude: 39.8283,
    longitude: -98.5795,
};

/// Records that have a real location fix
pub fn mappable(records: &[SightingRecord]) -> Vec<&SightingRecord> {
    records.iter().filter(|r| r.has_location_fix()).collect()
}

/// Mean position of the mappable records, or `DEFAULT_CENTER`
pub fn center(records: &[SightingRecord]) -> Coordinates {
    let points = mappable(records);
    if points.is_empty() {
        return DEFAULT_CENTER;
    }
    let count = points.len() as f64;
    Coordinates {
        latitude: points.iter().map(|r| r.latitude).sum::<f64>() / count,
        longitude: points.iter().map(|r| r.longitude).sum::<f64>() / count,
    }
}

/// GeoJSON `FeatureCollection` of the mappable records
pub fn to_geojson(records: &[SightingRecord]) -> Value {
    let features: Vec<Value> = mappable(records)
        .into_iter()
        .map(|r| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [r.longitude, r.latitude],
                },
                "properties": {
                    "id": r.id,
                    "animal": r.animal,
                    "status": r.status.as_str(),
                    "label": r.status.label(),
                    "timestamp": time::to_wire(&r.timestamp),
                    "address": r.address,
                    "notes": r.notes,
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}
