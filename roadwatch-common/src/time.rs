//! Timestamp utilities
//!
//! Backends persist the sighting time in different shapes. Everything is
//! parsed into a `DateTime<Utc>` at the adapter boundary.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde_json::Value;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Render a timestamp the way the local service expects it
/// (RFC 3339, millisecond precision, `Z` suffix)
pub fn to_wire(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC 3339 string with any offset into UTC
pub fn parse_rfc3339(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Interpret epoch milliseconds
pub fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

/// Parse any supported timestamp representation.
///
/// Accepted:
/// - RFC 3339 strings
/// - epoch milliseconds, as a number or a digit string
/// - extended JSON dates: `{ "$date": <any of the above> }`
/// - serialized store timestamps: `{ "seconds", "nanos" }` or
///   `{ "_seconds", "_nanoseconds" }`
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => parse_rfc3339(text).or_else(|| {
            text.trim()
                .parse::<i64>()
                .ok()
                .and_then(from_millis)
        }),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|f| f as i64))
            .and_then(from_millis),
        Value::Object(map) => {
            if let Some(inner) = map.get("$date") {
                return parse_timestamp(inner);
            }
            let seconds = map.get("seconds").or_else(|| map.get("_seconds"))?;
            let seconds = seconds
                .as_i64()
                .or_else(|| seconds.as_str().and_then(|s| s.parse().ok()))?;
            let nanos = map
                .get("nanos")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            Utc.timestamp_opt(seconds, u32::try_from(nanos).ok()?).single()
        }
        _ => None,
    }
}
